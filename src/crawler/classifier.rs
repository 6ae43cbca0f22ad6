//! Block and error-page classification
//!
//! Blocking is detected at two layers: page state right after navigation
//! (sign-in redirects, error-page phrasing) and, in the controller's failure
//! sink, the message of whatever error surfaced. The second layer catches
//! blocks that only show up in a caught exception.

use crate::browser::{BrowserError, Page};

/// Phrases whose presence in the rendered body marks a served error page.
const SITE_ERROR_PHRASES: [&str; 2] = ["something went wrong", "temporarily unavailable"];

/// Terms in an error message that indicate an access block.
const BLOCK_MESSAGE_TERMS: [&str; 3] = ["sign-in", "blocked", "login"];

/// What the classifier concluded about a freshly rendered page
#[derive(Debug, Clone, PartialEq)]
pub enum PageCondition {
    Ok,
    /// Navigation resolved to an authentication surface.
    Blocked,
    /// Known error-page phrasing in the body.
    SiteError { phrase: String },
}

/// Inspects page state after navigation
pub async fn classify_page(page: &dyn Page) -> Result<PageCondition, BrowserError> {
    if page.final_url().as_str().contains("/login") {
        return Ok(PageCondition::Blocked);
    }

    let body = page.body_text().await?.to_lowercase();
    for phrase in SITE_ERROR_PHRASES {
        if body.contains(phrase) {
            return Ok(PageCondition::SiteError {
                phrase: phrase.to_string(),
            });
        }
    }

    Ok(PageCondition::Ok)
}

/// Message-level block sniffing for errors that surface in exceptions rather
/// than page state
pub fn is_block_message(message: &str) -> bool {
    let lowered = message.to_lowercase();
    BLOCK_MESSAGE_TERMS.iter().any(|term| lowered.contains(term))
}
