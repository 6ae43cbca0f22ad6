//! Browser automation capability boundary
//!
//! The engine never talks to a browser directly; it drives these traits.
//! A production embedding supplies an implementation backed by a real
//! headless engine, while [`FixtureBrowser`] serves saved HTML snapshots
//! for tests and offline runs.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::session::{Disguise, SessionCookie};

pub mod static_page;

pub use static_page::{FixtureBrowser, StaticPage};

/// Errors surfaced by a browser engine implementation
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("DOM query failed for selector '{selector}': {message}")]
    Query { selector: String, message: String },

    #[error("Capability not supported by this engine: {0}")]
    Unsupported(String),
}

/// A headless browser context the crawl engine navigates with
#[async_trait]
pub trait Browser: Send + Sync {
    /// Installs session cookies into the shared browser context.
    ///
    /// Called at most once per run, before any navigation.
    async fn inject_cookies(&self, cookies: &[SessionCookie]) -> Result<(), BrowserError>;

    /// Navigates to `url` wearing `disguise` and returns the rendered page.
    async fn open(&self, url: &Url, disguise: &Disguise) -> Result<Box<dyn Page>, BrowserError>;
}

/// A rendered page the handlers query
#[async_trait]
pub trait Page: Send + Sync {
    /// The resolved URL after any redirects.
    fn final_url(&self) -> &Url;

    /// Waits up to `timeout` for `selector` to appear.
    ///
    /// Returns false on timeout; a missing element is not an error.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool, BrowserError>;

    /// Whether at least one element matches `selector`.
    async fn exists(&self, selector: &str) -> Result<bool, BrowserError>;

    /// Number of elements matching `selector`.
    async fn count(&self, selector: &str) -> Result<usize, BrowserError>;

    /// Trimmed text of the first element matching `selector`.
    async fn text_of(&self, selector: &str) -> Result<Option<String>, BrowserError>;

    /// Trimmed text of every element matching `selector`.
    async fn texts_of(&self, selector: &str) -> Result<Vec<String>, BrowserError>;

    /// Attribute value of the first element matching `selector`.
    async fn attr_of(&self, selector: &str, attr: &str) -> Result<Option<String>, BrowserError>;

    /// Attribute values of every element matching `selector`.
    async fn attrs_of(&self, selector: &str, attr: &str) -> Result<Vec<String>, BrowserError>;

    /// Scoped handles for every element matching `selector`, for per-element
    /// sub-queries.
    async fn nodes(&self, selector: &str) -> Result<Vec<Box<dyn DomNode>>, BrowserError>;

    /// The document title.
    async fn title(&self) -> Result<String, BrowserError>;

    /// The full rendered body text.
    async fn body_text(&self) -> Result<String, BrowserError>;

    /// Scrolls one viewport height to trigger lazily loaded content.
    async fn scroll_by_viewport(&self) -> Result<(), BrowserError>;

    /// Captures a screenshot of the current viewport.
    async fn screenshot(&self) -> Result<Vec<u8>, BrowserError>;
}

/// A single DOM element supporting scoped sub-queries
#[async_trait]
pub trait DomNode: Send + Sync {
    /// Trimmed text content of this element.
    async fn text(&self) -> Result<String, BrowserError>;

    /// Trimmed text of the first descendant matching `selector`.
    async fn text_of(&self, selector: &str) -> Result<Option<String>, BrowserError>;

    /// Attribute value of the first descendant matching `selector`.
    async fn attr_of(&self, selector: &str, attr: &str) -> Result<Option<String>, BrowserError>;
}
