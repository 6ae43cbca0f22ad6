//! Selector-fallback field extraction
//!
//! Extraction is best-effort by contract: every query degrades to an empty
//! result rather than an error, so a layout drift on one field never costs
//! the rest of the record.

use crate::browser::{DomNode, Page};
use crate::extract::schema::ExtractionSchema;
use crate::records::HiringContact;

/// Placeholder when a hiring-team card lacks a name or role element.
const UNKNOWN: &str = "Unknown";

/// Fixed role assigned by the fallback hiring-team tier.
const FALLBACK_TEAM_TITLE: &str = "Recruiter";

/// The flat field set pulled from one detail page
#[derive(Debug, Clone, Default)]
pub struct ExtractedFields {
    pub title: String,
    pub company: String,
    pub location: String,
    pub location_type: String,
    pub seniority: String,
    pub employment_type: String,
    pub description: String,
    pub salary: String,
    pub criteria: Vec<String>,
    pub posted_date: String,
}

/// Applies selector-fallback chains against one rendered page
pub struct FieldExtractor<'a> {
    page: &'a dyn Page,
}

impl<'a> FieldExtractor<'a> {
    pub fn new(page: &'a dyn Page) -> Self {
        Self { page }
    }

    /// Returns the first candidate's non-empty trimmed text, or an empty
    /// string when every candidate misses. Browser failures count as misses.
    pub async fn get_text(&self, candidates: &[String]) -> String {
        for selector in candidates {
            match self.page.text_of(selector).await {
                Ok(Some(text)) => {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        return trimmed.to_string();
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::debug!("Selector '{selector}' query failed: {e}"),
            }
        }
        String::new()
    }

    /// Returns the first candidate with a non-empty match set, mapped to
    /// trimmed non-empty texts; an empty list when every candidate misses.
    pub async fn get_all_text(&self, candidates: &[String]) -> Vec<String> {
        for selector in candidates {
            match self.page.texts_of(selector).await {
                Ok(texts) if !texts.is_empty() => {
                    return texts
                        .into_iter()
                        .map(|text| text.trim().to_string())
                        .filter(|text| !text.is_empty())
                        .collect();
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("Selector '{selector}' query failed: {e}"),
            }
        }
        Vec::new()
    }

    /// Pulls the full flat field set defined by the schema.
    pub async fn extract_fields(&self, schema: &ExtractionSchema) -> ExtractedFields {
        ExtractedFields {
            title: self.get_text(&schema.title).await,
            company: self.get_text(&schema.company).await,
            location: self.get_text(&schema.location).await,
            location_type: self.get_text(&schema.location_type).await,
            seniority: self.get_text(&schema.seniority).await,
            employment_type: self.get_text(&schema.employment_type).await,
            description: self.get_text(&schema.description).await,
            salary: self.get_text(&schema.salary).await,
            criteria: self.get_all_text(&schema.criteria).await,
            posted_date: self.get_text(&schema.posted_date).await,
        }
    }

    /// Two-tier hiring-team extraction.
    ///
    /// The structured tier walks dedicated profile cards; when it yields
    /// nothing, the fallback tier scans generic list items for any anchor
    /// and synthesizes entries with a fixed role. The result is always a
    /// list, possibly empty, never absent.
    pub async fn extract_hiring_team(&self, schema: &ExtractionSchema) -> Vec<HiringContact> {
        for card_selector in &schema.hiring_team.cards {
            let cards = match self.page.nodes(card_selector).await {
                Ok(cards) => cards,
                Err(e) => {
                    tracing::debug!("Hiring-team selector '{card_selector}' failed: {e}");
                    continue;
                }
            };
            if cards.is_empty() {
                continue;
            }

            let mut team = Vec::with_capacity(cards.len());
            for card in &cards {
                let name = first_node_text(card.as_ref(), &schema.hiring_team.name)
                    .await
                    .unwrap_or_else(|| UNKNOWN.to_string());
                let title = first_node_text(card.as_ref(), &schema.hiring_team.title)
                    .await
                    .unwrap_or_else(|| UNKNOWN.to_string());
                let profile_url =
                    first_node_attr(card.as_ref(), &schema.hiring_team.profile_link, "href")
                        .await
                        .unwrap_or_default();
                team.push(HiringContact {
                    name,
                    title,
                    profile_url,
                });
            }
            if !team.is_empty() {
                return team;
            }
        }

        for item_selector in &schema.hiring_team_fallback {
            let items = match self.page.nodes(item_selector).await {
                Ok(items) => items,
                Err(e) => {
                    tracing::debug!("Hiring-team fallback '{item_selector}' failed: {e}");
                    continue;
                }
            };

            let mut team = Vec::new();
            for item in &items {
                let Ok(Some(name)) = item.text_of("a").await else {
                    continue;
                };
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                let profile_url = item
                    .attr_of("a", "href")
                    .await
                    .ok()
                    .flatten()
                    .unwrap_or_default();
                team.push(HiringContact {
                    name: name.to_string(),
                    title: FALLBACK_TEAM_TITLE.to_string(),
                    profile_url,
                });
            }
            if !team.is_empty() {
                return team;
            }
        }

        Vec::new()
    }
}

async fn first_node_text(node: &dyn DomNode, candidates: &[String]) -> Option<String> {
    for selector in candidates {
        if let Ok(Some(text)) = node.text_of(selector).await {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

async fn first_node_attr(node: &dyn DomNode, candidates: &[String], attr: &str) -> Option<String> {
    for selector in candidates {
        if let Ok(Some(value)) = node.attr_of(selector, attr).await {
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}
