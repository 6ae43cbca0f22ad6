//! Output record types
//!
//! Records are assembled once per detail page and written to the record sink
//! exactly once. Textual fields fall back to a sentinel rather than going
//! absent, so downstream consumers never see partial shapes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Sentinel used wherever extraction yields nothing.
pub const NOT_SPECIFIED: &str = "Not specified";

/// One member of a posting's hiring team
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HiringContact {
    pub name: String,
    pub title: String,
    pub profile_url: String,
}

/// A fully assembled job posting record
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub source_url: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub location_type: String,
    pub seniority: String,
    pub employment_type: String,
    pub description: String,
    pub salary: String,
    pub job_criteria: Vec<String>,
    pub posted_date: String,
    pub hiring_team: Vec<HiringContact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_search_url: Option<String>,
    pub scraped_at: DateTime<Utc>,
    pub custom_data: Value,
}

impl JobRecord {
    /// Replaces an empty extraction result with the sentinel.
    pub fn or_not_specified(value: String) -> String {
        if value.trim().is_empty() {
            NOT_SPECIFIED.to_string()
        } else {
            value
        }
    }
}

/// Snapshot persisted for a request whose retry budget ran out
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedRequestRecord {
    pub url: String,
    pub error_message: String,
    pub request_kind: String,
}
