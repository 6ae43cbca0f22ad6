//! Jobglean: a job-listing crawl orchestration engine
//!
//! This crate implements the control plane of a headless-browser crawler for
//! a job-listing site: a typed request frontier, search/detail routing with
//! pagination, anti-detection session handling, selector-fallback field
//! extraction, block classification, and a bounded retrying worker pool.
//! Browser automation and durable persistence are injected collaborators.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod records;
pub mod session;
pub mod storage;

use thiserror::Error;

/// Main error type for Jobglean operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser error: {0}")]
    Browser(#[from] browser::BrowserError),

    #[error("Navigation failed for {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("Navigation timed out for {url}")]
    NavigationTimeout { url: String },

    #[error("Handler timed out for {url}")]
    HandlerTimeout { url: String },

    #[error("Access blocked: redirected to sign-in from {url}")]
    Blocked { url: String },

    #[error("Site error page served for {url}: {phrase}")]
    SiteError { url: String, phrase: String },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read input file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse input JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in input: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Jobglean operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::CrawlInput;
pub use crawler::{CrawlRequest, Coordinator, RequestKind};
pub use output::StatsSnapshot;
pub use records::{FailedRequestRecord, JobRecord, NOT_SPECIFIED};
