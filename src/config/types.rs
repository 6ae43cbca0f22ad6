use serde::Deserialize;
use serde_json::Value;

/// Host suffix every crawl target must resolve to.
pub const JOBS_HOST_SUFFIX: &str = "linkedin.com";

/// Path prefix required of direct search URLs.
pub const JOBS_PATH_PREFIX: &str = "/jobs";

/// Search endpoint queries are rendered against.
pub const JOBS_SEARCH_ENDPOINT: &str = "https://www.linkedin.com/jobs/search/";

fn default_max_results() -> usize {
    100
}

fn default_max_concurrency() -> usize {
    2
}

fn default_min_delay_ms() -> u64 {
    2000
}

fn default_max_delay_ms() -> u64 {
    5000
}

fn default_max_page_depth() -> u32 {
    25
}

/// The input document driving one crawl run
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlInput {
    /// Search terms expanded against `location`; ignored when `search_urls`
    /// is non-empty.
    #[serde(default)]
    pub search_queries: Vec<String>,

    /// Target location paired with every search query.
    #[serde(default)]
    pub location: String,

    /// Raw search URLs used in place of query expansion.
    #[serde(default)]
    pub search_urls: Vec<String>,

    /// Soft cap on scraped records, checked at pagination decisions only.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Requested worker count; the engine caps this hard at its own ceiling.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Passed through to the browser engine's proxy provider untouched.
    #[serde(default)]
    pub proxy: Option<ProxySettings>,

    /// Arbitrary data merged into every record.
    #[serde(default)]
    pub custom_data: Value,

    /// Optional session cookie payload: an array of exported cookies, or the
    /// same array serialized as a string.
    #[serde(default)]
    pub session_cookies: Option<Value>,

    /// Lower bound of the randomized inter-request delay.
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Upper bound of the randomized inter-request delay.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Enables diagnostic screenshot capture on empty search pages.
    #[serde(default)]
    pub debug_mode: bool,

    /// Ceiling on how many result pages a single search chain may follow.
    #[serde(default = "default_max_page_depth")]
    pub max_page_depth: u32,
}

impl Default for CrawlInput {
    fn default() -> Self {
        Self {
            search_queries: Vec::new(),
            location: String::new(),
            search_urls: Vec::new(),
            max_results: default_max_results(),
            max_concurrency: default_max_concurrency(),
            proxy: None,
            custom_data: Value::Null,
            session_cookies: None,
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            debug_mode: false,
            max_page_depth: default_max_page_depth(),
        }
    }
}

/// Proxy provider passthrough; interpreted by the browser engine, not here
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxySettings {
    #[serde(default)]
    pub use_proxy: bool,

    #[serde(default)]
    pub groups: Vec<String>,

    #[serde(default)]
    pub country_code: Option<String>,
}
