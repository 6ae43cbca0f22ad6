//! Crawl input configuration
//!
//! Loading, defaulting, and validation of the JSON input document that
//! drives a run. Validation failures abort before any navigation.

pub mod parser;
pub mod types;
pub mod validation;

pub use parser::load_input;
pub use types::{CrawlInput, ProxySettings};
pub use validation::validate;
