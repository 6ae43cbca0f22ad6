//! Input document loading

use crate::config::types::CrawlInput;
use crate::config::validation::validate;
use crate::ConfigResult;
use std::fs;
use std::path::Path;

/// Loads and validates a crawl input document from a JSON file
///
/// # Arguments
///
/// * `path` - Path to the JSON input document
///
/// # Returns
///
/// * `Ok(CrawlInput)` - Parsed and validated input
/// * `Err(ConfigError)` - Read, parse, or validation failure
pub fn load_input(path: &Path) -> ConfigResult<CrawlInput> {
    let raw = fs::read_to_string(path)?;
    let input: CrawlInput = serde_json::from_str(&raw)?;
    validate(&input)?;
    Ok(input)
}
