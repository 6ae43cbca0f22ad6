use crate::config::types::{CrawlInput, JOBS_HOST_SUFFIX, JOBS_PATH_PREFIX};
use crate::ConfigError;
use url::Url;

/// Validates the entire input document
pub fn validate(input: &CrawlInput) -> Result<(), ConfigError> {
    validate_search_spec(input)?;
    validate_limits(input)?;
    validate_delays(input)?;
    Ok(())
}

/// Validates the search specification: direct URLs when present, otherwise
/// the query/location pair
fn validate_search_spec(input: &CrawlInput) -> Result<(), ConfigError> {
    if !input.search_urls.is_empty() {
        for raw in &input.search_urls {
            validate_search_url(raw)?;
        }
        return Ok(());
    }

    if input.search_queries.is_empty()
        || input.search_queries.iter().all(|q| q.trim().is_empty())
    {
        return Err(ConfigError::Validation(
            "searchQueries must be provided and non-empty when searchUrls is absent".to_string(),
        ));
    }

    if input.location.trim().is_empty() {
        return Err(ConfigError::Validation(
            "location must be provided and non-empty".to_string(),
        ));
    }

    Ok(())
}

/// Direct search URLs must point at the target site's jobs surface
fn validate_search_url(raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid search URL '{raw}': {e}")))?;

    if url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Search URL '{raw}' must use HTTPS"
        )));
    }

    let host = url.host_str().unwrap_or_default();
    let on_target_host =
        host == JOBS_HOST_SUFFIX || host.ends_with(&format!(".{JOBS_HOST_SUFFIX}"));
    if !on_target_host {
        return Err(ConfigError::Validation(format!(
            "Search URL '{raw}' does not reference the target site"
        )));
    }

    if !url.path().starts_with(JOBS_PATH_PREFIX) {
        return Err(ConfigError::Validation(format!(
            "Search URL '{raw}' does not reference the jobs path"
        )));
    }

    Ok(())
}

fn validate_limits(input: &CrawlInput) -> Result<(), ConfigError> {
    if input.max_results < 1 {
        return Err(ConfigError::Validation(format!(
            "maxResults must be >= 1, got {}",
            input.max_results
        )));
    }

    if input.max_concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "maxConcurrency must be >= 1, got {}",
            input.max_concurrency
        )));
    }

    if input.max_page_depth < 1 {
        return Err(ConfigError::Validation(format!(
            "maxPageDepth must be >= 1, got {}",
            input.max_page_depth
        )));
    }

    Ok(())
}

fn validate_delays(input: &CrawlInput) -> Result<(), ConfigError> {
    if input.min_delay_ms > input.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "minDelayMs ({}) must not exceed maxDelayMs ({})",
            input.min_delay_ms, input.max_delay_ms
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_input() -> CrawlInput {
        CrawlInput {
            search_queries: vec!["Software Engineer".to_string()],
            location: "United States".to_string(),
            ..CrawlInput::default()
        }
    }

    #[test]
    fn test_valid_query_spec() {
        assert!(validate(&query_input()).is_ok());
    }

    #[test]
    fn test_empty_queries_rejected() {
        let mut input = query_input();
        input.search_queries.clear();
        assert!(validate(&input).is_err());

        let mut input = query_input();
        input.search_queries = vec!["  ".to_string()];
        assert!(validate(&input).is_err());
    }

    #[test]
    fn test_blank_location_rejected() {
        let mut input = query_input();
        input.location = " ".to_string();
        assert!(validate(&input).is_err());
    }

    #[test]
    fn test_direct_urls_skip_query_checks() {
        let input = CrawlInput {
            search_urls: vec![
                "https://www.linkedin.com/jobs/search/?keywords=Rust".to_string(),
            ],
            ..CrawlInput::default()
        };
        assert!(validate(&input).is_ok());
    }

    #[test]
    fn test_search_url_wrong_host_rejected() {
        assert!(validate_search_url("https://evil.example.com/jobs/search/").is_err());
        assert!(validate_search_url("https://linkedin.com.evil.example/jobs/").is_err());
    }

    #[test]
    fn test_search_url_wrong_path_rejected() {
        assert!(validate_search_url("https://www.linkedin.com/feed/").is_err());
    }

    #[test]
    fn test_search_url_requires_https() {
        assert!(validate_search_url("http://www.linkedin.com/jobs/search/").is_err());
    }

    #[test]
    fn test_search_url_valid() {
        assert!(validate_search_url("https://www.linkedin.com/jobs/search/?keywords=Go").is_ok());
        assert!(validate_search_url("https://linkedin.com/jobs/view/123").is_ok());
    }

    #[test]
    fn test_delay_bounds_ordering() {
        let mut input = query_input();
        input.min_delay_ms = 5000;
        input.max_delay_ms = 2000;
        assert!(validate(&input).is_err());
    }

    #[test]
    fn test_zero_limits_rejected() {
        let mut input = query_input();
        input.max_results = 0;
        assert!(validate(&input).is_err());

        let mut input = query_input();
        input.max_page_depth = 0;
        assert!(validate(&input).is_err());
    }
}
