//! Integration tests for the crawl engine
//!
//! These tests drive the full coordinator over canned HTML snapshots served
//! by `FixtureBrowser`, with in-memory collaborators capturing everything
//! the engine persists.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use jobglean::browser::{FixtureBrowser, Page};
use jobglean::config::CrawlInput;
use jobglean::crawler::{
    Collaborators, Coordinator, CrawlRequest, EngineLimits, MemoryFrontier, RecordTransform,
};
use jobglean::records::{JobRecord, NOT_SPECIFIED};
use jobglean::session::SameSite;
use jobglean::storage::{MemoryRecordSink, MemorySideChannel, StorageError};

const SEARCH_1: &str = "https://www.linkedin.com/jobs/search/?keywords=Rust&start=0";
const SEARCH_2: &str = "https://www.linkedin.com/jobs/search/?keywords=Rust&start=25";
const SEARCH_3: &str = "https://www.linkedin.com/jobs/search/?keywords=Rust&start=50";
const JOB_1: &str = "https://www.linkedin.com/jobs/view/101";
const JOB_2: &str = "https://www.linkedin.com/jobs/view/102";
const JOB_3: &str = "https://www.linkedin.com/jobs/view/103";

fn url(raw: &str) -> Url {
    Url::parse(raw).expect("test url")
}

fn search_html(job_urls: &[&str], next_href: Option<&str>) -> String {
    let mut cards = String::new();
    for job_url in job_urls {
        cards.push_str(&format!(
            r#"<li class="base-card"><a class="base-card__full-link" href="{job_url}">Job</a></li>"#
        ));
    }
    let next = next_href
        .map(|href| format!(r#"<a aria-label="View next page" href="{href}">Next</a>"#))
        .unwrap_or_default();
    format!(
        r#"<html><head><title>Job Search</title></head><body>
        <ul class="jobs-search__results-list">{cards}</ul>
        {next}
        </body></html>"#
    )
}

fn detail_html(title: &str, company: &str) -> String {
    format!(
        r#"<html><head><title>{title}</title></head><body>
        <h1 data-test="top-card-title">{title}</h1>
        <a data-test="top-card-org-name-link" href="/company">{company}</a>
        <span data-test="top-card-location">Berlin, Germany</span>
        <div data-test="job-details-jobs-details__main-content">Build reliable systems.</div>
        <ul>
          <li data-test="job-details-job-criteria-item-subtitle">Mid-Senior level</li>
          <li data-test="job-details-job-criteria-item-subtitle">Full-time</li>
        </ul>
        <span aria-label="3 weeks ago">3 weeks ago</span>
        <div data-section-id="hiring_team">
          <div data-entity-index="0">
            <span data-test="entity-profile-title">Dana Reyes</span>
            <span data-test="entity-profile-subtitle">Technical Recruiter</span>
            <a data-test="profile-link" href="https://www.linkedin.com/in/dana">profile</a>
          </div>
        </div>
        </body></html>"#
    )
}

fn sign_in_wall_html() -> String {
    r#"<html><head><title>Sign In</title></head><body>
    <form data-id="sign-in-form"><input name="session_key"></form>
    </body></html>"#
        .to_string()
}

fn fast_input() -> CrawlInput {
    CrawlInput {
        search_urls: vec![SEARCH_1.to_string()],
        min_delay_ms: 0,
        max_delay_ms: 0,
        ..CrawlInput::default()
    }
}

fn fast_limits(input: &CrawlInput) -> EngineLimits {
    let mut limits = EngineLimits::from_input(input);
    limits.max_concurrency = 1;
    limits.max_request_retries = 2;
    limits.listing_wait = Duration::from_millis(10);
    limits.title_wait = Duration::from_millis(10);
    limits.settle_delay = Duration::ZERO;
    limits
}

struct Harness {
    browser: Arc<FixtureBrowser>,
    records: Arc<MemoryRecordSink>,
    side_channel: Arc<MemorySideChannel>,
    coordinator: Coordinator,
    seeds: Vec<CrawlRequest>,
}

fn harness(input: CrawlInput) -> Harness {
    let browser = Arc::new(FixtureBrowser::new());
    let records = Arc::new(MemoryRecordSink::new());
    let side_channel = Arc::new(MemorySideChannel::new());
    let limits = fast_limits(&input);
    let seeds = Coordinator::seed_requests(&input).expect("seedable input");

    let coordinator = Coordinator::new(
        input,
        Collaborators {
            browser: browser.clone(),
            frontier: Arc::new(MemoryFrontier::new()),
            records: records.clone(),
            side_channel: side_channel.clone(),
        },
    )
    .with_limits(limits);

    Harness {
        browser,
        records,
        side_channel,
        coordinator,
        seeds,
    }
}

#[tokio::test]
async fn full_crawl_paginates_and_scrapes_details() {
    let h = harness(fast_input());
    h.browser
        .add_page(url(SEARCH_1), search_html(&[JOB_1, JOB_2], Some(SEARCH_2)));
    h.browser
        .add_page(url(SEARCH_2), search_html(&[JOB_3], None));
    h.browser
        .add_page(url(JOB_1), detail_html("Rust Engineer", "Acme"));
    h.browser
        .add_page(url(JOB_2), detail_html("Platform Engineer", "Globex"));
    h.browser
        .add_page(url(JOB_3), detail_html("Backend Engineer", "Initech"));

    let snapshot = h.coordinator.run(h.seeds).await.expect("run succeeds");

    assert_eq!(snapshot.jobs_found, 3);
    assert_eq!(snapshot.jobs_scraped, 3);
    assert_eq!(snapshot.errors, 0);
    assert!(!snapshot.ip_blocked);

    let records = h.records.records();
    assert_eq!(records.len(), 3);
    let rust = records
        .iter()
        .find(|r| r.title == "Rust Engineer")
        .expect("record present");
    assert_eq!(rust.company, "Acme");
    assert_eq!(rust.location, "Berlin, Germany");
    assert_eq!(rust.job_criteria, vec!["Mid-Senior level", "Full-time"]);
    assert_eq!(rust.posted_date, "3 weeks ago");
    assert_eq!(rust.hiring_team.len(), 1);
    assert_eq!(rust.hiring_team[0].name, "Dana Reyes");
    // Provenance carried through pagination to every derived record.
    assert!(records
        .iter()
        .all(|r| r.source_search_url.as_deref() == Some(SEARCH_1)));

    assert!(h.side_channel.json_keys().iter().any(|k| k == "final-stats"));
}

#[tokio::test]
async fn duplicate_links_on_one_page_enqueue_once() {
    let h = harness(fast_input());
    h.browser
        .add_page(url(SEARCH_1), search_html(&[JOB_1, JOB_1, JOB_1], None));
    h.browser
        .add_page(url(JOB_1), detail_html("Rust Engineer", "Acme"));

    let snapshot = h.coordinator.run(h.seeds).await.expect("run succeeds");

    assert_eq!(snapshot.jobs_found, 3);
    assert_eq!(snapshot.jobs_scraped, 1);
    assert_eq!(h.records.len(), 1);
    let detail_navigations = h
        .browser
        .navigations()
        .iter()
        .filter(|u| u.contains("/jobs/view/"))
        .count();
    assert_eq!(detail_navigations, 1);
}

#[tokio::test]
async fn sign_in_wall_sets_block_flag_and_captures_diagnostics() {
    let mut input = fast_input();
    input.debug_mode = true;
    let h = harness(input);
    h.browser.add_page(url(SEARCH_1), sign_in_wall_html());

    let snapshot = h.coordinator.run(h.seeds).await.expect("run succeeds");

    assert!(snapshot.ip_blocked);
    assert_eq!(snapshot.jobs_found, 0);
    assert_eq!(snapshot.jobs_scraped, 0);
    assert!(h.records.is_empty());
    // The sign-in wall rendered, so the handler itself did not fail.
    assert_eq!(snapshot.errors, 0);
    // No detail requests were discovered.
    assert_eq!(h.browser.navigations().len(), 1);
    // Diagnostic screenshot captured in debug mode.
    assert!(h
        .side_channel
        .bytes_keys()
        .iter()
        .any(|k| k == "blocked-page-screenshot"));
}

#[tokio::test]
async fn missing_title_yields_sentinel_record() {
    let h = harness(fast_input());
    h.browser
        .add_page(url(SEARCH_1), search_html(&[JOB_1], None));
    h.browser.add_page(
        url(JOB_1),
        "<html><body><p>nothing recognizable here</p></body></html>".to_string(),
    );

    let snapshot = h.coordinator.run(h.seeds).await.expect("run succeeds");

    assert_eq!(snapshot.jobs_scraped, 1);
    let records = h.records.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, NOT_SPECIFIED);
    assert_eq!(records[0].company, NOT_SPECIFIED);
    assert_eq!(records[0].salary, NOT_SPECIFIED);
    assert!(records[0].job_criteria.is_empty());
    assert!(records[0].hiring_team.is_empty());
}

struct FailingTransform;

#[async_trait]
impl RecordTransform for FailingTransform {
    async fn apply(
        &self,
        _record: &JobRecord,
        _page: &dyn Page,
        _request: &CrawlRequest,
    ) -> anyhow::Result<Option<JobRecord>> {
        anyhow::bail!("transform exploded")
    }
}

struct RetitlingTransform;

#[async_trait]
impl RecordTransform for RetitlingTransform {
    async fn apply(
        &self,
        record: &JobRecord,
        _page: &dyn Page,
        _request: &CrawlRequest,
    ) -> anyhow::Result<Option<JobRecord>> {
        let mut replacement = record.clone();
        replacement.title = format!("{} (reviewed)", record.title);
        Ok(Some(replacement))
    }
}

#[tokio::test]
async fn failing_transform_keeps_base_record() {
    let mut h = harness(fast_input());
    h.coordinator = h.coordinator.with_transform(Arc::new(FailingTransform));
    h.browser
        .add_page(url(SEARCH_1), search_html(&[JOB_1], None));
    h.browser
        .add_page(url(JOB_1), detail_html("Rust Engineer", "Acme"));

    let snapshot = h.coordinator.run(h.seeds).await.expect("run succeeds");

    assert_eq!(snapshot.jobs_scraped, 1);
    assert_eq!(snapshot.errors, 0);
    let records = h.records.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "Rust Engineer");
}

#[tokio::test]
async fn transform_replacement_is_persisted() {
    let mut h = harness(fast_input());
    h.coordinator = h.coordinator.with_transform(Arc::new(RetitlingTransform));
    h.browser
        .add_page(url(SEARCH_1), search_html(&[JOB_1], None));
    h.browser
        .add_page(url(JOB_1), detail_html("Rust Engineer", "Acme"));

    h.coordinator.run(h.seeds).await.expect("run succeeds");

    let records = h.records.records();
    assert_eq!(records[0].title, "Rust Engineer (reviewed)");
}

#[tokio::test]
async fn retry_exhaustion_persists_one_failure_record() {
    // No fixture registered for the seed URL, so every attempt fails.
    let h = harness(fast_input());

    let snapshot = h.coordinator.run(h.seeds).await.expect("run succeeds");

    // One initial attempt plus two retries, each counted once.
    assert_eq!(snapshot.errors, 3);
    assert_eq!(h.browser.navigations().len(), 3);
    assert_eq!(snapshot.jobs_scraped, 0);

    let failure_keys: Vec<String> = h
        .side_channel
        .json_keys()
        .into_iter()
        .filter(|k| k.starts_with("failed-url-"))
        .collect();
    assert_eq!(failure_keys.len(), 1);

    let entries = h.side_channel.json_entries();
    let (_, failure) = entries
        .iter()
        .find(|(key, _)| key.starts_with("failed-url-"))
        .expect("failure record persisted");
    assert_eq!(failure["url"], Value::String(SEARCH_1.to_string()));
    assert_eq!(failure["requestKind"], Value::String("SEARCH".to_string()));
    assert!(failure["errorMessage"]
        .as_str()
        .expect("message present")
        .contains("no fixture"));
}

#[tokio::test]
async fn pagination_stops_once_max_results_reached() {
    let mut input = fast_input();
    input.max_results = 1;
    let h = harness(input);
    h.browser
        .add_page(url(SEARCH_1), search_html(&[JOB_1], Some(SEARCH_2)));
    h.browser
        .add_page(url(SEARCH_2), search_html(&[JOB_2], Some(SEARCH_3)));
    h.browser
        .add_page(url(JOB_1), detail_html("Rust Engineer", "Acme"));
    h.browser
        .add_page(url(JOB_2), detail_html("Platform Engineer", "Globex"));

    let snapshot = h.coordinator.run(h.seeds).await.expect("run succeeds");

    // Page two was already queued before the cap was hit; its listings are
    // still processed, but no third page is requested.
    assert!(snapshot.jobs_scraped >= 1);
    let navigations = h.browser.navigations();
    assert!(navigations.contains(&SEARCH_2.to_string()));
    assert!(!navigations.contains(&SEARCH_3.to_string()));
}

#[tokio::test]
async fn pagination_honors_depth_ceiling() {
    let mut input = fast_input();
    input.max_page_depth = 2;
    let h = harness(input);
    h.browser
        .add_page(url(SEARCH_1), search_html(&[JOB_1], Some(SEARCH_2)));
    h.browser
        .add_page(url(SEARCH_2), search_html(&[JOB_2], Some(SEARCH_3)));
    h.browser
        .add_page(url(JOB_1), detail_html("Rust Engineer", "Acme"));
    h.browser
        .add_page(url(JOB_2), detail_html("Platform Engineer", "Globex"));

    let snapshot = h.coordinator.run(h.seeds).await.expect("run succeeds");

    assert_eq!(snapshot.jobs_scraped, 2);
    let navigations = h.browser.navigations();
    assert!(navigations.contains(&SEARCH_2.to_string()));
    assert!(!navigations.contains(&SEARCH_3.to_string()));
}

#[tokio::test]
async fn session_cookies_normalized_and_injected_once() {
    let mut input = fast_input();
    input.session_cookies = Some(Value::String(
        r#"[{"name":"li_at","value":"token","domain":".linkedin.com","sameSite":"no_restriction","expirationDate":1999999999.75}]"#
            .to_string(),
    ));
    let h = harness(input);
    h.browser
        .add_page(url(SEARCH_1), search_html(&[], None));

    h.coordinator.run(h.seeds).await.expect("run succeeds");

    let cookies = h.browser.injected_cookies();
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].name, "li_at");
    assert_eq!(cookies[0].same_site, SameSite::None);
    assert_eq!(cookies[0].expires, Some(1999999999));
    assert_eq!(cookies[0].path, "/");
}

#[tokio::test]
async fn non_array_cookie_payload_is_skipped() {
    let mut input = fast_input();
    input.session_cookies = Some(json!({"name": "li_at", "value": "token"}));
    let h = harness(input);
    h.browser
        .add_page(url(SEARCH_1), search_html(&[], None));

    let snapshot = h.coordinator.run(h.seeds).await.expect("run succeeds");

    assert!(h.browser.injected_cookies().is_empty());
    assert_eq!(snapshot.errors, 0);
}

#[tokio::test]
async fn cookie_injection_failure_is_not_fatal() {
    let mut input = fast_input();
    input.session_cookies = Some(json!([{"name": "li_at", "value": "token"}]));
    let h = harness(input);
    h.browser.reject_cookie_injection();
    h.browser
        .add_page(url(SEARCH_1), search_html(&[JOB_1], None));
    h.browser
        .add_page(url(JOB_1), detail_html("Rust Engineer", "Acme"));

    let snapshot = h.coordinator.run(h.seeds).await.expect("run succeeds");

    assert!(h.browser.injected_cookies().is_empty());
    assert_eq!(snapshot.jobs_scraped, 1);
}

#[tokio::test]
async fn login_redirect_blocks_and_exhausts_retries() {
    let h = harness(fast_input());
    h.browser.add_redirected_page(
        url(SEARCH_1),
        url("https://www.linkedin.com/login?session_redirect=%2Fjobs"),
        "<html><body>Please sign in to continue</body></html>".to_string(),
    );

    let snapshot = h.coordinator.run(h.seeds).await.expect("run succeeds");

    assert!(snapshot.ip_blocked);
    // One increment per failed attempt, not one per detection layer.
    assert_eq!(snapshot.errors, 3);
    assert!(h.records.is_empty());
    let failure_keys: Vec<String> = h
        .side_channel
        .json_keys()
        .into_iter()
        .filter(|k| k.starts_with("failed-url-"))
        .collect();
    assert_eq!(failure_keys.len(), 1);
}

struct BrokenFrontier;

#[async_trait]
impl jobglean::crawler::Frontier for BrokenFrontier {
    async fn enqueue(&self, _request: CrawlRequest) -> Result<bool, StorageError> {
        Err(StorageError::Write("queue offline".to_string()))
    }

    async fn requeue(&self, _request: CrawlRequest) -> Result<(), StorageError> {
        Err(StorageError::Write("queue offline".to_string()))
    }

    async fn dequeue(&self) -> Result<Option<CrawlRequest>, StorageError> {
        Err(StorageError::Write("queue offline".to_string()))
    }

    async fn len(&self) -> usize {
        0
    }
}

#[tokio::test]
async fn fatal_init_failure_persists_partial_snapshot() {
    let input = fast_input();
    let side_channel = Arc::new(MemorySideChannel::new());
    let seeds = Coordinator::seed_requests(&input).expect("seedable input");
    let limits = fast_limits(&input);

    let coordinator = Coordinator::new(
        input,
        Collaborators {
            browser: Arc::new(FixtureBrowser::new()),
            frontier: Arc::new(BrokenFrontier),
            records: Arc::new(MemoryRecordSink::new()),
            side_channel: side_channel.clone(),
        },
    )
    .with_limits(limits);

    let result = coordinator.run(seeds).await;
    assert!(result.is_err());

    let entries = side_channel.json_entries();
    let (_, snapshot) = entries
        .iter()
        .find(|(key, _)| key == "fatal-error")
        .expect("fatal snapshot persisted");
    assert_eq!(snapshot["jobsScraped"], json!(0));
    assert!(snapshot["error"]
        .as_str()
        .expect("error message attached")
        .contains("queue offline"));
}
