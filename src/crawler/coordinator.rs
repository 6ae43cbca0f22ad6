//! Crawl controller - main orchestration loop
//!
//! The coordinator owns the worker pool, the per-request retry budget, and
//! timeout enforcement. Each worker task takes one request end-to-end:
//! randomized delay, disguised navigation, post-navigation classification,
//! handler dispatch, and persistence. Per-request failures are contained
//! here; only initialization and orchestration errors escape the run.

use chrono::Utc;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

use crate::browser::Browser;
use crate::config::types::{CrawlInput, JOBS_SEARCH_ENDPOINT};
use crate::crawler::classifier::{classify_page, is_block_message, PageCondition};
use crate::crawler::frontier::{CrawlRequest, Frontier, Provenance, RequestKind};
use crate::crawler::handlers::{
    handle_job_detail, handle_search, HandlerContext, RecordTransform,
};
use crate::extract::ExtractionSchema;
use crate::output::{RunStats, StatsSnapshot};
use crate::records::FailedRequestRecord;
use crate::session::{parse_cookie_payload, DelayPolicy, Disguise};
use crate::storage::{RecordSink, SideChannelStore};
use crate::{ConfigError, ConfigResult, CrawlError, Result};

/// The target site penalizes parallel sessions; never exceed this.
const CONCURRENCY_CEILING: usize = 2;

const DEFAULT_MAX_RETRIES: u32 = 5;
const HANDLER_TIMEOUT: Duration = Duration::from_secs(90);
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(60);
const LISTING_WAIT: Duration = Duration::from_secs(15);
const TITLE_WAIT: Duration = Duration::from_secs(12);
const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Operational limits in force for one run
#[derive(Debug, Clone)]
pub struct EngineLimits {
    /// Worker pool size, hard-capped regardless of caller input.
    pub max_concurrency: usize,
    /// Retries granted to each request beyond its first attempt.
    pub max_request_retries: u32,
    /// Budget for one handler invocation.
    pub handler_timeout: Duration,
    /// Budget for one navigation.
    pub navigation_timeout: Duration,
    /// Soft cap on scraped records, checked at pagination decisions only.
    pub max_results: usize,
    /// Ceiling on result pages followed within one search chain.
    pub max_page_depth: u32,
    /// Bounded wait for the listing container on search pages.
    pub listing_wait: Duration,
    /// Bounded wait for the title element on detail pages.
    pub title_wait: Duration,
    /// Settle time after the scroll cycle on detail pages.
    pub settle_delay: Duration,
}

impl EngineLimits {
    pub fn from_input(input: &CrawlInput) -> Self {
        Self {
            max_concurrency: input.max_concurrency.clamp(1, CONCURRENCY_CEILING),
            max_request_retries: DEFAULT_MAX_RETRIES,
            handler_timeout: HANDLER_TIMEOUT,
            navigation_timeout: NAVIGATION_TIMEOUT,
            max_results: input.max_results,
            max_page_depth: input.max_page_depth,
            listing_wait: LISTING_WAIT,
            title_wait: TITLE_WAIT,
            settle_delay: SETTLE_DELAY,
        }
    }
}

/// Injected automation and persistence collaborators
pub struct Collaborators {
    pub browser: Arc<dyn Browser>,
    pub frontier: Arc<dyn Frontier>,
    pub records: Arc<dyn RecordSink>,
    pub side_channel: Arc<dyn SideChannelStore>,
}

/// Main crawl controller
pub struct Coordinator {
    input: CrawlInput,
    limits: EngineLimits,
    delay: DelayPolicy,
    browser: Arc<dyn Browser>,
    frontier: Arc<dyn Frontier>,
    records: Arc<dyn RecordSink>,
    side_channel: Arc<dyn SideChannelStore>,
    stats: Arc<RunStats>,
    schema: Arc<ExtractionSchema>,
    transform: Option<Arc<dyn RecordTransform>>,
    failure_seq: Arc<AtomicU64>,
}

impl Coordinator {
    /// Creates a controller over validated input and injected collaborators.
    pub fn new(input: CrawlInput, collaborators: Collaborators) -> Self {
        let limits = EngineLimits::from_input(&input);
        let delay = DelayPolicy::new(input.min_delay_ms, input.max_delay_ms);

        Self {
            input,
            limits,
            delay,
            browser: collaborators.browser,
            frontier: collaborators.frontier,
            records: collaborators.records,
            side_channel: collaborators.side_channel,
            stats: Arc::new(RunStats::new()),
            schema: Arc::new(ExtractionSchema::builtin()),
            transform: None,
            failure_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Registers the post-processing transform applied to every record.
    pub fn with_transform(mut self, transform: Arc<dyn RecordTransform>) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Replaces the built-in extraction schema.
    pub fn with_schema(mut self, schema: ExtractionSchema) -> Self {
        self.schema = Arc::new(schema);
        self
    }

    /// Overrides operational limits; the concurrency ceiling still applies.
    pub fn with_limits(mut self, limits: EngineLimits) -> Self {
        self.limits = EngineLimits {
            max_concurrency: limits.max_concurrency.clamp(1, CONCURRENCY_CEILING),
            ..limits
        };
        self
    }

    /// Builds the seed SEARCH requests from the input document: either the
    /// caller's raw search URLs, or query/location pairs rendered against
    /// the site's search endpoint.
    pub fn seed_requests(input: &CrawlInput) -> ConfigResult<Vec<CrawlRequest>> {
        if !input.search_urls.is_empty() {
            return input
                .search_urls
                .iter()
                .map(|raw| {
                    let url = Url::parse(raw).map_err(|e| {
                        ConfigError::InvalidUrl(format!("Invalid search URL '{raw}': {e}"))
                    })?;
                    Ok(CrawlRequest::search(
                        url,
                        Provenance {
                            source_search_url: Some(raw.clone()),
                            ..Provenance::default()
                        },
                    ))
                })
                .collect();
        }

        let mut seeds = Vec::with_capacity(input.search_queries.len());
        for query in &input.search_queries {
            let mut url = Url::parse(JOBS_SEARCH_ENDPOINT)
                .map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
            url.query_pairs_mut()
                .append_pair("keywords", query)
                .append_pair("location", &input.location)
                .append_pair("start", "0");
            seeds.push(CrawlRequest::search(
                url,
                Provenance {
                    search_query: Some(query.clone()),
                    location: Some(input.location.clone()),
                    source_search_url: None,
                },
            ));
        }
        Ok(seeds)
    }

    /// Runs the crawl to completion and returns the final stats snapshot.
    ///
    /// On a fatal error a best-effort partial snapshot is persisted before
    /// the error surfaces to the caller.
    pub async fn run(&self, seeds: Vec<CrawlRequest>) -> Result<StatsSnapshot> {
        match self.run_inner(seeds).await {
            Ok(snapshot) => Ok(snapshot),
            Err(error) => {
                let snapshot = self.stats.snapshot(Utc::now());
                if let Ok(mut value) = serde_json::to_value(&snapshot) {
                    if let Some(map) = value.as_object_mut() {
                        map.insert("error".to_string(), Value::String(error.to_string()));
                    }
                    if let Err(e) = self.side_channel.put_json("fatal-error", &value).await {
                        tracing::error!("Failed to persist fatal-state snapshot: {e}");
                    }
                }
                Err(error)
            }
        }
    }

    async fn run_inner(&self, seeds: Vec<CrawlRequest>) -> Result<StatsSnapshot> {
        tracing::info!(
            "Starting crawl: {} seeds, concurrency {}, retry budget {}",
            seeds.len(),
            self.limits.max_concurrency,
            self.limits.max_request_retries
        );

        self.install_session_cookies().await;

        for seed in seeds {
            self.frontier.enqueue(seed).await?;
        }

        let ctx = Arc::new(HandlerContext {
            frontier: Arc::clone(&self.frontier),
            records: Arc::clone(&self.records),
            side_channel: Arc::clone(&self.side_channel),
            stats: Arc::clone(&self.stats),
            schema: Arc::clone(&self.schema),
            limits: self.limits.clone(),
            custom_data: self.input.custom_data.clone(),
            transform: self.transform.clone(),
            debug_mode: self.input.debug_mode,
        });

        let semaphore = Arc::new(Semaphore::new(self.limits.max_concurrency));
        let mut workers: JoinSet<()> = JoinSet::new();

        loop {
            while let Some(joined) = workers.try_join_next() {
                if let Err(e) = joined {
                    tracing::error!("Worker task failed: {e}");
                }
            }

            match self.frontier.dequeue().await? {
                Some(request) => {
                    let Ok(permit) = semaphore.clone().acquire_owned().await else {
                        break;
                    };
                    let worker = Worker {
                        ctx: Arc::clone(&ctx),
                        browser: Arc::clone(&self.browser),
                        delay: self.delay,
                        failure_seq: Arc::clone(&self.failure_seq),
                    };
                    workers.spawn(async move {
                        worker.process(request).await;
                        drop(permit);
                    });
                }
                None => match workers.join_next().await {
                    // A finished worker may have enqueued more work; re-check.
                    Some(Ok(())) => {}
                    Some(Err(e)) => tracing::error!("Worker task failed: {e}"),
                    None => break,
                },
            }
        }

        let snapshot = self.stats.snapshot(Utc::now());
        let value = serde_json::to_value(&snapshot)?;
        self.side_channel.put_json("final-stats", &value).await?;

        tracing::info!(
            "Crawl complete: {} found, {} scraped, {} errors, blocked={}",
            snapshot.jobs_found,
            snapshot.jobs_scraped,
            snapshot.errors,
            snapshot.ip_blocked
        );
        Ok(snapshot)
    }

    /// Normalizes and installs the configured session cookies, once per run.
    /// Every failure path logs and degrades to "no cookies".
    async fn install_session_cookies(&self) {
        let Some(payload) = &self.input.session_cookies else {
            return;
        };
        let Some(cookies) = parse_cookie_payload(payload) else {
            return;
        };
        if cookies.is_empty() {
            return;
        }
        match self.browser.inject_cookies(&cookies).await {
            Ok(()) => tracing::info!("Session cookies installed ({} cookies)", cookies.len()),
            Err(e) => {
                tracing::warn!("Session cookie injection failed, continuing without: {e}")
            }
        }
    }
}

/// One pooled task processing requests end-to-end
#[derive(Clone)]
struct Worker {
    ctx: Arc<HandlerContext>,
    browser: Arc<dyn Browser>,
    delay: DelayPolicy,
    failure_seq: Arc<AtomicU64>,
}

impl Worker {
    async fn process(&self, request: CrawlRequest) {
        if let Err(error) = self.attempt(&request).await {
            self.handle_failure(request, error).await;
        }
    }

    /// One full delay → navigate → classify → dispatch attempt.
    async fn attempt(&self, request: &CrawlRequest) -> Result<()> {
        self.delay.pause().await;
        let disguise = Disguise::draw();

        let page = match tokio::time::timeout(
            self.ctx.limits.navigation_timeout,
            self.browser.open(&request.url, &disguise),
        )
        .await
        {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => {
                return Err(CrawlError::Navigation {
                    url: request.url.to_string(),
                    message: e.to_string(),
                })
            }
            Err(_) => {
                return Err(CrawlError::NavigationTimeout {
                    url: request.url.to_string(),
                })
            }
        };

        match classify_page(page.as_ref()).await? {
            PageCondition::Ok => {}
            PageCondition::Blocked => {
                self.ctx.stats.mark_blocked();
                tracing::error!("IP blocked: sign-in redirect detected at {}", page.final_url());
                return Err(CrawlError::Blocked {
                    url: request.url.to_string(),
                });
            }
            PageCondition::SiteError { phrase } => {
                tracing::error!("Site error page detected at {}", page.final_url());
                return Err(CrawlError::SiteError {
                    url: request.url.to_string(),
                    phrase,
                });
            }
        }

        let handler = async {
            match request.kind {
                RequestKind::Search => handle_search(&self.ctx, page.as_ref(), request).await,
                RequestKind::JobDetail => {
                    handle_job_detail(&self.ctx, page.as_ref(), request).await
                }
            }
        };
        match tokio::time::timeout(self.ctx.limits.handler_timeout, handler).await {
            Ok(result) => result,
            Err(_) => Err(CrawlError::HandlerTimeout {
                url: request.url.to_string(),
            }),
        }
    }

    /// Single failure sink: counts the error once per attempt, sniffs block
    /// terms, and routes the request to retry or permanent failure.
    async fn handle_failure(&self, mut request: CrawlRequest, error: CrawlError) {
        tracing::error!("Request failed: {} ({error})", request.url);
        self.ctx.stats.record_error();

        if is_block_message(&error.to_string()) {
            self.ctx.stats.mark_blocked();
        }

        if request.retry_count < self.ctx.limits.max_request_retries {
            request.retry_count += 1;
            tracing::info!(
                "Retrying {} (attempt {}/{})",
                request.url,
                request.retry_count,
                self.ctx.limits.max_request_retries
            );
            if let Err(e) = self.ctx.frontier.requeue(request).await {
                tracing::error!("Failed to requeue request: {e}");
            }
        } else {
            self.persist_permanent_failure(&request, &error).await;
        }
    }

    async fn persist_permanent_failure(&self, request: &CrawlRequest, error: &CrawlError) {
        tracing::error!(
            "Retry budget exhausted for {} after {} retries",
            request.url,
            request.retry_count
        );
        let record = FailedRequestRecord {
            url: request.url.to_string(),
            error_message: error.to_string(),
            request_kind: request.kind.to_string(),
        };
        // Timestamp plus sequence number keeps keys collision-free.
        let seq = self.failure_seq.fetch_add(1, Ordering::Relaxed);
        let key = format!("failed-url-{}-{seq}", Utc::now().timestamp_millis());
        match serde_json::to_value(&record) {
            Ok(value) => {
                if let Err(e) = self.ctx.side_channel.put_json(&key, &value).await {
                    tracing::error!("Failed to persist failure record: {e}");
                }
            }
            Err(e) => tracing::error!("Failed to serialize failure record: {e}"),
        }
    }
}
