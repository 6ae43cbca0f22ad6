//! Request handlers: SEARCH and JOB_DETAIL
//!
//! Each dequeued request is dispatched to the handler matching its kind. The
//! SEARCH handler discovers detail pages and paginates; the JOB_DETAIL
//! handler extracts one record and persists it. Handlers propagate errors to
//! the controller's failure path and never count them locally.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

use crate::browser::Page;
use crate::crawler::coordinator::EngineLimits;
use crate::crawler::frontier::{CrawlRequest, Frontier};
use crate::extract::{ExtractionSchema, FieldExtractor};
use crate::output::RunStats;
use crate::records::JobRecord;
use crate::storage::{RecordSink, SideChannelStore};
use crate::Result;

/// Post-processing hook applied to each record before persistence
///
/// Registered by the embedding application at startup. Returning `None`
/// keeps the record as assembled; returning `Some` replaces it. A transform
/// error is logged and the unmodified record is persisted, so a failing
/// transform never drops the base record.
#[async_trait]
pub trait RecordTransform: Send + Sync {
    async fn apply(
        &self,
        record: &JobRecord,
        page: &dyn Page,
        request: &CrawlRequest,
    ) -> anyhow::Result<Option<JobRecord>>;
}

/// Shared state and collaborators the handlers operate on
pub struct HandlerContext {
    pub frontier: Arc<dyn Frontier>,
    pub records: Arc<dyn RecordSink>,
    pub side_channel: Arc<dyn SideChannelStore>,
    pub stats: Arc<RunStats>,
    pub schema: Arc<ExtractionSchema>,
    pub limits: EngineLimits,
    pub custom_data: Value,
    pub transform: Option<Arc<dyn RecordTransform>>,
    pub debug_mode: bool,
}

/// SEARCH handler: counts listings, enqueues detail requests, paginates
pub async fn handle_search(
    ctx: &HandlerContext,
    page: &dyn Page,
    request: &CrawlRequest,
) -> Result<()> {
    tracing::info!("[SEARCH] Processing: {}", request.url);

    if let Some(primary) = ctx.schema.listing_card.first() {
        match page.wait_for(primary, ctx.limits.listing_wait).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("Listing container did not render; page may be blocked")
            }
            Err(e) => tracing::debug!("Listing wait failed: {e}"),
        }
    }

    let mut card_count = 0;
    for selector in &ctx.schema.listing_card {
        match page.count(selector).await {
            Ok(n) if n > 0 => {
                card_count = n;
                break;
            }
            Ok(_) => {}
            Err(e) => tracing::debug!("Listing selector '{selector}' failed: {e}"),
        }
    }
    ctx.stats.add_jobs_found(card_count as u64);
    tracing::info!("[SEARCH] {card_count} job listings on this page");

    if card_count == 0 {
        capture_zero_result_diagnostics(ctx, page).await;
    }

    let mut detail_hrefs = Vec::new();
    for selector in &ctx.schema.job_link {
        match page.attrs_of(selector, "href").await {
            Ok(hrefs) if !hrefs.is_empty() => {
                detail_hrefs = hrefs;
                break;
            }
            Ok(_) => {}
            Err(e) => tracing::debug!("Job-link selector '{selector}' failed: {e}"),
        }
    }

    // Set semantics over extracted links, discovery order preserved
    let mut seen = HashSet::new();
    let mut enqueued = 0;
    for href in detail_hrefs {
        let resolved = match page.final_url().join(&href) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Skipping unresolvable job link '{href}': {e}");
                continue;
            }
        };
        let detail = CrawlRequest::job_detail(resolved, request.provenance.clone());
        if !seen.insert(detail.dedup_key()) {
            continue;
        }
        if ctx.frontier.enqueue(detail).await? {
            enqueued += 1;
        }
    }
    tracing::info!("[SEARCH] Enqueued {enqueued} job detail requests");

    maybe_enqueue_next_page(ctx, page, request).await
}

/// Captures page metadata (and a screenshot in debug mode) when a search
/// page renders no listings. Never fails the handler.
async fn capture_zero_result_diagnostics(ctx: &HandlerContext, page: &dyn Page) {
    let title = page.title().await.unwrap_or_default();
    let body = page.body_text().await.unwrap_or_default();
    let body_excerpt: String = body.chars().take(500).collect();
    let has_sign_in = any_exists(page, &ctx.schema.sign_in_form).await;
    let has_challenge = any_exists(page, &ctx.schema.challenge_form).await;
    let has_results_container = any_exists(page, &ctx.schema.results_container).await;

    tracing::warn!(
        %title,
        url = %page.final_url(),
        has_sign_in,
        has_challenge,
        has_results_container,
        %body_excerpt,
        "Search page rendered no listings"
    );

    // A sign-in form where listings should be means the session was bounced.
    if has_sign_in {
        ctx.stats.mark_blocked();
    }

    if ctx.debug_mode {
        match page.screenshot().await {
            Ok(bytes) => {
                if let Err(e) = ctx
                    .side_channel
                    .put_bytes("blocked-page-screenshot", "image/png", &bytes)
                    .await
                {
                    tracing::warn!("Failed to store diagnostic screenshot: {e}");
                }
            }
            Err(e) => tracing::warn!("Screenshot capture failed: {e}"),
        }
    }
}

async fn any_exists(page: &dyn Page, candidates: &[String]) -> bool {
    for selector in candidates {
        if matches!(page.exists(selector).await, Ok(true)) {
            return true;
        }
    }
    false
}

/// Enqueues the next result page while the scrape target and the chain depth
/// ceiling both leave room
async fn maybe_enqueue_next_page(
    ctx: &HandlerContext,
    page: &dyn Page,
    request: &CrawlRequest,
) -> Result<()> {
    if ctx.stats.jobs_scraped() >= ctx.limits.max_results as u64 {
        return Ok(());
    }
    if request.page_depth + 1 >= ctx.limits.max_page_depth {
        tracing::warn!(
            "Pagination depth ceiling ({}) reached at {}",
            ctx.limits.max_page_depth,
            request.url
        );
        return Ok(());
    }

    let mut next_href = None;
    for selector in &ctx.schema.next_page {
        match page.attr_of(selector, "href").await {
            Ok(Some(href)) if !href.trim().is_empty() => {
                next_href = Some(href);
                break;
            }
            Ok(_) => {}
            Err(e) => tracing::debug!("Next-page selector '{selector}' failed: {e}"),
        }
    }
    let Some(href) = next_href else {
        return Ok(());
    };

    let next_url = page.final_url().join(&href)?;
    let next = CrawlRequest::search_page(
        next_url,
        request.provenance.clone(),
        request.page_depth + 1,
    );
    if ctx.frontier.enqueue(next).await? {
        tracing::info!("[SEARCH] Next page queued (depth {})", request.page_depth + 1);
    }
    Ok(())
}

/// JOB_DETAIL handler: extracts the field schema and persists one record
pub async fn handle_job_detail(
    ctx: &HandlerContext,
    page: &dyn Page,
    request: &CrawlRequest,
) -> Result<()> {
    tracing::info!("[JOB_DETAIL] Processing: {}", request.url);

    if let Some(primary) = ctx.schema.title.first() {
        match page.wait_for(primary, ctx.limits.title_wait).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!("Job title element did not render"),
            Err(e) => tracing::debug!("Title wait failed: {e}"),
        }
    }

    // One scroll-and-settle cycle so lazily loaded sections render.
    if let Err(e) = page.scroll_by_viewport().await {
        tracing::debug!("Scroll failed: {e}");
    }
    tokio::time::sleep(ctx.limits.settle_delay).await;

    let extractor = FieldExtractor::new(page);
    let fields = extractor.extract_fields(&ctx.schema).await;
    let hiring_team = extractor.extract_hiring_team(&ctx.schema).await;

    let mut record = JobRecord {
        source_url: request.url.to_string(),
        title: JobRecord::or_not_specified(fields.title),
        company: JobRecord::or_not_specified(fields.company),
        location: JobRecord::or_not_specified(fields.location),
        location_type: JobRecord::or_not_specified(fields.location_type),
        seniority: JobRecord::or_not_specified(fields.seniority),
        employment_type: JobRecord::or_not_specified(fields.employment_type),
        description: JobRecord::or_not_specified(fields.description),
        salary: JobRecord::or_not_specified(fields.salary),
        job_criteria: fields.criteria,
        posted_date: JobRecord::or_not_specified(fields.posted_date),
        hiring_team,
        search_query: request.provenance.search_query.clone(),
        location_filter: request.provenance.location.clone(),
        source_search_url: request.provenance.source_search_url.clone(),
        scraped_at: Utc::now(),
        custom_data: ctx.custom_data.clone(),
    };

    if let Some(transform) = &ctx.transform {
        match transform.apply(&record, page, request).await {
            Ok(Some(replacement)) => record = replacement,
            Ok(None) => {}
            Err(e) => {
                tracing::error!("Record transform failed, keeping base record: {e}")
            }
        }
    }

    ctx.records.push(&record).await?;
    ctx.stats.record_scraped();
    tracing::info!("[JOB_DETAIL] Scraped: {} at {}", record.title, record.company);
    Ok(())
}
