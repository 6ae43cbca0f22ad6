//! Typed request frontier
//!
//! The frontier holds every not-yet-processed crawl request, deduplicated by
//! normalized URL. Two request kinds flow through it: SEARCH result pages and
//! JOB_DETAIL pages, each carrying the provenance of the search that
//! discovered it.

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Mutex;
use url::Url;

use crate::storage::StorageError;

/// The two page types the router understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Search,
    JobDetail,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Search => write!(f, "SEARCH"),
            RequestKind::JobDetail => write!(f, "JOB_DETAIL"),
        }
    }
}

/// Where a request came from; carried into every derived record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Provenance {
    pub search_query: Option<String>,
    pub location: Option<String>,
    pub source_search_url: Option<String>,
}

/// One unit of crawl work
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    pub url: Url,
    pub kind: RequestKind,
    pub provenance: Provenance,
    /// Result-page ordinal within one search chain; zero for seeds and for
    /// detail requests.
    pub page_depth: u32,
    pub retry_count: u32,
}

impl CrawlRequest {
    /// A seed or first-page search request.
    pub fn search(url: Url, provenance: Provenance) -> Self {
        Self::search_page(url, provenance, 0)
    }

    /// A paginated search request at the given chain depth.
    pub fn search_page(url: Url, provenance: Provenance, page_depth: u32) -> Self {
        Self {
            url,
            kind: RequestKind::Search,
            provenance,
            page_depth,
            retry_count: 0,
        }
    }

    /// A job-detail request discovered on a search page.
    pub fn job_detail(url: Url, provenance: Provenance) -> Self {
        Self {
            url,
            kind: RequestKind::JobDetail,
            provenance,
            page_depth: 0,
            retry_count: 0,
        }
    }

    /// Deduplication key: the URL with any fragment stripped.
    pub fn dedup_key(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url.to_string()
    }
}

/// Queue of not-yet-processed requests, deduplicated by normalized URL
#[async_trait]
pub trait Frontier: Send + Sync {
    /// Adds a newly discovered request. Returns false when the URL was seen
    /// before and the request was dropped.
    async fn enqueue(&self, request: CrawlRequest) -> Result<bool, StorageError>;

    /// Re-admits a failed request for retry, bypassing deduplication.
    async fn requeue(&self, request: CrawlRequest) -> Result<(), StorageError>;

    /// Yields the next request, or None when the queue is drained.
    async fn dequeue(&self) -> Result<Option<CrawlRequest>, StorageError>;

    /// Number of requests currently queued.
    async fn len(&self) -> usize;
}

#[derive(Default)]
struct FrontierState {
    queue: VecDeque<CrawlRequest>,
    seen: HashSet<String>,
}

/// FIFO in-memory frontier with set-semantics deduplication
#[derive(Default)]
pub struct MemoryFrontier {
    inner: Mutex<FrontierState>,
}

impl MemoryFrontier {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Frontier for MemoryFrontier {
    async fn enqueue(&self, request: CrawlRequest) -> Result<bool, StorageError> {
        let mut state = self.inner.lock().unwrap();
        if !state.seen.insert(request.dedup_key()) {
            return Ok(false);
        }
        state.queue.push_back(request);
        Ok(true)
    }

    async fn requeue(&self, request: CrawlRequest) -> Result<(), StorageError> {
        self.inner.lock().unwrap().queue.push_back(request);
        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<CrawlRequest>, StorageError> {
        Ok(self.inner.lock().unwrap().queue.pop_front())
    }

    async fn len(&self) -> usize {
        self.inner.lock().unwrap().queue.len()
    }
}
