//! Crawl orchestration: frontier, routing, classification, control loop

pub mod classifier;
pub mod coordinator;
pub mod frontier;
pub mod handlers;

pub use classifier::{classify_page, is_block_message, PageCondition};
pub use coordinator::{Collaborators, Coordinator, EngineLimits};
pub use frontier::{CrawlRequest, Frontier, MemoryFrontier, Provenance, RequestKind};
pub use handlers::{HandlerContext, RecordTransform};
