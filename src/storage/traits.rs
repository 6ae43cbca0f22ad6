//! Storage traits and error types

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::records::JobRecord;

/// Errors that can occur during persistence operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Sink write failed: {0}")]
    Write(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for persistence operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Append-only sink receiving one record per scraped detail page
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn push(&self, record: &JobRecord) -> StorageResult<()>;
}

/// Keyed store for run diagnostics: failure snapshots, debug screenshots,
/// and the final stats snapshot
#[async_trait]
pub trait SideChannelStore: Send + Sync {
    async fn put_json(&self, key: &str, value: &Value) -> StorageResult<()>;

    async fn put_bytes(&self, key: &str, content_type: &str, bytes: &[u8]) -> StorageResult<()>;
}
