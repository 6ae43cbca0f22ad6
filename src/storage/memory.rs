//! In-memory persistence for tests and lightweight embeddings
//!
//! Both stores keep everything they receive and expose it for inspection,
//! so tests can assert on exactly what the engine persisted.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

use super::traits::{RecordSink, SideChannelStore, StorageResult};
use crate::records::JobRecord;

/// Record sink that accumulates records in memory
#[derive(Default)]
pub struct MemoryRecordSink {
    records: Mutex<Vec<JobRecord>>,
}

impl MemoryRecordSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything pushed so far, in arrival order.
    pub fn records(&self) -> Vec<JobRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordSink for MemoryRecordSink {
    async fn push(&self, record: &JobRecord) -> StorageResult<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Side channel that accumulates keyed values in memory
#[derive(Default)]
pub struct MemorySideChannel {
    json: Mutex<Vec<(String, Value)>>,
    bytes: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl MemorySideChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON entries stored so far, in arrival order.
    pub fn json_entries(&self) -> Vec<(String, Value)> {
        self.json.lock().unwrap().clone()
    }

    /// Keys of JSON entries stored so far.
    pub fn json_keys(&self) -> Vec<String> {
        self.json
            .lock()
            .unwrap()
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Keys of binary entries stored so far.
    pub fn bytes_keys(&self) -> Vec<String> {
        self.bytes
            .lock()
            .unwrap()
            .iter()
            .map(|(key, _, _)| key.clone())
            .collect()
    }
}

#[async_trait]
impl SideChannelStore for MemorySideChannel {
    async fn put_json(&self, key: &str, value: &Value) -> StorageResult<()> {
        self.json
            .lock()
            .unwrap()
            .push((key.to_string(), value.clone()));
        Ok(())
    }

    async fn put_bytes(&self, key: &str, content_type: &str, bytes: &[u8]) -> StorageResult<()> {
        self.bytes.lock().unwrap().push((
            key.to_string(),
            content_type.to_string(),
            bytes.to_vec(),
        ));
        Ok(())
    }
}
