//! File-backed persistence
//!
//! `JsonlRecordSink` appends one JSON document per line; `DirSideChannel`
//! writes each keyed value to its own file under a directory. Writes are
//! line-sized, so synchronous IO under a mutex is sufficient.

use async_trait::async_trait;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::traits::{RecordSink, SideChannelStore, StorageResult};
use crate::records::JobRecord;

/// Record sink appending one JSON document per line to a file
pub struct JsonlRecordSink {
    file: Mutex<File>,
}

impl JsonlRecordSink {
    /// Opens (or creates) the sink file in append mode.
    pub fn new(path: impl AsRef<Path>) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

#[async_trait]
impl RecordSink for JsonlRecordSink {
    async fn push(&self, record: &JobRecord) -> StorageResult<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = self.file.lock().unwrap();
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

/// Side channel writing each value to `<dir>/<key>.<ext>`
pub struct DirSideChannel {
    dir: PathBuf,
}

impl DirSideChannel {
    /// Creates the target directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn extension_for(content_type: &str) -> &'static str {
        match content_type {
            "image/png" => "png",
            "image/jpeg" => "jpg",
            "text/html" => "html",
            _ => "bin",
        }
    }
}

#[async_trait]
impl SideChannelStore for DirSideChannel {
    async fn put_json(&self, key: &str, value: &Value) -> StorageResult<()> {
        let path = self.dir.join(format!("{key}.json"));
        let rendered = serde_json::to_string_pretty(value)?;
        std::fs::write(path, rendered)?;
        Ok(())
    }

    async fn put_bytes(&self, key: &str, content_type: &str, bytes: &[u8]) -> StorageResult<()> {
        let path = self
            .dir
            .join(format!("{key}.{}", Self::extension_for(content_type)));
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
