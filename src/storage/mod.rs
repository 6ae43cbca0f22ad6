//! Persistence collaborators
//!
//! The engine persists through injected trait objects rather than a storage
//! substrate of its own: an append-only record sink and a keyed side channel
//! for diagnostics. In-memory and file-backed reference implementations are
//! provided.

pub mod jsonl;
pub mod memory;
pub mod traits;

pub use jsonl::{DirSideChannel, JsonlRecordSink};
pub use memory::{MemoryRecordSink, MemorySideChannel};
pub use traits::{RecordSink, SideChannelStore, StorageError, StorageResult};
