//! Whole-document key/value persistence
//!
//! Both the favicon cache and the link collection are persisted as single
//! serialized documents under their own key. Updates are read-modify-write
//! of the full document with no locking across writers: the last writer's
//! snapshot wins.

use async_trait::async_trait;

use crate::errors::StorageResult;

pub mod file;
pub mod memory;

pub use file::FileDocumentStore;
pub use memory::MemoryDocumentStore;

/// Key/value store of whole string documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the document stored under `key`, `None` when absent
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replace the document stored under `key`
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Drop the document stored under `key`; absent keys are not an error
    async fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Keys double as file stems, so only `[A-Za-z0-9_-]` is accepted
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
