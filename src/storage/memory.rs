use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::DocumentStore;
use crate::errors::{StorageError, StorageResult};

/// In-process document store with an optional total byte quota
///
/// The quota models browser-style storage limits: a `set` that would push
/// the combined size of all documents over the quota is refused and the
/// previous document is kept.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.documents.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut documents = self.documents.write().await;
        if let Some(quota) = self.quota_bytes {
            let others: usize = documents
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let size = others + key.len() + value.len();
            if size > quota {
                return Err(StorageError::quota_exceeded(key, size, quota));
            }
        }
        documents.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.documents.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip() {
        let store = MemoryDocumentStore::new();
        assert!(store.is_empty().await);
        store.set("links", "[]").await.unwrap();
        assert_eq!(store.get("links").await.unwrap().as_deref(), Some("[]"));
        store.remove("links").await.unwrap();
        assert_eq!(store.get("links").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_quota_refuses_oversized_documents() {
        let store = MemoryDocumentStore::with_quota(16);
        store.set("k", "0123456789").await.unwrap();

        let err = store.set("k2", "0123456789").await.unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { quota: 16, .. }));
        assert_eq!(store.len().await, 1);

        // Replacing an existing document only counts the new value
        store.set("k", "01234567890123").await.unwrap();
        assert_eq!(
            store.get("k").await.unwrap().as_deref(),
            Some("01234567890123")
        );
    }
}
