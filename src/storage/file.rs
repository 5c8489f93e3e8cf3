use async_trait::async_trait;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::{fs, task};
use tracing::trace;

use super::{DocumentStore, is_valid_key};
use crate::errors::{StorageError, StorageResult};

/// One JSON file per key under a root directory
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    root: PathBuf,
}

impl FileDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_storage_dir(&self) -> Result<(), std::io::Error> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).await?;
        }
        Ok(())
    }

    fn document_path(&self, key: &str) -> StorageResult<PathBuf> {
        if !is_valid_key(key) {
            return Err(StorageError::invalid_key(key));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.document_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.document_path(key)?;
        self.ensure_storage_dir().await?;

        let root = self.root.clone();
        let target = path.clone();
        let document = value.as_bytes().to_vec();
        task::spawn_blocking(move || write_atomically(&root, &target, &document))
            .await
            .map_err(std::io::Error::other)??;
        trace!("Persisted {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.document_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write through a uniquely named temp file in `root`, then rename over `target`
///
/// Concurrent writers each get their own temp file, so the last rename wins
/// and readers only ever see a complete document.
fn write_atomically(root: &Path, target: &Path, document: &[u8]) -> std::io::Result<()> {
    let mut tmp = NamedTempFile::new_in(root)?;
    tmp.write_all(document)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
