use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::model::records_mut;
use crate::errors::AppResult;
use crate::notifications::ErrorReporter;
use crate::storage::DocumentStore;
use crate::utils::url::UrlUtils;

/// Propagates resolved favicons into the persisted link collection
///
/// Best effort only: a missing or unreadable collection is a no-op and a
/// failed save is reported, never returned.
pub struct LinkIconSync {
    store: Arc<dyn DocumentStore>,
    key: String,
    /// Serialises read-modify-write cycles issued through this instance
    update_lock: Mutex<()>,
    reporter: Arc<ErrorReporter>,
}

impl std::fmt::Debug for LinkIconSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkIconSync")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl LinkIconSync {
    pub fn new(store: Arc<dyn DocumentStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            update_lock: Mutex::new(()),
            reporter: Arc::new(ErrorReporter::default()),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Set `icon` on every record whose link domain is `domain`
    ///
    /// Returns how many records changed. The collection is saved once, and
    /// only when something changed.
    pub async fn sync(&self, domain: &str, icon: Option<&str>) -> usize {
        let _guard = self.update_lock.lock().await;

        let mut collection = match self.load().await {
            Ok(Some(collection)) => collection,
            Ok(None) => {
                debug!("No link collection under '{}', skipping icon sync", self.key);
                return 0;
            }
            Err(e) => {
                self.reporter
                    .report("Failed to read link collection for icon sync", &e);
                return 0;
            }
        };

        let updated = apply_icon(&mut collection, domain, icon);
        if updated == 0 {
            return 0;
        }

        match self.save(&collection).await {
            Ok(()) => {
                info!("Updated icon on {} link(s) for {}", updated, domain);
                updated
            }
            Err(e) => {
                self.reporter
                    .report("Failed to save link collection after icon sync", &e);
                0
            }
        }
    }

    async fn load(&self) -> AppResult<Option<Value>> {
        match self.store.get(&self.key).await? {
            Some(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, collection: &Value) -> AppResult<()> {
        let document = serde_json::to_string(collection)?;
        self.store.set(&self.key, &document).await?;
        Ok(())
    }
}

/// Update matching records in place, returning the number changed
pub fn apply_icon(collection: &mut Value, domain: &str, icon: Option<&str>) -> usize {
    let mut updated = 0;
    for mut record in records_mut(collection) {
        let Some(value) = record.value() else {
            continue;
        };
        if UrlUtils::extract_domain(value).as_deref() != Some(domain) {
            continue;
        }
        if record.icon() != icon {
            record.set_icon(icon);
            updated += 1;
        }
    }
    updated
}
