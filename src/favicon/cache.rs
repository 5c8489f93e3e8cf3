//! Domain-keyed favicon cache with TTL expiry and bounded size
//!
//! The collection lives in memory and is persisted as one JSON document
//! after every write. Reads never touch the store, which keeps lookups
//! synchronous. Expired entries read as a miss but stay in place until an
//! eviction pass removes them. Eviction runs on write once the collection
//! grows past `max_entries * eviction_headroom` and is two-phase: drop
//! expired entries, then keep only the newest `max_entries`.
//!
//! Persistence is best effort. A failed load starts from an empty cache and
//! a failed save leaves the in-memory state authoritative; both are reported
//! and never surface to callers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::Mutex;
use tracing::{debug, info, trace};

use crate::config::CacheConfig;
use crate::errors::{AppError, AppResult};
use crate::notifications::ErrorReporter;
use crate::storage::DocumentStore;
use crate::utils::time::{Clock, SystemClock, duration_millis};

/// Cached resolution outcome for one domain
///
/// `resolved_icon: None` is a negative result: every candidate failed as of
/// `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub resolved_icon: Option<String>,
    /// Epoch milliseconds
    pub timestamp: i64,
}

/// Result of a cache read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// Fresh entry; the value may be a cached failure
    Hit(Option<String>),
    /// Absent or expired
    Miss,
}

impl CacheLookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionStats {
    pub expired: usize,
    pub truncated: usize,
    pub remaining: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub fresh_icons: usize,
    pub fresh_failures: usize,
    pub expired_entries: usize,
}

pub struct FaviconCache {
    store: Arc<dyn DocumentStore>,
    key: String,
    config: CacheConfig,
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// Orders snapshot-and-save so saves land in write order
    persist_lock: Mutex<()>,
    clock: Arc<dyn Clock>,
    reporter: Arc<ErrorReporter>,
}

impl std::fmt::Debug for FaviconCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaviconCache")
            .field("key", &self.key)
            .field("config", &self.config)
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

impl FaviconCache {
    /// Create an empty cache bound to `key` in `store`; call [`reload`](Self::reload) to populate it
    pub fn new(store: Arc<dyn DocumentStore>, key: impl Into<String>, config: CacheConfig) -> Self {
        Self {
            store,
            key: key.into(),
            config,
            entries: RwLock::new(HashMap::new()),
            persist_lock: Mutex::new(()),
            clock: Arc::new(SystemClock),
            reporter: Arc::new(ErrorReporter::default()),
        }
    }

    /// Create and populate from the persisted document
    pub async fn load(
        store: Arc<dyn DocumentStore>,
        key: impl Into<String>,
        config: CacheConfig,
    ) -> Self {
        let cache = Self::new(store, key, config);
        cache.reload().await;
        cache
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Replace the in-memory collection with the persisted one
    ///
    /// Missing, unreadable or corrupt documents yield an empty cache.
    pub async fn reload(&self) {
        let loaded = match self.read_document().await {
            Ok(entries) => entries,
            Err(e) => {
                self.reporter
                    .report("Failed to load favicon cache, starting empty", &e);
                HashMap::new()
            }
        };
        debug!("Loaded {} favicon cache entries", loaded.len());
        *self.entries_mut() = loaded;
    }

    async fn read_document(&self) -> AppResult<HashMap<String, CacheEntry>> {
        match self.store.get(&self.key).await? {
            Some(contents) => Ok(serde_json::from_str(&contents)?),
            None => Ok(HashMap::new()),
        }
    }

    /// Look up `domain`; expired entries are a miss and are left in place
    pub fn read(&self, domain: &str) -> CacheLookup {
        let now = self.clock.now_millis();
        match self.entries().get(domain) {
            Some(entry) if !self.is_expired(entry, now) => {
                trace!("Favicon cache hit for {}", domain);
                CacheLookup::Hit(entry.resolved_icon.clone())
            }
            Some(_) => {
                trace!("Favicon cache entry for {} expired", domain);
                CacheLookup::Miss
            }
            None => CacheLookup::Miss,
        }
    }

    /// Upsert `domain` stamped with the current time, evicting if over the threshold, then persist
    pub async fn write(&self, domain: &str, resolved_icon: Option<String>) {
        let _guard = self.persist_lock.lock().await;
        let snapshot = {
            let mut entries = self.entries_mut();
            entries.insert(
                domain.to_string(),
                CacheEntry {
                    resolved_icon,
                    timestamp: self.clock.now_millis(),
                },
            );

            if entries.len() > self.config.eviction_threshold() {
                let stats = self.evict_entries(&mut entries);
                info!(
                    "Favicon cache eviction: expired={} truncated={} remaining={}",
                    stats.expired, stats.truncated, stats.remaining
                );
            }

            serde_json::to_string(&*entries)
        };

        match snapshot {
            Ok(document) => self.persist(&document).await,
            Err(e) => {
                self.reporter
                    .report("Failed to serialize favicon cache", &AppError::from(e));
            }
        }
    }

    /// Run an eviction pass on the in-memory collection without persisting
    pub fn evict(&self) -> EvictionStats {
        let mut entries = self.entries_mut();
        self.evict_entries(&mut entries)
    }

    /// Run an eviction pass and persist the result
    pub async fn evict_and_persist(&self) -> EvictionStats {
        let _guard = self.persist_lock.lock().await;
        let (stats, snapshot) = {
            let mut entries = self.entries_mut();
            let stats = self.evict_entries(&mut entries);
            (stats, serde_json::to_string(&*entries))
        };
        match snapshot {
            Ok(document) => self.persist(&document).await,
            Err(e) => {
                self.reporter
                    .report("Failed to serialize favicon cache", &AppError::from(e));
            }
        }
        stats
    }

    /// Drop every entry, in memory and in the store
    pub async fn clear(&self) {
        let _guard = self.persist_lock.lock().await;
        self.entries_mut().clear();
        if let Err(e) = self.store.remove(&self.key).await {
            self.reporter
                .report("Failed to remove persisted favicon cache", &AppError::from(e));
        }
        info!("Favicon cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now_millis();
        let entries = self.entries();
        let mut stats = CacheStats {
            total_entries: entries.len(),
            ..CacheStats::default()
        };
        for entry in entries.values() {
            if self.is_expired(entry, now) {
                stats.expired_entries += 1;
            } else if entry.resolved_icon.is_some() {
                stats.fresh_icons += 1;
            } else {
                stats.fresh_failures += 1;
            }
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Copy of the raw entry, expired or not
    pub fn entry(&self, domain: &str) -> Option<CacheEntry> {
        self.entries().get(domain).cloned()
    }

    fn evict_entries(&self, entries: &mut HashMap<String, CacheEntry>) -> EvictionStats {
        let now = self.clock.now_millis();
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        let expired = before - entries.len();

        let mut truncated = 0;
        if entries.len() > self.config.max_entries {
            let mut newest: Vec<(String, CacheEntry)> = entries.drain().collect();
            // Domain breaks timestamp ties so the kept set is deterministic
            newest.sort_by(|(a_domain, a), (b_domain, b)| {
                b.timestamp
                    .cmp(&a.timestamp)
                    .then_with(|| a_domain.cmp(b_domain))
            });
            truncated = newest.len() - self.config.max_entries;
            newest.truncate(self.config.max_entries);
            entries.extend(newest);
        }

        EvictionStats {
            expired,
            truncated,
            remaining: entries.len(),
        }
    }

    fn is_expired(&self, entry: &CacheEntry, now: i64) -> bool {
        now.saturating_sub(entry.timestamp) > duration_millis(self.config.ttl)
    }

    async fn persist(&self, document: &str) {
        if let Err(e) = self.store.set(&self.key, document).await {
            let err: AppError = e.into();
            self.reporter
                .report("Failed to persist favicon cache", &err);
        }
    }

    fn entries(&self) -> RwLockReadGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn entries_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryDocumentStore;
    use crate::utils::time::ManualClock;
    use std::time::Duration;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);
    const START: i64 = 1_700_000_000_000;

    fn small_config(max_entries: usize, eviction_headroom: f64) -> CacheConfig {
        CacheConfig {
            max_entries,
            eviction_headroom,
            ..CacheConfig::default()
        }
    }

    fn cache_with(
        store: Arc<MemoryDocumentStore>,
        config: CacheConfig,
    ) -> (FaviconCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(START));
        let cache = FaviconCache::new(store, "favicon_cache", config).with_clock(clock.clone());
        (cache, clock)
    }

    #[tokio::test]
    async fn test_read_distinguishes_miss_hit_and_cached_failure() {
        let (cache, _) = cache_with(Arc::new(MemoryDocumentStore::new()), CacheConfig::default());

        assert_eq!(cache.read("example.com"), CacheLookup::Miss);

        cache
            .write("example.com", Some("https://example.com/favicon.ico".into()))
            .await;
        cache.write("dead.example", None).await;

        assert_eq!(
            cache.read("example.com"),
            CacheLookup::Hit(Some("https://example.com/favicon.ico".into()))
        );
        assert_eq!(cache.read("dead.example"), CacheLookup::Hit(None));
    }

    #[tokio::test]
    async fn test_expired_entry_is_miss_but_not_deleted() {
        let (cache, clock) = cache_with(Arc::new(MemoryDocumentStore::new()), CacheConfig::default());
        cache.write("example.com", Some("icon".into())).await;

        clock.advance(7 * DAY);
        assert!(cache.read("example.com").is_hit(), "exactly TTL old is still fresh");

        clock.advance(Duration::from_millis(1));
        assert_eq!(cache.read("example.com"), CacheLookup::Miss);
        assert_eq!(cache.len(), 1);
        assert!(cache.entry("example.com").is_some());
    }

    #[tokio::test]
    async fn test_write_persists_whole_document() {
        let store = Arc::new(MemoryDocumentStore::new());
        let (cache, _) = cache_with(store.clone(), CacheConfig::default());
        cache.write("a.example", Some("https://a.example/favicon.ico".into())).await;
        cache.write("b.example", None).await;

        let document = store.get("favicon_cache").await.unwrap().unwrap();
        let parsed: HashMap<String, CacheEntry> = serde_json::from_str(&document).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["b.example"].resolved_icon, None);
        assert_eq!(parsed["a.example"].timestamp, START);
        assert!(document.contains("\"resolvedIcon\""));
    }

    #[tokio::test]
    async fn test_reload_restores_persisted_entries() {
        let store = Arc::new(MemoryDocumentStore::new());
        let (cache, _) = cache_with(store.clone(), CacheConfig::default());
        cache.write("a.example", Some("icon-a".into())).await;

        let (reloaded, _) = cache_with(store, CacheConfig::default());
        assert!(reloaded.is_empty());
        reloaded.reload().await;
        assert_eq!(reloaded.read("a.example"), CacheLookup::Hit(Some("icon-a".into())));
    }

    #[tokio::test]
    async fn test_corrupt_document_loads_empty() {
        let store = Arc::new(MemoryDocumentStore::new());
        store.set("favicon_cache", "{not json").await.unwrap();
        let cache = FaviconCache::load(store, "favicon_cache", CacheConfig::default()).await;
        assert!(cache.is_empty());
        assert_eq!(cache.read("anything"), CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_quota_failure_keeps_in_memory_write() {
        let store = Arc::new(MemoryDocumentStore::with_quota(10));
        let (cache, _) = cache_with(store.clone(), CacheConfig::default());
        cache.write("example.com", Some("https://example.com/favicon.ico".into())).await;

        assert_eq!(
            cache.read("example.com"),
            CacheLookup::Hit(Some("https://example.com/favicon.ico".into()))
        );
        assert_eq!(store.get("favicon_cache").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_eviction_triggers_only_past_headroom() {
        let (cache, clock) = cache_with(Arc::new(MemoryDocumentStore::new()), small_config(10, 1.2));
        for i in 0..12 {
            cache.write(&format!("site{i}.example"), None).await;
            clock.advance(Duration::from_millis(1));
        }
        assert_eq!(cache.len(), 12);

        cache.write("site12.example", None).await;
        assert_eq!(cache.len(), 10);
        // Newest ten survive: site3..=site12
        assert_eq!(cache.read("site2.example"), CacheLookup::Miss);
        assert!(cache.read("site3.example").is_hit());
        assert!(cache.read("site12.example").is_hit());
    }

    #[tokio::test]
    async fn test_evict_drops_expired_before_truncating() {
        let (cache, clock) = cache_with(Arc::new(MemoryDocumentStore::new()), small_config(4, 1.0));
        cache.write("old1.example", None).await;
        cache.write("old2.example", None).await;
        clock.advance(8 * DAY);
        cache.write("new1.example", None).await;
        clock.advance(Duration::from_millis(1));
        cache.write("new2.example", None).await;

        let stats = cache.evict();
        assert_eq!(
            stats,
            EvictionStats {
                expired: 2,
                truncated: 0,
                remaining: 2
            }
        );
        assert!(cache.entry("old1.example").is_none());

        cache.write("new3.example", None).await;
        cache.write("new4.example", None).await;
        cache.write("new5.example", None).await;
        // Fifth entry crossed the threshold; the oldest fresh one went
        assert_eq!(cache.len(), 4);
        assert!(cache.entry("new1.example").is_none());
    }

    #[tokio::test]
    async fn test_clear_removes_document() {
        let store = Arc::new(MemoryDocumentStore::new());
        let (cache, _) = cache_with(store.clone(), CacheConfig::default());
        cache.write("a.example", None).await;
        cache.clear().await;
        assert!(cache.is_empty());
        assert_eq!(store.get("favicon_cache").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stats_buckets_entries() {
        let (cache, clock) = cache_with(Arc::new(MemoryDocumentStore::new()), CacheConfig::default());
        cache.write("stale.example", Some("icon".into())).await;
        clock.advance(8 * DAY);
        cache.write("icon.example", Some("icon".into())).await;
        cache.write("none.example", None).await;

        assert_eq!(
            cache.stats(),
            CacheStats {
                total_entries: 3,
                fresh_icons: 1,
                fresh_failures: 1,
                expired_entries: 1
            }
        );
    }
}
