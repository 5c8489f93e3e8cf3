//! Favicon resolution: cache, ordered probing, cache write, link sync
//!
//! Candidates are probed strictly one after another in preference order and
//! the first loadable one wins. Racing them would let a fast low-preference
//! source beat the site's own icon.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info};

use super::cache::{CacheLookup, FaviconCache};
use super::candidates::generate_candidates;
use super::prober::{HttpImageProber, ImageProber};
use crate::config::Config;
use crate::config::defaults::{DEFAULT_BATCH_CONCURRENCY, DEFAULT_ICON_SIZE};
use crate::errors::AppResult;
use crate::links::LinkIconSync;
use crate::notifications::ErrorReporter;
use crate::storage::DocumentStore;
use crate::utils::url::UrlUtils;

/// Cache key prefix for inputs with no domain; ':' never appears in a host
const INVALID_KEY_PREFIX: &str = "invalid:";

pub struct FaviconResolver {
    cache: Arc<FaviconCache>,
    prober: Arc<dyn ImageProber>,
    link_sync: Arc<LinkIconSync>,
    default_size: u32,
    batch_concurrency: usize,
}

impl std::fmt::Debug for FaviconResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaviconResolver")
            .field("cache", &self.cache)
            .field("link_sync", &self.link_sync)
            .field("default_size", &self.default_size)
            .field("batch_concurrency", &self.batch_concurrency)
            .finish_non_exhaustive()
    }
}

impl FaviconResolver {
    pub fn new(
        cache: Arc<FaviconCache>,
        prober: Arc<dyn ImageProber>,
        link_sync: Arc<LinkIconSync>,
    ) -> Self {
        Self {
            cache,
            prober,
            link_sync,
            default_size: DEFAULT_ICON_SIZE,
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }

    /// Wire up the full engine over `store` with an HTTP prober
    pub async fn from_config(
        config: &Config,
        store: Arc<dyn DocumentStore>,
        reporter: Arc<ErrorReporter>,
    ) -> AppResult<Self> {
        let prober = HttpImageProber::new(&config.probe)?;
        let cache = FaviconCache::new(
            store.clone(),
            config.storage.cache_key.clone(),
            config.cache.clone(),
        )
        .with_reporter(reporter.clone());
        cache.reload().await;
        let link_sync =
            LinkIconSync::new(store, config.storage.links_key.clone()).with_reporter(reporter);

        Ok(Self::new(Arc::new(cache), Arc::new(prober), Arc::new(link_sync))
            .with_default_size(config.probe.default_size)
            .with_batch_concurrency(config.probe.batch_concurrency))
    }

    pub fn with_default_size(mut self, size: u32) -> Self {
        self.default_size = size;
        self
    }

    pub fn with_batch_concurrency(mut self, concurrency: usize) -> Self {
        self.batch_concurrency = concurrency.max(1);
        self
    }

    pub fn cache(&self) -> &Arc<FaviconCache> {
        &self.cache
    }

    pub fn default_size(&self) -> u32 {
        self.default_size
    }

    /// Cached outcome for `url` without probing: icon, cached failure, or not cached
    pub fn lookup(&self, url: &str) -> CacheLookup {
        self.cache.read(&cache_key(url))
    }

    /// Resolve the best icon URL for `url`, `None` when no candidate loads
    pub async fn resolve(&self, url: &str, size: u32) -> Option<String> {
        let key = cache_key(url);
        if let CacheLookup::Hit(cached) = self.cache.read(&key) {
            debug!("Favicon for {} served from cache", key);
            return cached;
        }

        let Some(domain) = UrlUtils::extract_domain(url) else {
            debug!(
                "No domain in {:?}, caching failure",
                UrlUtils::obfuscate_credentials(url)
            );
            self.cache.write(&key, None).await;
            return None;
        };

        let mut resolved = None;
        for candidate in generate_candidates(url, size) {
            if self.prober.probe(&candidate.url).await {
                debug!("Favicon for {} found via {}", domain, candidate.source);
                resolved = Some(candidate.url);
                break;
            }
        }

        match &resolved {
            Some(icon) => info!(
                "Resolved favicon for {}: {}",
                domain,
                UrlUtils::obfuscate_credentials(icon)
            ),
            None => info!("No favicon candidate loaded for {}", domain),
        }

        self.cache.write(&domain, resolved.clone()).await;
        self.link_sync.sync(&domain, resolved.as_deref()).await;
        resolved
    }

    pub async fn resolve_default(&self, url: &str) -> Option<String> {
        self.resolve(url, self.default_size).await
    }

    /// Resolve many URLs concurrently; results keep input order
    pub async fn resolve_many<I>(&self, urls: I, size: u32) -> Vec<(String, Option<String>)>
    where
        I: IntoIterator<Item = String>,
    {
        stream::iter(urls)
            .map(|url| async move {
                let icon = self.resolve(&url, size).await;
                (url, icon)
            })
            .buffered(self.batch_concurrency)
            .collect()
            .await
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }
}

/// Domain for valid URLs, a prefixed marker for everything else
fn cache_key(url: &str) -> String {
    UrlUtils::extract_domain(url)
        .unwrap_or_else(|| format!("{INVALID_KEY_PREFIX}{}", url.trim()))
}
