/// Configuration default values
///
/// All defaults live here so they can be changed in one place.
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

// Storage defaults
pub const DEFAULT_STORAGE_PATH: &str = "./data";
pub const DEFAULT_CACHE_KEY: &str = "favicon_cache";
pub const DEFAULT_LINKS_KEY: &str = "link_groups";

// Cache defaults
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
pub const DEFAULT_MAX_CACHE_ENTRIES: usize = 500;
pub const DEFAULT_EVICTION_HEADROOM: f64 = 1.2;

// Probe defaults
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_ICON_SIZE: u32 = 32;
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 1024 * 1024; // 1MB
pub const DEFAULT_BATCH_CONCURRENCY: usize = 8;

// Notification defaults
pub const DEFAULT_NOTIFICATION_INTERVAL: Duration = Duration::from_secs(5);

pub fn default_storage_path() -> std::path::PathBuf {
    std::path::PathBuf::from(DEFAULT_STORAGE_PATH)
}
pub fn default_cache_key() -> String {
    DEFAULT_CACHE_KEY.to_string()
}
pub fn default_links_key() -> String {
    DEFAULT_LINKS_KEY.to_string()
}
pub fn default_cache_ttl() -> Duration {
    DEFAULT_CACHE_TTL
}
pub fn default_max_cache_entries() -> usize {
    DEFAULT_MAX_CACHE_ENTRIES
}
pub fn default_eviction_headroom() -> f64 {
    DEFAULT_EVICTION_HEADROOM
}
pub fn default_probe_timeout() -> Duration {
    DEFAULT_PROBE_TIMEOUT
}
pub fn default_icon_size() -> u32 {
    DEFAULT_ICON_SIZE
}
pub fn default_max_image_bytes() -> usize {
    DEFAULT_MAX_IMAGE_BYTES
}
pub fn default_batch_concurrency() -> usize {
    DEFAULT_BATCH_CONCURRENCY
}
pub fn default_notification_interval() -> Duration {
    DEFAULT_NOTIFICATION_INTERVAL
}
