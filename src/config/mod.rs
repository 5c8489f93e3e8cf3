use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use crate::errors::{AppError, AppResult};
use crate::storage::is_valid_key;
use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Where the cache and link documents are persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
    #[serde(default = "default_cache_key")]
    pub cache_key: String,
    #[serde(default = "default_links_key")]
    pub links_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Age after which an entry is treated as a miss
    #[serde(default = "default_cache_ttl", with = "duration_serde::duration")]
    pub ttl: Duration,
    #[serde(default = "default_max_cache_entries")]
    pub max_entries: usize,
    /// Eviction runs once the entry count exceeds `max_entries * eviction_headroom`
    #[serde(default = "default_eviction_headroom")]
    pub eviction_headroom: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_probe_timeout", with = "duration_serde::duration")]
    pub timeout: Duration,
    #[serde(default = "default_icon_size")]
    pub default_size: u32,
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Minimum gap between two user-facing notifications
    #[serde(
        default = "default_notification_interval",
        with = "duration_serde::duration"
    )]
    pub min_interval: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            cache_key: default_cache_key(),
            links_key: default_links_key(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: default_cache_ttl(),
            max_entries: default_max_cache_entries(),
            eviction_headroom: default_eviction_headroom(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: default_probe_timeout(),
            default_size: default_icon_size(),
            max_image_bytes: default_max_image_bytes(),
            batch_concurrency: default_batch_concurrency(),
            user_agent: None,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            min_interval: default_notification_interval(),
        }
    }
}

impl CacheConfig {
    /// Entry count above which a write triggers eviction
    pub fn eviction_threshold(&self) -> usize {
        // epsilon absorbs products like 10 * 1.2 landing just under 12
        (self.max_entries as f64 * self.eviction_headroom + 1e-9).floor() as usize
    }
}

impl ProbeConfig {
    pub fn user_agent(&self) -> String {
        self.user_agent.clone().unwrap_or_else(|| {
            format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
        })
    }
}

impl Config {
    /// Config file to use: `explicit` if given, else `CONFIG_FILE`, else `config.toml`
    pub fn config_path(explicit: Option<&str>) -> String {
        select_config_path(explicit, std::env::var("CONFIG_FILE").ok())
    }

    pub fn load_from_file(config_file: &str) -> Result<Self> {
        let config = if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            toml::from_str(&contents)?
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            default_config
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.cache.max_entries == 0 {
            return Err(AppError::configuration("cache.max_entries must be > 0"));
        }
        if !(self.cache.eviction_headroom >= 1.0) {
            return Err(AppError::configuration(
                "cache.eviction_headroom must be >= 1.0",
            ));
        }
        if self.probe.default_size == 0 {
            return Err(AppError::configuration("probe.default_size must be > 0"));
        }
        if self.probe.batch_concurrency == 0 {
            return Err(AppError::configuration(
                "probe.batch_concurrency must be > 0",
            ));
        }
        for key in [&self.storage.cache_key, &self.storage.links_key] {
            if !is_valid_key(key) {
                return Err(AppError::configuration(format!(
                    "storage key '{key}' may only contain letters, digits, '-' and '_'"
                )));
            }
        }
        if self.storage.cache_key == self.storage.links_key {
            return Err(AppError::configuration(
                "storage.cache_key and storage.links_key must differ",
            ));
        }
        Ok(())
    }
}

fn select_config_path(explicit: Option<&str>, from_env: Option<String>) -> String {
    explicit
        .map(str::to_string)
        .or(from_env.filter(|path| !path.is_empty()))
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.cache.ttl, Duration::from_secs(604_800));
        assert_eq!(config.cache.max_entries, 500);
        assert_eq!(config.cache.eviction_threshold(), 600);
        assert_eq!(config.probe.default_size, 32);
        assert_eq!(config.storage.cache_key, "favicon_cache");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [cache]
            ttl = "1day"
            max_entries = 10

            [probe]
            timeout = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.cache.ttl, Duration::from_secs(86_400));
        assert_eq!(config.cache.max_entries, 10);
        assert_eq!(config.cache.eviction_threshold(), 12);
        assert_eq!(config.probe.timeout, Duration::from_secs(2));
        assert_eq!(config.probe.default_size, 32);
        assert_eq!(config.storage.links_key, "link_groups");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.cache.max_entries = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.cache.eviction_headroom = 0.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.storage.links_key = "../links".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.storage.links_key = config.storage.cache_key.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_writes_default_file_when_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let path_str = path.to_str().unwrap();

        let config = Config::load_from_file(path_str).unwrap();
        assert_eq!(config.cache.max_entries, 500);
        assert!(path.exists());

        let reloaded = Config::load_from_file(path_str).unwrap();
        assert_eq!(reloaded.cache.ttl, config.cache.ttl);
        assert_eq!(reloaded.probe.timeout, config.probe.timeout);
    }

    #[test]
    fn test_user_agent_defaults_to_package() {
        let probe = ProbeConfig::default();
        assert!(probe.user_agent().starts_with("favicon-resolver/"));

        let probe = ProbeConfig {
            user_agent: Some("custom/1.0".to_string()),
            ..ProbeConfig::default()
        };
        assert_eq!(probe.user_agent(), "custom/1.0");
    }

    #[test]
    fn test_config_path_precedence() {
        assert_eq!(
            select_config_path(Some("cli.toml"), Some("env.toml".to_string())),
            "cli.toml"
        );
        assert_eq!(
            select_config_path(None, Some("env.toml".to_string())),
            "env.toml"
        );
        assert_eq!(select_config_path(None, Some(String::new())), "config.toml");
        assert_eq!(select_config_path(None, None), "config.toml");
    }
}
