//! Configuration layer: typed settings with layered precedence (file → env).

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const ENV_PREFIX: &str = "LUMINA";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_CACHE_TTL_SECS: u64 = 600;
const DEFAULT_BUCKET: &str = "lumina-media";
const DEFAULT_PUBLIC_BASE_URL: &str = "https://lumina-media.objects.example.com";
const DEFAULT_JPEG_QUALITY: u8 = 85;
const DEFAULT_DOWNLOADS_TABLE: &str = "downloads";
const DEFAULT_PROVISION_POLL_ATTEMPTS: u32 = 20;
const DEFAULT_PROVISION_POLL_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

/// Root settings for the data-access core.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub tables: TableSettings,
    pub cache: CacheSettings,
    pub media: MediaSettings,
    pub downloads: DownloadLogSettings,
    pub logging: LoggingSettings,
}

impl CoreConfig {
    /// Load settings from an optional TOML file, then apply `LUMINA_`-prefixed
    /// environment overrides (`__` as section separator).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

/// Names of the standing entity tables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    pub users: String,
    pub images: String,
    pub tag_index: String,
    pub likes: String,
    pub follows: String,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            users: "users".to_string(),
            images: "images".to_string(),
            tag_index: "tag_index".to_string(),
            likes: "likes".to_string(),
            follows: "follows".to_string(),
        }
    }
}

/// Entity cache tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Fixed lifetime of every cache entry, in seconds.
    pub ttl_secs: u64,
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

/// Media bucket identity and variant encoding.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaSettings {
    pub bucket: String,
    /// Base under which stored object keys resolve publicly.
    pub public_base_url: String,
    pub jpeg_quality: u8,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Download log table name and provisioning poll bounds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadLogSettings {
    pub table: String,
    pub provision_poll_attempts: u32,
    pub provision_poll_interval_ms: u64,
}

impl DownloadLogSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.provision_poll_interval_ms)
    }
}

impl Default for DownloadLogSettings {
    fn default() -> Self {
        Self {
            table: DEFAULT_DOWNLOADS_TABLE.to_string(),
            provision_poll_attempts: DEFAULT_PROVISION_POLL_ATTEMPTS,
            provision_poll_interval_ms: DEFAULT_PROVISION_POLL_INTERVAL_MS,
        }
    }
}

/// Log level and output shape for [`crate::infra::telemetry::init`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl LoggingSettings {
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(&self.level).unwrap_or(LevelFilter::INFO)
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_section() {
        let config = CoreConfig::default();
        assert_eq!(config.tables.users, "users");
        assert_eq!(config.tables.tag_index, "tag_index");
        assert_eq!(config.cache.ttl(), Duration::from_secs(600));
        assert_eq!(config.media.jpeg_quality, 85);
        assert_eq!(config.downloads.table, "downloads");
        assert_eq!(config.downloads.provision_poll_attempts, 20);
        assert_eq!(config.logging.level_filter(), LevelFilter::INFO);
    }

    #[test]
    fn load_without_file_yields_defaults() {
        let config = CoreConfig::load(None).expect("load");
        assert_eq!(config.tables.images, "images");
        assert_eq!(
            config.downloads.poll_interval(),
            Duration::from_millis(1000)
        );
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let logging = LoggingSettings {
            level: "chatty".to_string(),
            json: true,
        };
        assert_eq!(logging.level_filter(), LevelFilter::INFO);
    }
}
