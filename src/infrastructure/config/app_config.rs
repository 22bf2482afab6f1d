//! Application configuration.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::CoordinatorConfig;
use crate::domain::ports::CachePolicy;
use crate::infrastructure::image::{disk_cache, memory_cache};

pub(crate) const APP_NAME: &str = "remote-image-loader";
pub(crate) const APP_QUALIFIER: &str = "com";
pub(crate) const APP_ORGANIZATION: &str = "linuxmobile";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Fetch behavior.
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Decoded bitmap cache limits.
    #[serde(default)]
    pub memory_cache: MemoryCacheConfig,

    /// HTTP response cache settings.
    #[serde(default)]
    pub http_cache: HttpCacheConfig,
}

/// Fetch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Bypass the HTTP response cache for every fetch.
    #[serde(default)]
    pub ignore_http_cache: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            ignore_http_cache: false,
        }
    }
}

impl LoaderConfig {
    /// Builds the coordinator configuration.
    #[must_use]
    pub const fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            cache_policy: if self.ignore_http_cache {
                CachePolicy::ReloadIgnoringCache
            } else {
                CachePolicy::ReturnCacheDataElseLoad
            },
        }
    }
}

/// Memory cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCacheConfig {
    /// Maximum number of decoded bitmaps.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Maximum summed bitmap cost in bytes.
    #[serde(default = "default_max_total_cost")]
    pub max_total_cost: usize,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            max_total_cost: default_max_total_cost(),
        }
    }
}

/// HTTP response cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpCacheConfig {
    /// Enable the disk response cache.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cache directory. Defaults to the platform cache dir.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Maximum disk usage in bytes.
    #[serde(default = "default_http_cache_bytes")]
    pub max_bytes: u64,
}

impl Default for HttpCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None,
            max_bytes: default_http_cache_bytes(),
        }
    }
}

impl HttpCacheConfig {
    /// Returns the configured directory or the platform default.
    #[must_use]
    pub fn effective_directory(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(default_http_cache_dir)
    }
}

fn default_true() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_max_entries() -> usize {
    memory_cache::DEFAULT_MAX_ENTRIES
}

fn default_max_total_cost() -> usize {
    memory_cache::DEFAULT_MAX_TOTAL_COST
}

fn default_http_cache_bytes() -> u64 {
    disk_cache::DEFAULT_MAX_CACHE_SIZE
}

fn default_http_cache_dir() -> PathBuf {
    ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME).map_or_else(
        || std::env::temp_dir().join(APP_NAME).join("http"),
        |dirs| dirs.cache_dir().join("http"),
    )
}

use super::args::CliArgs;

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(timeout) = args.timeout {
            self.loader.request_timeout_secs = timeout;
        }
        if args.no_http_cache {
            self.http_cache.enabled = false;
        }
        if let Some(max_entries) = args.max_cached_images {
            self.memory_cache.max_entries = max_entries;
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            log_level: LogLevel::Info,
            loader: LoaderConfig::default(),
            memory_cache: MemoryCacheConfig::default(),
            http_cache: HttpCacheConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_partial_config() {
        let toml_content = r#"
            log_level = "debug"

            [loader]
            request_timeout_secs = 3

            [http_cache]
            enabled = false
        "#;

        let config: AppConfig = toml::from_str(toml_content).expect("Failed to parse config");

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.loader.request_timeout_secs, 3);
        assert!(!config.http_cache.enabled);
        assert_eq!(
            config.memory_cache.max_entries,
            memory_cache::DEFAULT_MAX_ENTRIES
        );
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.loader.request_timeout_secs, 10);
        assert!(config.http_cache.enabled); // default_true
        let coordinator = config.loader.coordinator_config();
        assert_eq!(coordinator.request_timeout, Duration::from_secs(10));
        assert_eq!(coordinator.cache_policy, CachePolicy::ReturnCacheDataElseLoad);
    }

    #[test]
    fn test_ignore_http_cache_policy() {
        let loader = LoaderConfig {
            request_timeout_secs: 5,
            ignore_http_cache: true,
        };
        assert_eq!(
            loader.coordinator_config().cache_policy,
            CachePolicy::ReloadIgnoringCache
        );
    }

    #[test]
    fn test_merge_with_args() {
        let args = CliArgs::parse_from([
            "remote-image-loader",
            "--timeout",
            "4",
            "--no-http-cache",
            "--log-level",
            "warn",
            "https://example.com/a.png",
        ]);
        let mut config = AppConfig::default();
        config.merge_with_args(&args);

        assert_eq!(config.loader.request_timeout_secs, 4);
        assert!(!config.http_cache.enabled);
        assert_eq!(config.log_level, LogLevel::Warn);
    }
}
