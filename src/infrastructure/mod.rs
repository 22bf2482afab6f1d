//! Infrastructure layer with adapters for external facilities.

/// Application configuration.
pub mod config;
/// Image handling (caching, fetching, decoding).
pub mod image;

pub use config::{AppConfig, CliArgs, ConfigError, ConfigFile, LogLevel};
pub use image::{CacheStats, DiskResponseCache, MemoryImageCache, RasterDecoder, ReqwestFetcher};
