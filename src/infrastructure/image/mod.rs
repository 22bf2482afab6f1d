//! Image handling infrastructure.
//!
//! This module provides:
//! - Memory caching of decoded bitmaps with count and cost limits
//! - Disk caching of raw HTTP responses
//! - A reqwest-backed fetcher and an `image`-backed decoder

pub mod decoder;
pub mod disk_cache;
pub mod http_fetcher;
pub mod memory_cache;

pub use decoder::RasterDecoder;
pub use disk_cache::DiskResponseCache;
pub use http_fetcher::ReqwestFetcher;
pub use memory_cache::{CacheStats, MemoryImageCache};
