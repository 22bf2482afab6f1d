//! Port definition for decoded image caching.

use reqwest::Url;

use crate::domain::entities::Bitmap;

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Errors that can occur during cache operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// I/O error during cache operation.
    #[error("IO error: {0}")]
    IoError(String),
}

/// Port for the shared bitmap cache.
///
/// Implementations must be thread-safe: completions from different
/// surfaces read and insert concurrently without outside locking.
/// Eviction policy is the implementation's own.
pub trait ImageCachePort: Send + Sync {
    /// Returns the cached bitmap for `locator`, if any.
    fn get(&self, locator: &Url) -> Option<Bitmap>;

    /// Stores a bitmap with its approximate memory cost.
    /// Overwrites any existing entry for the same locator.
    fn insert(&self, locator: Url, image: Bitmap, cost: usize);

    /// Returns the cached bitmap without refreshing its recency or
    /// counting towards hit statistics.
    fn peek(&self, locator: &Url) -> Option<Bitmap>;

    /// Returns the current number of cached bitmaps.
    fn len(&self) -> usize;

    /// Returns true if the cache is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the summed cost of all cached bitmaps.
    fn total_cost(&self) -> usize;

    /// Drops every cached bitmap, returning how many were released.
    fn purge(&self) -> usize;
}
