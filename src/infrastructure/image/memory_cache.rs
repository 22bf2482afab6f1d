//! In-memory LRU bitmap cache bounded by entry count and total cost.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use reqwest::Url;
use tracing::{debug, trace};

use crate::domain::entities::Bitmap;
use crate::domain::ports::ImageCachePort;

/// Default maximum number of bitmaps to keep.
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Default maximum summed cost (64 MiB of decoded pixels).
pub const DEFAULT_MAX_TOTAL_COST: usize = 64 * 1024 * 1024;

struct CachedBitmap {
    image: Bitmap,
    cost: usize,
}

struct CacheInner {
    entries: LruCache<Url, CachedBitmap>,
    total_cost: usize,
}

/// In-memory LRU cache for decoded bitmaps.
/// Thread-safe; one instance is shared by every surface.
pub struct MemoryImageCache {
    inner: Mutex<CacheInner>,
    max_total_cost: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryImageCache {
    /// Creates a cache bounded by `max_entries` and `max_total_cost`.
    #[must_use]
    pub fn new(max_entries: usize, max_total_cost: usize) -> Self {
        let cap = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(CacheInner {
                entries: LruCache::new(cap),
                total_cost: 0,
            }),
            max_total_cost,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Creates a cache with the default limits.
    #[must_use]
    pub fn with_default_limits() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES, DEFAULT_MAX_TOTAL_COST)
    }

    /// Returns cache statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        let inner = self.inner.lock();
        CacheStats {
            hits,
            misses,
            hit_rate,
            size: inner.entries.len(),
            total_cost: inner.total_cost,
        }
    }
}

impl Default for MemoryImageCache {
    fn default() -> Self {
        Self::with_default_limits()
    }
}

impl std::fmt::Debug for MemoryImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryImageCache")
            .field("max_total_cost", &self.max_total_cost)
            .finish_non_exhaustive()
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    /// Current number of cached bitmaps.
    pub size: usize,
    /// Summed cost of cached bitmaps in bytes.
    pub total_cost: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {} images ({} bytes), {:.1}% hit rate ({} hits, {} misses)",
            self.size, self.total_cost, self.hit_rate, self.hits, self.misses
        )
    }
}

impl ImageCachePort for MemoryImageCache {
    fn get(&self, locator: &Url) -> Option<Bitmap> {
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.entries.get(locator) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(url = %locator, "Memory cache hit");
            Some(entry.image.clone())
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(url = %locator, "Memory cache miss");
            None
        }
    }

    fn insert(&self, locator: Url, image: Bitmap, cost: usize) {
        if cost > self.max_total_cost {
            debug!(url = %locator, cost, "Bitmap exceeds cache cost limit, not cached");
            return;
        }

        let mut inner = self.inner.lock();
        inner.total_cost += cost;
        debug!(url = %locator, cost, "Storing bitmap in memory cache");
        if let Some((_, displaced)) = inner.entries.push(locator, CachedBitmap { image, cost }) {
            inner.total_cost -= displaced.cost;
        }

        while inner.total_cost > self.max_total_cost {
            let Some((evicted, entry)) = inner.entries.pop_lru() else {
                break;
            };
            inner.total_cost -= entry.cost;
            trace!(url = %evicted, cost = entry.cost, "Evicted bitmap over cost limit");
        }
    }

    fn peek(&self, locator: &Url) -> Option<Bitmap> {
        let inner = self.inner.lock();
        inner.entries.peek(locator).map(|entry| entry.image.clone())
    }

    fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    fn total_cost(&self) -> usize {
        self.inner.lock().total_cost
    }

    fn purge(&self) -> usize {
        let mut inner = self.inner.lock();
        let count = inner.entries.len();
        let freed = inner.total_cost;
        inner.entries.clear();
        inner.total_cost = 0;
        debug!(count, freed, "Purged memory image cache");
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn url(s: &str) -> Url {
        Url::parse(&format!("https://example.com/{s}.png")).unwrap()
    }

    fn bitmap() -> Bitmap {
        Arc::new(image::DynamicImage::new_rgb8(10, 10))
    }

    #[test]
    fn test_cache_insert_and_get() {
        let cache = MemoryImageCache::new(10, 1024);
        let img = Arc::new(image::DynamicImage::new_rgb8(100, 100));

        cache.insert(url("a"), img, 300);
        let retrieved = cache.get(&url("a"));

        assert!(retrieved.is_some());
        assert_eq!(retrieved.unwrap().width(), 100);
        assert_eq!(cache.total_cost(), 300);
    }

    #[test]
    fn test_cache_miss() {
        let cache = MemoryImageCache::with_default_limits();
        assert!(cache.get(&url("missing")).is_none());
    }

    #[test]
    fn test_count_eviction() {
        let cache = MemoryImageCache::new(2, 1024);

        cache.insert(url("1"), bitmap(), 10);
        cache.insert(url("2"), bitmap(), 10);
        cache.insert(url("3"), bitmap(), 10);

        // 1 should be evicted (LRU)
        assert!(cache.get(&url("1")).is_none());
        assert!(cache.get(&url("2")).is_some());
        assert!(cache.get(&url("3")).is_some());
        assert_eq!(cache.total_cost(), 20);
    }

    #[test]
    fn test_cost_eviction() {
        let cache = MemoryImageCache::new(10, 100);

        cache.insert(url("1"), bitmap(), 40);
        cache.insert(url("2"), bitmap(), 40);
        cache.insert(url("3"), bitmap(), 40);

        assert_eq!(cache.len(), 2);
        assert!(cache.peek(&url("1")).is_none());
        assert_eq!(cache.total_cost(), 80);
    }

    #[test]
    fn test_oversized_entry_not_cached() {
        let cache = MemoryImageCache::new(10, 100);
        cache.insert(url("huge"), bitmap(), 101);
        assert!(cache.is_empty());
        assert_eq!(cache.total_cost(), 0);
    }

    #[test]
    fn test_insert_overwrites() {
        let cache = MemoryImageCache::new(10, 1000);
        cache.insert(url("a"), bitmap(), 100);
        cache.insert(url("a"), Arc::new(image::DynamicImage::new_rgb8(2, 2)), 12);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.total_cost(), 12);
        assert_eq!(cache.get(&url("a")).unwrap().width(), 2);
    }

    #[test]
    fn test_cache_stats() {
        let cache = MemoryImageCache::new(10, 1000);
        cache.insert(url("a"), bitmap(), 30);

        // Hit
        let _ = cache.get(&url("a"));
        // Miss
        let _ = cache.get(&url("missing"));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert_eq!(stats.total_cost, 30);
    }

    #[test]
    fn test_peek_does_not_promote() {
        let cache = MemoryImageCache::new(2, 1000);

        cache.insert(url("1"), bitmap(), 1);
        cache.insert(url("2"), bitmap(), 1);

        // Peek at 1 (should not promote it)
        let _ = cache.peek(&url("1"));

        cache.insert(url("3"), bitmap(), 1);

        assert!(cache.peek(&url("1")).is_none());
    }

    #[test]
    fn test_purge_releases_everything() {
        let cache = MemoryImageCache::new(10, 1000);
        cache.insert(url("a"), bitmap(), 5);
        cache.insert(url("b"), bitmap(), 7);

        assert_eq!(cache.purge(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.total_cost(), 0);
        assert_eq!(cache.purge(), 0);
    }

    #[test]
    fn test_peek_skips_stats() {
        let cache = MemoryImageCache::new(10, 1000);
        cache.insert(url("a"), bitmap(), 5);

        assert!(cache.peek(&url("a")).is_some());
        assert!(cache.peek(&url("missing")).is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_concurrent_inserts() {
        let cache = Arc::new(MemoryImageCache::new(1000, usize::MAX));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        cache.insert(url(&format!("{t}-{i}")), bitmap(), 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 400);
        assert_eq!(cache.total_cost(), 400);
    }
}
