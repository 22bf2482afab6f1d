//! Disk-backed HTTP response cache.
//!
//! Each response lives in one file named after the URL digest: a header
//! line with the status and content type, then the raw body. Sizes and
//! last use are tracked in an in-memory index built when the cache is
//! opened, so eviction does not depend on filesystem access times.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::Url;
use tokio::fs;
use tracing::{debug, trace, warn};

use crate::domain::entities::locator_digest;
use crate::domain::ports::{CacheError, CacheResult, FetchResponse};

/// Maximum disk cache size in bytes (100 MB default).
pub const DEFAULT_MAX_CACHE_SIZE: u64 = 100 * 1024 * 1024;

const ENTRY_EXTENSION: &str = "resp";
const STAGING_EXTENSION: &str = "part";

#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    size: u64,
    last_used: u64,
}

#[derive(Debug, Default)]
struct Index {
    entries: HashMap<String, IndexEntry>,
    bytes: u64,
    clock: u64,
}

impl Index {
    fn touch(&mut self, key: &str) {
        self.clock += 1;
        let clock = self.clock;
        if let Some(entry) = self.entries.get_mut(key) {
            entry.last_used = clock;
        }
    }

    fn record(&mut self, key: String, size: u64) {
        self.clock += 1;
        let entry = IndexEntry {
            size,
            last_used: self.clock,
        };
        if let Some(previous) = self.entries.insert(key, entry) {
            self.bytes -= previous.size;
        }
        self.bytes += size;
    }

    fn forget(&mut self, key: &str) {
        if let Some(entry) = self.entries.remove(key) {
            self.bytes -= entry.size;
        }
    }

    /// Drops least recently used entries until `limit` is met.
    fn shrink_to(&mut self, limit: u64) -> Vec<String> {
        if self.bytes <= limit {
            return Vec::new();
        }
        let mut by_age: Vec<(String, IndexEntry)> =
            self.entries.iter().map(|(k, e)| (k.clone(), *e)).collect();
        by_age.sort_by_key(|(_, entry)| entry.last_used);

        let mut victims = Vec::new();
        for (key, entry) in by_age {
            if self.bytes <= limit {
                break;
            }
            self.entries.remove(&key);
            self.bytes -= entry.size;
            victims.push(key);
        }
        victims
    }
}

/// Size-bounded directory of cached HTTP responses.
#[derive(Debug)]
pub struct DiskResponseCache {
    dir: PathBuf,
    max_bytes: u64,
    index: Mutex<Index>,
}

impl DiskResponseCache {
    /// Opens (creating if needed) the cache rooted at `dir`.
    ///
    /// Existing entries are indexed oldest-modified first; leftovers from
    /// interrupted writes are deleted.
    ///
    /// # Errors
    /// Returns error if the directory cannot be created or listed.
    pub async fn open(dir: PathBuf, max_bytes: u64) -> CacheResult<Self> {
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error("create cache dir", &dir, &e))?;
        let mut listing = fs::read_dir(&dir)
            .await
            .map_err(|e| io_error("list cache dir", &dir, &e))?;

        let mut found = Vec::new();
        while let Ok(Some(item)) = listing.next_entry().await {
            let path = item.path();
            match path.extension().and_then(|ext| ext.to_str()) {
                Some(STAGING_EXTENSION) => {
                    let _ = fs::remove_file(&path).await;
                }
                Some(ENTRY_EXTENSION) => {
                    let (Some(key), Ok(meta)) = (entry_key(&path), item.metadata().await) else {
                        continue;
                    };
                    let modified = meta.modified().unwrap_or(std::time::UNIX_EPOCH);
                    found.push((modified, key, meta.len()));
                }
                _ => {}
            }
        }
        found.sort();

        let mut index = Index::default();
        for (_, key, size) in found {
            index.record(key, size);
        }
        debug!(
            dir = %dir.display(),
            entries = index.entries.len(),
            bytes = index.bytes,
            "Opened HTTP response cache"
        );

        let cache = Self {
            dir,
            max_bytes,
            index: Mutex::new(index),
        };
        cache.enforce_limit().await;
        Ok(cache)
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{ENTRY_EXTENSION}"))
    }

    /// Returns the stored response for `url`, marked as served from cache.
    ///
    /// Entries that no longer parse are dropped.
    pub async fn get(&self, url: &Url) -> Option<FetchResponse> {
        let key = locator_digest(url);
        let path = self.entry_path(&key);
        let Ok(raw) = fs::read(&path).await else {
            trace!(url = %url, "Response cache miss");
            return None;
        };

        let Some(response) = decode_entry(Bytes::from(raw)) else {
            warn!(path = %path.display(), "Discarding corrupt response cache entry");
            self.index.lock().forget(&key);
            let _ = fs::remove_file(&path).await;
            return None;
        };

        self.index.lock().touch(&key);
        trace!(url = %url, status = ?response.status, "Response cache hit");
        Some(response)
    }

    /// Stores `response` for `url`, replacing any previous entry.
    ///
    /// Responses without a status or larger than the whole cache are
    /// skipped.
    ///
    /// # Errors
    /// Returns error if the entry cannot be written.
    pub async fn put(&self, url: &Url, response: &FetchResponse) -> CacheResult<()> {
        let Some(encoded) = encode_entry(response) else {
            return Ok(());
        };
        let size = encoded.len() as u64;
        if size > self.max_bytes {
            debug!(url = %url, size, "Response larger than disk cache, not stored");
            return Ok(());
        }

        let key = locator_digest(url);
        let path = self.entry_path(&key);
        let staging = path.with_extension(STAGING_EXTENSION);
        fs::write(&staging, &encoded)
            .await
            .map_err(|e| io_error("write cache entry", &staging, &e))?;
        fs::rename(&staging, &path)
            .await
            .map_err(|e| io_error("commit cache entry", &path, &e))?;

        self.index.lock().record(key, size);
        debug!(url = %url, size, "Stored response in disk cache");

        self.enforce_limit().await;
        Ok(())
    }

    /// Deletes every entry.
    ///
    /// # Errors
    /// Returns error if an entry cannot be removed.
    pub async fn clear(&self) -> CacheResult<()> {
        let keys: Vec<String> = {
            let mut index = self.index.lock();
            index.bytes = 0;
            index.entries.drain().map(|(key, _)| key).collect()
        };
        let count = keys.len();
        for key in keys {
            let path = self.entry_path(&key);
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(io_error("remove cache entry", &path, &e)),
            }
        }
        debug!(count, "Cleared HTTP response cache");
        Ok(())
    }

    /// Returns the bytes used by stored entries.
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.index.lock().bytes
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.lock().entries.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn enforce_limit(&self) {
        let victims = self.index.lock().shrink_to(self.max_bytes);
        if victims.is_empty() {
            return;
        }
        let count = victims.len();
        for key in victims {
            let path = self.entry_path(&key);
            if let Err(e) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "Failed to evict cache entry");
            }
        }
        debug!(count, bytes = self.current_size(), "Evicted least recently used responses");
    }
}

fn io_error(action: &str, path: &Path, error: &std::io::Error) -> CacheError {
    CacheError::IoError(format!("{action} {}: {error}", path.display()))
}

fn entry_key(path: &Path) -> Option<String> {
    path.file_stem()?.to_str().map(String::from)
}

/// Header line `<status>\t<content type>\n` followed by the body.
fn encode_entry(response: &FetchResponse) -> Option<Vec<u8>> {
    let status = response.status?;
    let content_type = response.content_type.as_deref().unwrap_or("");
    if content_type.contains(['\t', '\n']) {
        return None;
    }
    let header = format!("{status}\t{content_type}\n");
    let mut out = Vec::with_capacity(header.len() + response.body.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(&response.body);
    Some(out)
}

fn decode_entry(raw: Bytes) -> Option<FetchResponse> {
    let newline = raw.iter().position(|&b| b == b'\n')?;
    let header = std::str::from_utf8(&raw[..newline]).ok()?;
    let (status, content_type) = header.split_once('\t')?;
    let status = status.parse::<u16>().ok()?;

    let mut response = FetchResponse::new(status, raw.slice(newline + 1..));
    if !content_type.is_empty() {
        response = response.with_content_type(content_type);
    }
    response.from_cache = true;
    Some(response)
}
