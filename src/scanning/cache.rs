//! Time-boxed page content cache
//!
//! Fetched page bodies are kept per request URL for a fixed TTL. Stale
//! entries are evicted lazily on read and can be swept proactively; the
//! cache is also bounded so the least recently used entry is dropped
//! when it is full.

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::time::Instant;

/// Default time-to-live for cached pages
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Default maximum number of cached pages
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// A cached page body
#[derive(Debug, Clone)]
struct CacheEntry {
    content: String,
    stored_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// Shared page cache keyed by the exact request URL
#[derive(Debug)]
pub struct ContentCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

/// Age of a single cached page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntryInfo {
    pub url: String,
    pub age: Duration,
}

/// Point-in-time view of the cache
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub ttl: Duration,
    pub entries: Vec<CacheEntryInfo>,
}

impl ContentCache {
    /// Create a cache with the given TTL and capacity (minimum 1)
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh content for `url`, evicting the entry if it has expired
    pub fn get(&self, url: &str) -> Option<String> {
        let mut entries = self.entries.lock();
        let lookup = entries
            .get(url)
            .map(|entry| entry.is_fresh(self.ttl).then(|| entry.content.clone()));

        match lookup {
            Some(Some(content)) => Some(content),
            Some(None) => {
                entries.pop(url);
                tracing::debug!("Evicted stale cache entry for {}", url);
                None
            }
            None => None,
        }
    }

    /// Store content for `url`, stamped with the current time
    pub fn insert(&self, url: impl Into<String>, content: impl Into<String>) {
        let entry = CacheEntry {
            content: content.into(),
            stored_at: Instant::now(),
        };
        self.entries.lock().put(url.into(), entry);
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Evict every expired entry, returning how many were removed
    pub fn sweep_expired(&self) -> usize {
        let mut entries = self.entries.lock();
        let stale: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| !entry.is_fresh(self.ttl))
            .map(|(url, _)| url.clone())
            .collect();

        for url in &stale {
            entries.pop(url);
        }

        if !stale.is_empty() {
            tracing::debug!("Swept {} expired cache entries", stale.len());
        }
        stale.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Entry count and per-entry ages, most recently used first
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        CacheStats {
            size: entries.len(),
            capacity: entries.cap().get(),
            ttl: self.ttl,
            entries: entries
                .iter()
                .map(|(url, entry)| CacheEntryInfo {
                    url: url.clone(),
                    age: entry.stored_at.elapsed(),
                })
                .collect(),
        }
    }
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL, DEFAULT_CACHE_CAPACITY)
    }
}
