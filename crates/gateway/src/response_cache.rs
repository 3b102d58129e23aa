//! Bounded response cache.

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use intentlens_core::{
    traits::ResponseCache,
    types::{CacheEntry, Fingerprint},
    Result,
};

/// In-memory response cache with least-recently-used eviction.
pub struct LruResponseCache {
    entries: Mutex<LruCache<Fingerprint, CacheEntry>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LruResponseCache {
    const DEFAULT_CAPACITY: usize = 1024;

    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            capacity: capacity.get(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for LruResponseCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

#[async_trait]
impl ResponseCache for LruResponseCache {
    async fn get(&self, key: &Fingerprint) -> Result<Option<CacheEntry>> {
        let found = self.entries.lock().get(key).cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        Ok(found)
    }

    async fn set(&self, key: &Fingerprint, entry: CacheEntry) -> Result<()> {
        let evicted = self.entries.lock().push(key.clone(), entry);
        if let Some((old_key, _)) = evicted {
            if &old_key == key {
                tracing::debug!(fingerprint = %key.short(), "Cache entry overwritten");
            } else {
                tracing::debug!(
                    evicted = %old_key.short(),
                    capacity = self.capacity,
                    "Evicted least recently used cache entry"
                );
            }
        }
        Ok(())
    }
}
