//! The bounded in-memory object cache (spec.md §5).
//!
//! Backed by [`lru::LruCache`], which is simultaneously a hash index keyed
//! by exact request URL and an intrusive recency list — exactly the
//! structure spec.md §9 recommends layering a hash index on top of. `get`
//! promotes an entry to most-recently-used; `peek`/`pop` do not. Eviction
//! walks from the LRU end until the running byte total fits
//! `MAX_CACHE_SIZE`, mirroring the subtract-then-evict-while-over-budget
//! loop in the teacher's `ProxyCache::put`.

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use lru::LruCache;
use tokio::sync::Mutex;

/// Largest single response body the cache will admit (spec.md §2).
pub const MAX_OBJECT_SIZE: usize = 102_400;
/// Total body bytes the cache may hold across all entries (spec.md §2).
pub const MAX_CACHE_SIZE: usize = 1_049_000;

/// A cached response: the byte-exact header-plus-body buffer produced by
/// `fetcher::fetch`, split at `header_len` so the cache can account body
/// bytes against `MAX_CACHE_SIZE` without re-parsing on every hit.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Bytes,
    pub header_len: usize,
    pub body_len: usize,
}

impl Artifact {
    pub fn new(bytes: Bytes, header_len: usize) -> Self {
        let body_len = bytes.len().saturating_sub(header_len);
        Self {
            bytes,
            header_len,
            body_len,
        }
    }
}

/// Advisory counters exposed for logging; never consulted for correctness.
#[derive(Debug, Default, Clone, Copy)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
    pub bytes_cached: usize,
    pub entries: usize,
}

struct Inner {
    store: LruCache<String, Artifact>,
    bytes_used: usize,
}

pub struct ProxyCache {
    inner: Mutex<Inner>,
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
    evictions: AtomicU64,
}

impl ProxyCache {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                store: LruCache::unbounded(),
                bytes_used: 0,
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            insertions: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Exact-URL lookup. A hit promotes the entry to most-recently-used.
    pub async fn lookup(&self, url: &str) -> Option<Artifact> {
        let mut inner = self.inner.lock().await;
        let hit = inner.store.get(url).cloned();
        if hit.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    /// Insert (or idempotently overwrite) the artifact for `url`.
    ///
    /// Oversize bodies (`body_len > MAX_OBJECT_SIZE`) are silently rejected.
    /// A duplicate URL is treated as a fresh insert: the old artifact's
    /// bytes are subtracted from the budget before the new one is admitted,
    /// so a race between two fetches for the same URL converges on
    /// whichever write lands last rather than double-counting.
    pub async fn insert(&self, url: String, artifact: Artifact) {
        if artifact.body_len > MAX_OBJECT_SIZE {
            return;
        }

        let mut inner = self.inner.lock().await;

        if let Some(old) = inner.store.pop(&url) {
            inner.bytes_used = inner.bytes_used.saturating_sub(old.body_len);
        }

        while inner.bytes_used + artifact.body_len > MAX_CACHE_SIZE {
            match inner.store.pop_lru() {
                Some((_, evicted)) => {
                    inner.bytes_used = inner.bytes_used.saturating_sub(evicted.body_len);
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                }
                None => break,
            }
        }

        inner.bytes_used += artifact.body_len;
        inner.store.put(url, artifact);
        self.insertions.fetch_add(1, Ordering::Relaxed);
    }

    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().await;
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            insertions: self.insertions.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            bytes_cached: inner.bytes_used,
            entries: inner.store.len(),
        }
    }
}

impl Default for ProxyCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl ProxyCache {
    /// Recompute the byte budget from scratch and assert it matches the
    /// running total — used by tests, never by the serving path.
    pub async fn assert_consistent(&self) {
        let inner = self.inner.lock().await;
        let sum: usize = inner.store.iter().map(|(_, a)| a.body_len).sum();
        assert_eq!(sum, inner.bytes_used, "bytes_used drifted from entry sum");
        assert!(inner.bytes_used <= MAX_CACHE_SIZE, "budget exceeded");
    }
}
