//! Cache backend trait and usage statistics.

use async_trait::async_trait;
use openmusic_core::CacheError;
use std::sync::atomic::{AtomicU64, Ordering};

use super::lookup::CacheLookup;

/// Result type for cache backend operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache backend trait for pluggable key-value stores.
///
/// Implementations store opaque serialized strings and must be safe to share
/// across concurrent tasks. Eviction and expiry are the backend's own
/// business; callers never rely on them for correctness.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Look up a key.
    async fn get(&self, key: &str) -> CacheLookup;

    /// Store a serialized value under a key, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> CacheResult<()>;

    /// Remove a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> CacheResult<()>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served from the cache.
    pub hits: u64,
    /// Reads that found no usable entry.
    pub misses: u64,
    /// Lookups that failed and fell back to the store.
    pub lookup_errors: u64,
    /// Read-through population attempts that failed.
    pub populate_failures: u64,
    /// Keys deleted after a mutation.
    pub invalidations: u64,
    /// Deletions that failed, leaving a possibly stale entry.
    pub invalidation_failures: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0) over all lookups.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.lookup_errors;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Lock-free counters behind [`CacheStats`].
#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    lookup_errors: AtomicU64,
    populate_failures: AtomicU64,
    invalidations: AtomicU64,
    invalidation_failures: AtomicU64,
}

impl CacheCounters {
    pub(crate) fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn lookup_error(&self) {
        self.lookup_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn populate_failure(&self) {
        self.populate_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn invalidation_failure(&self) {
        self.invalidation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            lookup_errors: self.lookup_errors.load(Ordering::Relaxed),
            populate_failures: self.populate_failures.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            invalidation_failures: self.invalidation_failures.load(Ordering::Relaxed),
        }
    }
}
