//! Read-through cache.
//!
//! Reads try the cache first and fall back to a caller-supplied loader that
//! queries the store. Writes never go through here; the repository mutates
//! the store and then asks this type to drop the keys the mutation made
//! stale.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use openmusic_core::{CacheError, OpenMusicResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::invalidation::Mutation;
use super::keys::CacheKey;
use super::lookup::{CacheLookup, CacheRead};
use super::traits::{CacheBackend, CacheCounters, CacheResult, CacheStats};

/// Configuration for the read-through cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Upper bound on a single cache operation. Slower operations count as
    /// cache failures.
    pub op_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            op_timeout: Duration::from_millis(250),
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache config from environment variables.
    ///
    /// - `OPENMUSIC_CACHE_TIMEOUT_MS`: per-operation timeout (default: 250)
    pub fn from_env() -> Self {
        let op_timeout = std::env::var("OPENMUSIC_CACHE_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or_else(|| Self::default().op_timeout);
        Self { op_timeout }
    }

    /// Set the per-operation timeout.
    pub fn with_op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = timeout;
        self
    }
}

/// Read-through cache over a [`CacheBackend`].
///
/// Cache failures never escape: lookups degrade to the loader, population
/// and invalidation failures are logged and counted in [`CacheStats`].
pub struct ReadThroughCache<C>
where
    C: CacheBackend,
{
    backend: Arc<C>,
    config: CacheConfig,
    counters: Arc<CacheCounters>,
}

impl<C> ReadThroughCache<C>
where
    C: CacheBackend,
{
    /// Create a new read-through cache.
    pub fn new(backend: Arc<C>, config: CacheConfig) -> Self {
        Self {
            backend,
            config,
            counters: Arc::new(CacheCounters::default()),
        }
    }

    /// Create a new read-through cache with default configuration.
    pub fn with_defaults(backend: Arc<C>) -> Self {
        Self::new(backend, CacheConfig::default())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn backend(&self) -> &C {
        &self.backend
    }

    /// Snapshot of the usage counters.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    /// Read `key`, loading from the store on a miss.
    ///
    /// - `Hit` with a decodable value: returned, tagged as cached.
    /// - `Miss`, or a hit that fails to decode: `loader` runs, its result
    ///   is written back, and the value is returned tagged as not cached.
    /// - `Error`: `loader` runs and nothing is written back.
    ///
    /// Only loader errors are returned; a failed write-back does not fail
    /// the read.
    pub async fn read<T, F, Fut>(&self, key: &CacheKey, loader: F) -> OpenMusicResult<CacheRead<T>>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = OpenMusicResult<T>> + Send,
    {
        let encoded = key.encode();

        let populate = match self.lookup(&encoded).await {
            CacheLookup::Hit(raw) => match decode_entry::<T>(&encoded, &raw) {
                Ok(value) => {
                    self.counters.hit();
                    tracing::debug!(key = %encoded, "cache hit");
                    return Ok(CacheRead::from_cache(value));
                }
                Err(err) => {
                    self.counters.miss();
                    tracing::warn!(error = %err, "discarding undecodable cache entry");
                    true
                }
            },
            CacheLookup::Miss => {
                self.counters.miss();
                tracing::debug!(key = %encoded, "cache miss");
                true
            }
            CacheLookup::Error(err) => {
                self.counters.lookup_error();
                tracing::warn!(key = %encoded, error = %err, "cache lookup failed, reading from store");
                false
            }
        };

        let value = loader().await?;

        if populate {
            self.populate(&encoded, &value).await;
        }

        Ok(CacheRead::from_store(value))
    }

    /// Delete every key `mutation` made stale.
    ///
    /// Each key is attempted independently. Returns the number of keys that
    /// could not be deleted; callers treat that as an accepted staleness
    /// window, not as a failure of the mutation.
    pub async fn invalidate(&self, mutation: &Mutation) -> usize {
        let mut failed = 0;
        for key in mutation.stale_keys() {
            let encoded = key.encode();
            match self.delete(&encoded).await {
                Ok(()) => {
                    self.counters.invalidation();
                    tracing::debug!(key = %encoded, ?mutation, "invalidated cache key");
                }
                Err(err) => {
                    failed += 1;
                    self.counters.invalidation_failure();
                    tracing::warn!(
                        key = %encoded,
                        album_id = %mutation.album_id(),
                        ?mutation,
                        error = %err,
                        "cache invalidation failed, entry may be stale"
                    );
                }
            }
        }
        failed
    }

    /// Check that the backend answers within the configured timeout.
    pub async fn ping(&self) -> CacheResult<()> {
        match tokio::time::timeout(self.config.op_timeout, self.backend.ping()).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout {
                key: "PING".to_string(),
            }),
        }
    }

    async fn lookup(&self, key: &str) -> CacheLookup {
        match tokio::time::timeout(self.config.op_timeout, self.backend.get(key)).await {
            Ok(lookup) => lookup,
            Err(_) => CacheLookup::Error(CacheError::Timeout {
                key: key.to_string(),
            }),
        }
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        match tokio::time::timeout(self.config.op_timeout, self.backend.delete(key)).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout {
                key: key.to_string(),
            }),
        }
    }

    async fn populate<T: Serialize>(&self, key: &str, value: &T) {
        let result = match encode_entry(key, value) {
            Ok(raw) => {
                match tokio::time::timeout(self.config.op_timeout, self.backend.set(key, &raw)).await {
                    Ok(result) => result,
                    Err(_) => Err(CacheError::Timeout {
                        key: key.to_string(),
                    }),
                }
            }
            Err(err) => Err(err),
        };

        if let Err(err) = result {
            self.counters.populate_failure();
            tracing::warn!(key, error = %err, "cache population failed");
        }
    }
}

fn decode_entry<T: DeserializeOwned>(key: &str, raw: &str) -> CacheResult<T> {
    serde_json::from_str(raw).map_err(|e| CacheError::Decode {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn encode_entry<T: Serialize>(key: &str, value: &T) -> CacheResult<String> {
    serde_json::to_string(value).map_err(|e| CacheError::Encode {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

impl<C> Clone for ReadThroughCache<C>
where
    C: CacheBackend,
{
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            config: self.config.clone(),
            counters: Arc::clone(&self.counters),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory_backend::InMemoryCacheBackend;
    use openmusic_core::{Album, AlbumId, OpenMusicError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn album(id: &str, name: &str) -> Album {
        Album {
            id: AlbumId::new(id),
            name: name.to_string(),
            year: 2020,
            cover_url: None,
        }
    }

    fn cache() -> (ReadThroughCache<InMemoryCacheBackend>, InMemoryCacheBackend) {
        let backend = InMemoryCacheBackend::new();
        (ReadThroughCache::with_defaults(Arc::new(backend.clone())), backend)
    }

    #[tokio::test]
    async fn test_miss_loads_and_populates() {
        let (cache, backend) = cache();
        let key = CacheKey::Album(AlbumId::new("album-1"));

        let read = cache
            .read(&key, || async { Ok(album("album-1", "Test")) })
            .await
            .unwrap();

        assert!(!read.is_from_cache());
        assert_eq!(
            backend.raw("album:album-1").as_deref(),
            Some(r#"{"id":"album-1","name":"Test","year":2020,"coverUrl":null}"#)
        );
    }

    #[tokio::test]
    async fn test_hit_skips_loader() {
        let (cache, _backend) = cache();
        let key = CacheKey::Album(AlbumId::new("album-1"));
        let loads = AtomicUsize::new(0);
        let counter = &loads;

        for _ in 0..3 {
            cache
                .read(&key, move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(album("album-1", "Test"))
                })
                .await
                .unwrap();
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_replaced() {
        let (cache, backend) = cache();
        backend.insert_raw("album:album-1", "not json");

        let read = cache
            .read(&CacheKey::Album(AlbumId::new("album-1")), || async {
                Ok(album("album-1", "Test"))
            })
            .await
            .unwrap();

        assert!(!read.is_from_cache());
        assert!(backend.raw("album:album-1").unwrap().starts_with('{'));
    }

    #[tokio::test]
    async fn test_loader_error_is_returned_and_nothing_cached() {
        let (cache, backend) = cache();

        let err = cache
            .read::<Album, _, _>(&CacheKey::Album(AlbumId::new("album-x")), || async {
                Err(OpenMusicError::store_unavailable("connection refused"))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, OpenMusicError::StoreUnavailable { .. }));
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_deletes_stale_keys() {
        let (cache, backend) = cache();
        backend.insert_raw("albums", "[]");
        backend.insert_raw("album:album-1", "{}");

        let failed = cache
            .invalidate(&Mutation::AlbumEdited(AlbumId::new("album-1")))
            .await;

        assert_eq!(failed, 0);
        assert!(!backend.contains_key("album:album-1"));
        assert!(backend.contains_key("albums"));
        assert_eq!(cache.stats().invalidations, 1);
    }

    #[test]
    fn test_cache_config_builder() {
        let config = CacheConfig::new().with_op_timeout(Duration::from_millis(50));
        assert_eq!(config.op_timeout, Duration::from_millis(50));
        assert_eq!(CacheConfig::default().op_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_entry_codec_errors_name_the_key() {
        let err = decode_entry::<Album>("album:album-1", "not json").unwrap_err();
        assert!(matches!(err, CacheError::Decode { ref key, .. } if key == "album:album-1"));

        // JSON object keys must be strings.
        let mut unencodable = std::collections::HashMap::new();
        unencodable.insert(vec![1u8], 1u8);
        let err = encode_entry("albums", &unencodable).unwrap_err();
        assert!(matches!(err, CacheError::Encode { ref key, .. } if key == "albums"));
    }
}
