//! OpenMusic Test Utilities
//!
//! Shared test infrastructure for the OpenMusic workspace:
//! - Fault-injecting cache backends for outage scenarios
//! - Proptest generators for ids, albums and toggle sequences
//! - Fixtures for common repository setups
//! - Assertions on the error taxonomy

// Re-export the in-memory collaborators from their source crate
pub use openmusic_storage::{InMemoryAlbumStore, InMemoryCacheBackend};

// Re-export core types for convenience
pub use openmusic_core::{
    Album, AlbumId, AlbumUpdate, CacheError, EntityType, ErrorKind, LikeState, NewAlbum,
    OpenMusicError, OpenMusicResult, Song, SongId, UserId,
};

use async_trait::async_trait;
use openmusic_storage::{CacheBackend, CacheLookup, CacheResult};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// FAULT-INJECTING CACHE BACKENDS
// ============================================================================

fn injected(op: &str) -> CacheError {
    CacheError::Unavailable {
        reason: format!("injected {op} failure"),
    }
}

/// A cache that is down: every operation fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingCacheBackend;

#[async_trait]
impl CacheBackend for FailingCacheBackend {
    async fn get(&self, _key: &str) -> CacheLookup {
        CacheLookup::Error(injected("get"))
    }

    async fn set(&self, _key: &str, _value: &str) -> CacheResult<()> {
        Err(injected("set"))
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Err(injected("delete"))
    }

    async fn ping(&self) -> CacheResult<()> {
        Err(injected("ping"))
    }
}

/// In-memory cache whose operations can be made to fail or stall at will.
///
/// Clones share both the entries and the switches, so a test can keep a
/// handle while the repository owns another.
#[derive(Debug, Clone, Default)]
pub struct FlakyCacheBackend {
    inner: InMemoryCacheBackend,
    fail_gets: Arc<AtomicBool>,
    fail_sets: Arc<AtomicBool>,
    fail_deletes: Arc<AtomicBool>,
    delay_ms: Arc<AtomicU64>,
}

impl FlakyCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// The entries behind the switches.
    pub fn entries(&self) -> &InMemoryCacheBackend {
        &self.inner
    }

    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sets(&self, fail: bool) {
        self.fail_sets.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Fail or restore every operation at once.
    pub fn fail_all(&self, fail: bool) {
        self.fail_gets(fail);
        self.fail_sets(fail);
        self.fail_deletes(fail);
    }

    /// Stall every operation for `delay` before running it.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    async fn stall(&self) {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }
}

#[async_trait]
impl CacheBackend for FlakyCacheBackend {
    async fn get(&self, key: &str) -> CacheLookup {
        self.stall().await;
        if self.fail_gets.load(Ordering::SeqCst) {
            return CacheLookup::Error(injected("get"));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        self.stall().await;
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(injected("set"));
        }
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.stall().await;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(injected("delete"));
        }
        self.inner.delete(key).await
    }

    async fn ping(&self) -> CacheResult<()> {
        self.stall().await;
        self.inner.ping().await
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for OpenMusic values.

    use super::*;
    use proptest::prelude::*;

    /// Generate an album id in the generated-id format.
    pub fn arb_album_id() -> impl Strategy<Value = AlbumId> {
        "[A-Za-z0-9_-]{16}".prop_map(|suffix| AlbumId::new(format!("album-{suffix}")))
    }

    /// Generate a user id.
    pub fn arb_user_id() -> impl Strategy<Value = UserId> {
        "user-[a-z0-9]{1,12}".prop_map(UserId::new)
    }

    /// Generate a creation payload, sometimes without a name.
    pub fn arb_new_album() -> impl Strategy<Value = NewAlbum> {
        (proptest::option::of("[A-Za-z0-9 ]{1,32}"), 1900i32..2100)
            .prop_map(|(name, year)| NewAlbum::new(name, year))
    }

    /// Generate a non-empty set of distinct users.
    pub fn user_ids_strategy() -> impl Strategy<Value = Vec<UserId>> {
        proptest::collection::hash_set("user-[a-z0-9]{1,8}", 1..8)
            .prop_map(|ids| ids.into_iter().map(UserId::new).collect())
    }

    /// Generate a sequence of toggles over a small pool of users.
    ///
    /// Each element is the user issuing that toggle. A small pool makes
    /// repeated toggles by the same user likely.
    pub fn toggle_sequence_strategy() -> impl Strategy<Value = Vec<UserId>> {
        proptest::collection::vec(0usize..4, 0..24).prop_map(|picks| {
            picks
                .into_iter()
                .map(|n| UserId::new(format!("user-{n}")))
                .collect()
        })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common repository scenarios.

    use super::*;
    use openmusic_storage::{CacheConfig, CachedAlbumRepository};

    /// The album used throughout the cache-aside scenario.
    pub fn album_fixture() -> NewAlbum {
        NewAlbum::new(Some("Test".to_string()), 2020)
    }

    /// The `n`th song of an album.
    pub fn song_fixture(album_id: &AlbumId, n: usize) -> Song {
        Song {
            id: SongId::new(format!("song-{album_id}-{n}")),
            title: format!("Track {n}"),
            performer: "Test Performer".to_string(),
            album_id: Some(album_id.clone()),
        }
    }

    /// A repository over fresh in-memory collaborators, with handles to both.
    pub fn memory_repository<C>(
        cache: C,
    ) -> (
        CachedAlbumRepository<InMemoryAlbumStore, C>,
        InMemoryAlbumStore,
        C,
    )
    where
        C: CacheBackend + Clone,
    {
        let store = InMemoryAlbumStore::new();
        let repo = CachedAlbumRepository::new(
            Arc::new(store.clone()),
            Arc::new(cache.clone()),
            CacheConfig::default(),
        );
        (repo, store, cache)
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions on the error taxonomy.

    use super::*;

    /// Assert that a result is a NotFound for the given entity type.
    pub fn assert_not_found<T: std::fmt::Debug>(result: &OpenMusicResult<T>, entity_type: EntityType) {
        match result {
            Err(OpenMusicError::NotFound {
                entity_type: actual, ..
            }) => assert_eq!(*actual, entity_type, "NotFound for the wrong entity type"),
            other => panic!("Expected NotFound for {entity_type}, got {other:?}"),
        }
    }

    /// Assert that a result failed with the given error kind.
    pub fn assert_kind<T: std::fmt::Debug>(result: &OpenMusicResult<T>, kind: ErrorKind) {
        match result {
            Err(err) => assert_eq!(err.kind(), kind, "unexpected error: {err}"),
            Ok(value) => panic!("Expected {kind:?} error, got Ok({value:?})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failing_backend_fails_everything() {
        let cache = FailingCacheBackend;
        assert!(matches!(cache.get("albums").await, CacheLookup::Error(_)));
        assert!(cache.set("albums", "[]").await.is_err());
        assert!(cache.delete("albums").await.is_err());
        assert!(cache.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_flaky_backend_switches() {
        let cache = FlakyCacheBackend::new();
        cache.set("albums", "[]").await.unwrap();

        cache.fail_gets(true);
        assert!(matches!(cache.get("albums").await, CacheLookup::Error(_)));
        cache.fail_gets(false);
        assert_eq!(cache.get("albums").await, CacheLookup::Hit("[]".to_string()));

        cache.fail_deletes(true);
        assert!(cache.delete("albums").await.is_err());
        assert!(cache.entries().contains_key("albums"));
    }
}
