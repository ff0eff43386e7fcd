//! Cache-aside album repository.
//!
//! The single entry point handlers use. Reads go through the
//! [`ReadThroughCache`]; writes go to the [`AlbumStore`] and, once the store
//! confirmed them, delete the keys listed by [`Mutation::stale_keys`].
//!
//! Within one call the order is always: mutate store, invalidate cache,
//! return. A failed store call returns before any invalidation.

use openmusic_core::{
    Album, AlbumDetail, AlbumId, AlbumLikes, AlbumUpdate, EntityType, ErrorKind, LikeId,
    LikeState, NewAlbum, OpenMusicError, OpenMusicResult, SongSummary, StorageError, UserId,
};
use std::sync::Arc;

use crate::cache::{
    CacheBackend, CacheConfig, CacheKey, CacheRead, CacheStats, Mutation, ReadThroughCache,
};
use crate::store::AlbumStore;

/// Convert a store failure for the caller, logging the ones that are outages.
fn store_failure(operation: &'static str, err: StorageError) -> OpenMusicError {
    let err = OpenMusicError::from(err);
    if err.kind() == ErrorKind::StoreUnavailable {
        tracing::error!(operation, error = %err, "store operation failed");
    }
    err
}

fn album_not_found(id: &AlbumId) -> OpenMusicError {
    OpenMusicError::not_found(EntityType::Album, id.to_string())
}

/// Album repository combining a store with a read-through cache.
pub struct CachedAlbumRepository<S, C>
where
    S: AlbumStore,
    C: CacheBackend,
{
    store: Arc<S>,
    cache: ReadThroughCache<C>,
}

impl<S, C> CachedAlbumRepository<S, C>
where
    S: AlbumStore,
    C: CacheBackend,
{
    /// Create a repository over a store and a cache backend.
    pub fn new(store: Arc<S>, backend: Arc<C>, config: CacheConfig) -> Self {
        Self {
            store,
            cache: ReadThroughCache::new(backend, config),
        }
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get a reference to the read-through cache.
    pub fn cache(&self) -> &ReadThroughCache<C> {
        &self.cache
    }

    /// Cache usage since the repository was created.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // ========================================================================
    // ALBUMS
    // ========================================================================

    /// Create an album and return its generated id.
    #[tracing::instrument(skip_all, fields(name = %album.name, year = album.year))]
    pub async fn add_album(&self, album: NewAlbum) -> OpenMusicResult<AlbumId> {
        let id = AlbumId::generate();
        let inserted = self
            .store
            .insert_album(&id, &album)
            .await
            .map_err(|e| store_failure("insert_album", e))?
            .ok_or_else(|| OpenMusicError::invariant("album insert returned no id"))?;

        self.cache.invalidate(&Mutation::AlbumCreated(inserted.clone())).await;
        tracing::debug!(album_id = %inserted, "album created");
        Ok(inserted)
    }

    /// All albums.
    #[tracing::instrument(skip_all)]
    pub async fn list_albums(&self) -> OpenMusicResult<CacheRead<Vec<Album>>> {
        let store = &self.store;
        self.cache
            .read(&CacheKey::Albums, move || async move {
                store
                    .list_albums()
                    .await
                    .map_err(|e| store_failure("list_albums", e))
            })
            .await
    }

    /// One album by id.
    #[tracing::instrument(skip_all, fields(album_id = %id))]
    pub async fn album(&self, id: &AlbumId) -> OpenMusicResult<CacheRead<Album>> {
        let store = &self.store;
        self.cache
            .read(&CacheKey::Album(id.clone()), move || async move {
                store
                    .get_album(id)
                    .await
                    .map_err(|e| store_failure("get_album", e))?
                    .ok_or_else(|| album_not_found(id))
            })
            .await
    }

    /// Replace an album's name and year.
    ///
    /// Only `album:{id}` is invalidated. A cached album list keeps showing
    /// the old attributes until it is next rebuilt.
    #[tracing::instrument(skip_all, fields(album_id = %id))]
    pub async fn edit_album(&self, id: &AlbumId, update: AlbumUpdate) -> OpenMusicResult<()> {
        let updated = self
            .store
            .update_album(id, &update)
            .await
            .map_err(|e| store_failure("update_album", e))?;
        if !updated {
            return Err(album_not_found(id));
        }

        self.cache.invalidate(&Mutation::AlbumEdited(id.clone())).await;
        Ok(())
    }

    /// Delete an album.
    #[tracing::instrument(skip_all, fields(album_id = %id))]
    pub async fn delete_album(&self, id: &AlbumId) -> OpenMusicResult<()> {
        let deleted = self
            .store
            .delete_album(id)
            .await
            .map_err(|e| store_failure("delete_album", e))?;
        if !deleted {
            return Err(album_not_found(id));
        }

        self.cache.invalidate(&Mutation::AlbumDeleted(id.clone())).await;
        Ok(())
    }

    /// Point an album at an uploaded cover.
    #[tracing::instrument(skip_all, fields(album_id = %id))]
    pub async fn set_album_cover(&self, id: &AlbumId, cover_url: &str) -> OpenMusicResult<()> {
        let updated = self
            .store
            .set_album_cover(id, cover_url)
            .await
            .map_err(|e| store_failure("set_album_cover", e))?;
        if !updated {
            return Err(album_not_found(id));
        }

        self.cache.invalidate(&Mutation::CoverSet(id.clone())).await;
        Ok(())
    }

    // ========================================================================
    // SONGS
    // ========================================================================

    /// Songs of an album. An album without songs, known or not, yields an
    /// empty list.
    #[tracing::instrument(skip_all, fields(album_id = %id))]
    pub async fn album_songs(&self, id: &AlbumId) -> OpenMusicResult<CacheRead<Vec<SongSummary>>> {
        let store = &self.store;
        self.cache
            .read(&CacheKey::AlbumSongs(id.clone()), move || async move {
                store
                    .list_album_songs(id)
                    .await
                    .map_err(|e| store_failure("list_album_songs", e))
            })
            .await
    }

    /// An album with its songs.
    ///
    /// Both parts are read through their own keys. The result counts as
    /// cached only when both parts were.
    #[tracing::instrument(skip_all, fields(album_id = %id))]
    pub async fn album_detail(&self, id: &AlbumId) -> OpenMusicResult<CacheRead<AlbumDetail>> {
        let (album, album_cached) = self.album(id).await?.into_parts();
        let (songs, songs_cached) = self.album_songs(id).await?.into_parts();

        let detail = AlbumDetail { album, songs };
        Ok(if album_cached && songs_cached {
            CacheRead::from_cache(detail)
        } else {
            CacheRead::from_store(detail)
        })
    }

    // ========================================================================
    // LIKES
    // ========================================================================

    /// Flip whether `user_id` likes the album and return the new state.
    #[tracing::instrument(skip_all, fields(album_id = %album_id, user_id = %user_id))]
    pub async fn toggle_album_like(
        &self,
        album_id: &AlbumId,
        user_id: &UserId,
    ) -> OpenMusicResult<LikeState> {
        let like_id = LikeId::generate();
        let state = self
            .store
            .toggle_like(&like_id, album_id, user_id)
            .await
            .map_err(|e| store_failure("toggle_like", e))?;

        self.cache
            .invalidate(&Mutation::LikeToggled(album_id.clone()))
            .await;
        tracing::debug!(?state, "album like toggled");
        Ok(state)
    }

    /// Users liking an album; the count is derived from the list.
    #[tracing::instrument(skip_all, fields(album_id = %id))]
    pub async fn album_likes(&self, id: &AlbumId) -> OpenMusicResult<CacheRead<AlbumLikes>> {
        let store = &self.store;
        self.cache
            .read(&CacheKey::AlbumLikes(id.clone()), move || async move {
                store
                    .list_album_likes(id)
                    .await
                    .map_err(|e| store_failure("list_album_likes", e))
            })
            .await
    }
}

impl<S, C> Clone for CachedAlbumRepository<S, C>
where
    S: AlbumStore,
    C: CacheBackend,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: self.cache.clone(),
        }
    }
}
