//! Source-of-truth store contract.
//!
//! The repository only talks to the relational store through this trait.
//! Every method is one independently committed operation; no transaction
//! spans two calls.

use async_trait::async_trait;
use openmusic_core::{
    Album, AlbumId, AlbumLikes, AlbumUpdate, LikeId, LikeState, NewAlbum, SongSummary,
    StorageError, UserId,
};

/// Result type for store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Async store for albums, their songs and their likes.
#[async_trait]
pub trait AlbumStore: Send + Sync {
    // ========================================================================
    // ALBUM OPERATIONS
    // ========================================================================

    /// Insert a new album under `id`.
    ///
    /// Returns the id the store reports for the inserted row, or `None` if
    /// the insert affected no row.
    async fn insert_album(&self, id: &AlbumId, album: &NewAlbum) -> StorageResult<Option<AlbumId>>;

    /// All albums.
    async fn list_albums(&self) -> StorageResult<Vec<Album>>;

    /// Get an album by id.
    async fn get_album(&self, id: &AlbumId) -> StorageResult<Option<Album>>;

    /// Replace name and year. Returns `false` if no album has this id.
    async fn update_album(&self, id: &AlbumId, update: &AlbumUpdate) -> StorageResult<bool>;

    /// Delete an album. Returns `false` if no album has this id.
    ///
    /// Songs and likes of the album are removed by the store's referential
    /// rules, not by the caller.
    async fn delete_album(&self, id: &AlbumId) -> StorageResult<bool>;

    /// Set the cover URL. Returns `false` if no album has this id.
    async fn set_album_cover(&self, id: &AlbumId, cover_url: &str) -> StorageResult<bool>;

    // ========================================================================
    // SONG OPERATIONS
    // ========================================================================

    /// Songs referencing the album. Empty for an unknown album.
    async fn list_album_songs(&self, id: &AlbumId) -> StorageResult<Vec<SongSummary>>;

    // ========================================================================
    // LIKE OPERATIONS
    // ========================================================================

    /// Flip the like membership of `(album_id, user_id)` in one atomic step.
    ///
    /// `like_id` is used as the row id if the toggle inserts. Returns the
    /// state after the toggle. Fails with [`StorageError::NotFound`] if the
    /// album does not exist and with [`StorageError::ToggleConflict`] if a
    /// concurrent toggle on the same pair made this one a no-op.
    async fn toggle_like(
        &self,
        like_id: &LikeId,
        album_id: &AlbumId,
        user_id: &UserId,
    ) -> StorageResult<LikeState>;

    /// Users liking the album. Empty for an unknown album.
    async fn list_album_likes(&self, id: &AlbumId) -> StorageResult<AlbumLikes>;

    // ========================================================================
    // HEALTH
    // ========================================================================

    /// Check that the store accepts queries.
    async fn ping(&self) -> StorageResult<()>;
}
