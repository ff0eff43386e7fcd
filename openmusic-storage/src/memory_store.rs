//! In-memory album store.
//!
//! Behaves like the relational store, including the at-most-one like per
//! (album, user) pair and cascading deletes. Used by tests and by local runs
//! without a database.

use async_trait::async_trait;
use openmusic_core::{
    Album, AlbumId, AlbumLikes, AlbumUpdate, EntityType, LikeId, LikeState, LikeTransition,
    NewAlbum, Song, SongSummary, StorageError, UserId,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::store::{AlbumStore, StorageResult};

/// One row of the likes relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeRow {
    pub id: LikeId,
    pub album_id: AlbumId,
    pub user_id: UserId,
}

#[derive(Debug, Default)]
struct Tables {
    // Insertion order doubles as list order.
    albums: Vec<Album>,
    songs: Vec<Song>,
    likes: Vec<LikeRow>,
}

impl Tables {
    fn album_mut(&mut self, id: &AlbumId) -> Option<&mut Album> {
        self.albums.iter_mut().find(|album| &album.id == id)
    }

    fn has_album(&self, id: &AlbumId) -> bool {
        self.albums.iter().any(|album| &album.id == id)
    }
}

/// Album store backed by process memory. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAlbumStore {
    tables: Arc<RwLock<Tables>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryAlbumStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with [`StorageError::Unavailable`]
    /// until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable {
                reason: "store switched off".to_string(),
            });
        }
        Ok(())
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, Tables>> {
        self.check_available()?;
        self.tables.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, Tables>> {
        self.check_available()?;
        self.tables.write().map_err(|_| StorageError::LockPoisoned)
    }

    /// Add a song row. Songs are written by another service in production;
    /// this is how tests and fixtures provide them.
    pub fn seed_song(&self, song: Song) -> StorageResult<()> {
        let mut tables = self.write()?;
        if let Some(album_id) = &song.album_id {
            if !tables.has_album(album_id) {
                return Err(StorageError::ConstraintViolation {
                    constraint: "songs_album_id_fkey".to_string(),
                    reason: format!("album {album_id} does not exist"),
                });
            }
        }
        if tables.songs.iter().any(|existing| existing.id == song.id) {
            return Err(StorageError::InsertFailed {
                entity_type: EntityType::Song,
                reason: "already exists".to_string(),
            });
        }
        tables.songs.push(song);
        Ok(())
    }

    /// Get count of stored albums.
    pub fn album_count(&self) -> usize {
        self.read().map(|t| t.albums.len()).unwrap_or(0)
    }

    /// Get count of stored songs.
    pub fn song_count(&self) -> usize {
        self.read().map(|t| t.songs.len()).unwrap_or(0)
    }

    /// Like rows for one album, in insertion order.
    pub fn like_rows(&self, album_id: &AlbumId) -> Vec<LikeRow> {
        self.read()
            .map(|t| {
                t.likes
                    .iter()
                    .filter(|row| &row.album_id == album_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of like rows for one (album, user) pair.
    pub fn like_row_count(&self, album_id: &AlbumId, user_id: &UserId) -> usize {
        self.read()
            .map(|t| {
                t.likes
                    .iter()
                    .filter(|row| &row.album_id == album_id && &row.user_id == user_id)
                    .count()
            })
            .unwrap_or(0)
    }
}

#[async_trait]
impl AlbumStore for InMemoryAlbumStore {
    async fn insert_album(&self, id: &AlbumId, album: &NewAlbum) -> StorageResult<Option<AlbumId>> {
        let mut tables = self.write()?;
        if tables.has_album(id) {
            return Err(StorageError::InsertFailed {
                entity_type: EntityType::Album,
                reason: "already exists".to_string(),
            });
        }
        tables.albums.push(album.clone().into_album(id.clone()));
        Ok(Some(id.clone()))
    }

    async fn list_albums(&self) -> StorageResult<Vec<Album>> {
        Ok(self.read()?.albums.clone())
    }

    async fn get_album(&self, id: &AlbumId) -> StorageResult<Option<Album>> {
        Ok(self.read()?.albums.iter().find(|a| &a.id == id).cloned())
    }

    async fn update_album(&self, id: &AlbumId, update: &AlbumUpdate) -> StorageResult<bool> {
        let mut tables = self.write()?;
        match tables.album_mut(id) {
            Some(album) => {
                album.name = update.name.clone();
                album.year = update.year;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_album(&self, id: &AlbumId) -> StorageResult<bool> {
        let mut tables = self.write()?;
        let before = tables.albums.len();
        tables.albums.retain(|album| &album.id != id);
        if tables.albums.len() == before {
            return Ok(false);
        }
        tables
            .songs
            .retain(|song| song.album_id.as_ref() != Some(id));
        tables.likes.retain(|row| &row.album_id != id);
        Ok(true)
    }

    async fn set_album_cover(&self, id: &AlbumId, cover_url: &str) -> StorageResult<bool> {
        let mut tables = self.write()?;
        match tables.album_mut(id) {
            Some(album) => {
                album.cover_url = Some(cover_url.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_album_songs(&self, id: &AlbumId) -> StorageResult<Vec<SongSummary>> {
        Ok(self
            .read()?
            .songs
            .iter()
            .filter(|song| song.album_id.as_ref() == Some(id))
            .cloned()
            .map(SongSummary::from)
            .collect())
    }

    async fn toggle_like(
        &self,
        like_id: &LikeId,
        album_id: &AlbumId,
        user_id: &UserId,
    ) -> StorageResult<LikeState> {
        // Check and act under one write guard.
        let mut tables = self.write()?;
        if !tables.has_album(album_id) {
            return Err(StorageError::NotFound {
                entity_type: EntityType::Album,
                id: album_id.to_string(),
            });
        }

        let existing = tables
            .likes
            .iter()
            .position(|row| &row.album_id == album_id && &row.user_id == user_id);
        let transition = LikeState::from_membership(existing.is_some()).transition();

        match existing {
            Some(index) => {
                tables.likes.remove(index);
            }
            None => {
                if tables.likes.iter().any(|row| &row.id == like_id) {
                    return Err(StorageError::InsertFailed {
                        entity_type: EntityType::Like,
                        reason: format!("like id {like_id} already exists"),
                    });
                }
                tables.likes.push(LikeRow {
                    id: like_id.clone(),
                    album_id: album_id.clone(),
                    user_id: user_id.clone(),
                });
            }
        }
        debug_assert_eq!(transition == LikeTransition::Insert, existing.is_none());

        Ok(transition.target())
    }

    async fn list_album_likes(&self, id: &AlbumId) -> StorageResult<AlbumLikes> {
        Ok(self
            .read()?
            .likes
            .iter()
            .filter(|row| &row.album_id == id)
            .map(|row| row.user_id.clone())
            .collect())
    }

    async fn ping(&self) -> StorageResult<()> {
        self.read().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openmusic_core::SongId;

    async fn store_with_album(id: &str) -> (InMemoryAlbumStore, AlbumId) {
        let store = InMemoryAlbumStore::new();
        let id = AlbumId::new(id);
        store
            .insert_album(&id, &NewAlbum::new(Some("Test".into()), 2020))
            .await
            .unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn test_album_insert_and_get() {
        let (store, id) = store_with_album("album-1").await;

        let album = store.get_album(&id).await.unwrap().unwrap();
        assert_eq!(album.name, "Test");
        assert_eq!(album.year, 2020);
        assert_eq!(album.cover_url, None);
    }

    #[tokio::test]
    async fn test_album_insert_duplicate() {
        let (store, id) = store_with_album("album-1").await;
        let result = store.insert_album(&id, &NewAlbum::new(None, 1999)).await;
        assert!(matches!(result, Err(StorageError::InsertFailed { .. })));
        assert_eq!(store.album_count(), 1);
    }

    #[tokio::test]
    async fn test_update_and_cover_report_missing_rows() {
        let (store, id) = store_with_album("album-1").await;
        let missing = AlbumId::new("album-missing");
        let update = AlbumUpdate {
            name: "Other".into(),
            year: 2001,
        };

        assert!(store.update_album(&id, &update).await.unwrap());
        assert!(!store.update_album(&missing, &update).await.unwrap());
        assert!(store.set_album_cover(&id, "http://x/cover.png").await.unwrap());
        assert!(!store.set_album_cover(&missing, "http://x/cover.png").await.unwrap());

        let album = store.get_album(&id).await.unwrap().unwrap();
        assert_eq!(album.name, "Other");
        assert_eq!(album.cover_url.as_deref(), Some("http://x/cover.png"));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_songs_and_likes() {
        let (store, id) = store_with_album("album-1").await;
        store
            .seed_song(Song {
                id: SongId::new("song-1"),
                title: "Intro".into(),
                performer: "Someone".into(),
                album_id: Some(id.clone()),
            })
            .unwrap();
        store
            .toggle_like(&LikeId::generate(), &id, &UserId::new("user-1"))
            .await
            .unwrap();

        assert!(store.delete_album(&id).await.unwrap());
        assert!(!store.delete_album(&id).await.unwrap());
        assert_eq!(store.song_count(), 0);
        assert!(store.like_rows(&id).is_empty());
    }

    #[tokio::test]
    async fn test_toggle_flips_membership() {
        let (store, id) = store_with_album("album-1").await;
        let user = UserId::new("user-1");

        let state = store.toggle_like(&LikeId::generate(), &id, &user).await.unwrap();
        assert_eq!(state, LikeState::Liked);
        assert_eq!(store.like_row_count(&id, &user), 1);

        let state = store.toggle_like(&LikeId::generate(), &id, &user).await.unwrap();
        assert_eq!(state, LikeState::NotLiked);
        assert_eq!(store.like_row_count(&id, &user), 0);
    }

    #[tokio::test]
    async fn test_toggle_on_missing_album() {
        let store = InMemoryAlbumStore::new();
        let result = store
            .toggle_like(&LikeId::generate(), &AlbumId::new("album-x"), &UserId::new("u"))
            .await;
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_toggles_keep_one_row_at_most() {
        let (store, id) = store_with_album("album-1").await;
        let user = UserId::new("user-1");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let id = id.clone();
            let user = user.clone();
            handles.push(tokio::spawn(async move {
                store.toggle_like(&LikeId::generate(), &id, &user).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Eight serialized flips from NotLiked land on NotLiked.
        assert_eq!(store.like_row_count(&id, &user), 0);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_operation() {
        let (store, id) = store_with_album("album-1").await;
        store.set_unavailable(true);
        assert!(matches!(
            store.get_album(&id).await,
            Err(StorageError::Unavailable { .. })
        ));
        assert!(store.ping().await.is_err());

        store.set_unavailable(false);
        assert!(store.ping().await.is_ok());
    }
}
