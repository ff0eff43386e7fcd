//! Catalog entities and write payloads.
//!
//! Field names serialize in camelCase; these serializations are the exact
//! values stored under the cache keys, so any change here is a cache format
//! change.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identity::{AlbumId, SongId, UserId};

/// Placeholder name used when an album is created without one.
pub const DEFAULT_ALBUM_NAME: &str = "untitled";

/// Entity kinds, used for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Album,
    Song,
    Like,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityType::Album => "Album",
            EntityType::Song => "Song",
            EntityType::Like => "Like",
        };
        f.write_str(name)
    }
}

/// An album row as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: AlbumId,
    pub name: String,
    pub year: i32,
    /// Set after creation through a cover upload.
    pub cover_url: Option<String>,
}

/// Payload for creating an album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlbum {
    pub name: String,
    pub year: i32,
}

impl NewAlbum {
    /// Build a creation payload, falling back to [`DEFAULT_ALBUM_NAME`].
    pub fn new(name: Option<String>, year: i32) -> Self {
        Self {
            name: name.unwrap_or_else(|| DEFAULT_ALBUM_NAME.to_string()),
            year,
        }
    }

    /// Materialize the row this payload inserts under `id`.
    pub fn into_album(self, id: AlbumId) -> Album {
        Album {
            id,
            name: self.name,
            year: self.year,
            cover_url: None,
        }
    }
}

/// Payload for editing an album. Both attributes are replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumUpdate {
    pub name: String,
    pub year: i32,
}

/// A song row. Songs are read-only from this layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub performer: String,
    pub album_id: Option<AlbumId>,
}

/// Projection of a song inside an album's song list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongSummary {
    pub id: SongId,
    pub title: String,
    pub performer: String,
}

impl From<Song> for SongSummary {
    fn from(song: Song) -> Self {
        Self {
            id: song.id,
            title: song.title,
            performer: song.performer,
        }
    }
}

/// An album together with its songs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumDetail {
    #[serde(flatten)]
    pub album: Album,
    pub songs: Vec<SongSummary>,
}

/// One existing like tuple, seen from the album side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumLike {
    pub user_id: UserId,
}

/// All likes of one album. The count is derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlbumLikes {
    likes: Vec<AlbumLike>,
}

impl AlbumLikes {
    pub fn new(likes: Vec<AlbumLike>) -> Self {
        Self { likes }
    }

    /// Number of users liking the album.
    pub fn count(&self) -> usize {
        self.likes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.likes.is_empty()
    }

    pub fn contains(&self, user_id: &UserId) -> bool {
        self.likes.iter().any(|like| &like.user_id == user_id)
    }

    pub fn user_ids(&self) -> impl Iterator<Item = &UserId> {
        self.likes.iter().map(|like| &like.user_id)
    }

    pub fn into_inner(self) -> Vec<AlbumLike> {
        self.likes
    }
}

impl FromIterator<UserId> for AlbumLikes {
    fn from_iter<I: IntoIterator<Item = UserId>>(iter: I) -> Self {
        Self {
            likes: iter.into_iter().map(|user_id| AlbumLike { user_id }).collect(),
        }
    }
}
