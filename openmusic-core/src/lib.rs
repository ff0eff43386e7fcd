//! OpenMusic Core - Entity Types
//!
//! Pure data structures shared by every other crate: identifiers, catalog
//! entities, the like toggle state machine and the error taxonomy.
//! This crate performs no I/O.

pub mod entities;
pub mod error;
pub mod identity;
pub mod like;

pub use entities::{
    Album, AlbumDetail, AlbumLike, AlbumLikes, AlbumUpdate, EntityType, NewAlbum, Song,
    SongSummary, DEFAULT_ALBUM_NAME,
};
pub use error::{CacheError, ConfigError, ErrorKind, OpenMusicError, OpenMusicResult, StorageError};
pub use identity::{AlbumId, EntityIdType, LikeId, SongId, UserId, ID_SUFFIX_LENGTH};
pub use like::{LikeState, LikeTransition};
