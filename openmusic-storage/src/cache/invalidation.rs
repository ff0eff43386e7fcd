//! Which cache keys each mutation makes stale.
//!
//! | Mutation | Keys deleted |
//! |---|---|
//! | album created | `albums` |
//! | album edited | `album:{id}` |
//! | album deleted | `album:{id}` |
//! | cover set | `album:{id}` |
//! | like toggled | `likes:{id}` |
//!
//! The list key is only dropped on creation. After an edit or a delete a
//! cached `albums` entry keeps serving the previous list until it expires or
//! the next creation clears it. Song lists are never invalidated here; songs
//! are written by another service.

use openmusic_core::AlbumId;

use super::keys::CacheKey;

/// A successful store mutation, described by what it touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    AlbumCreated(AlbumId),
    AlbumEdited(AlbumId),
    AlbumDeleted(AlbumId),
    CoverSet(AlbumId),
    LikeToggled(AlbumId),
}

impl Mutation {
    /// The album the mutation applied to.
    pub fn album_id(&self) -> &AlbumId {
        match self {
            Mutation::AlbumCreated(id)
            | Mutation::AlbumEdited(id)
            | Mutation::AlbumDeleted(id)
            | Mutation::CoverSet(id)
            | Mutation::LikeToggled(id) => id,
        }
    }

    /// Keys to delete once the mutation has committed.
    pub fn stale_keys(&self) -> Vec<CacheKey> {
        match self {
            Mutation::AlbumCreated(_) => vec![CacheKey::Albums],
            Mutation::AlbumEdited(id) | Mutation::AlbumDeleted(id) | Mutation::CoverSet(id) => {
                vec![CacheKey::Album(id.clone())]
            }
            Mutation::LikeToggled(id) => vec![CacheKey::AlbumLikes(id.clone())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(mutation: Mutation) -> Vec<String> {
        mutation.stale_keys().iter().map(CacheKey::encode).collect()
    }

    #[test]
    fn test_invalidation_table() {
        let id = || AlbumId::new("album-1");
        assert_eq!(encoded(Mutation::AlbumCreated(id())), ["albums"]);
        assert_eq!(encoded(Mutation::AlbumEdited(id())), ["album:album-1"]);
        assert_eq!(encoded(Mutation::AlbumDeleted(id())), ["album:album-1"]);
        assert_eq!(encoded(Mutation::CoverSet(id())), ["album:album-1"]);
        assert_eq!(encoded(Mutation::LikeToggled(id())), ["likes:album-1"]);
    }

    #[test]
    fn test_song_lists_never_invalidated() {
        let id = AlbumId::new("album-1");
        for mutation in [
            Mutation::AlbumCreated(id.clone()),
            Mutation::AlbumEdited(id.clone()),
            Mutation::AlbumDeleted(id.clone()),
            Mutation::CoverSet(id.clone()),
            Mutation::LikeToggled(id.clone()),
        ] {
            assert_eq!(mutation.album_id(), &id);
            assert!(!mutation
                .stale_keys()
                .iter()
                .any(|k| matches!(k, CacheKey::AlbumSongs(_))));
        }
    }
}
