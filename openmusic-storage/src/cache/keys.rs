//! Cache key namespace.
//!
//! Keys are shared with any other process inspecting the cache store, so the
//! textual format is fixed:
//!
//! | Data | Key |
//! |---|---|
//! | All albums | `albums` |
//! | Single album | `album:{albumId}` |
//! | Songs of an album | `album-songs:{albumId}` |
//! | Likes of an album | `likes:{albumId}` |

use std::fmt;

use openmusic_core::{AlbumId, EntityIdType};

const ALBUMS: &str = "albums";
const ALBUM_PREFIX: &str = "album:";
const ALBUM_SONGS_PREFIX: &str = "album-songs:";
const LIKES_PREFIX: &str = "likes:";

/// A key in the cache namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The list of all albums.
    Albums,
    /// One album by id.
    Album(AlbumId),
    /// The song list of one album.
    AlbumSongs(AlbumId),
    /// The like list of one album.
    AlbumLikes(AlbumId),
}

impl CacheKey {
    /// Encode to the textual key stored in the cache.
    pub fn encode(&self) -> String {
        match self {
            CacheKey::Albums => ALBUMS.to_string(),
            CacheKey::Album(id) => format!("{ALBUM_PREFIX}{}", id.as_str()),
            CacheKey::AlbumSongs(id) => format!("{ALBUM_SONGS_PREFIX}{}", id.as_str()),
            CacheKey::AlbumLikes(id) => format!("{LIKES_PREFIX}{}", id.as_str()),
        }
    }

    /// Decode a textual key. Returns `None` for keys outside the namespace
    /// or with an empty album id.
    #[cfg(test)]
    fn decode(raw: &str) -> Option<Self> {
        if raw == ALBUMS {
            return Some(CacheKey::Albums);
        }

        // `album-songs:` must be tried before `album:`; neither is a prefix
        // of the other but both start with `album`.
        let (ctor, id): (fn(AlbumId) -> CacheKey, &str) =
            if let Some(id) = raw.strip_prefix(ALBUM_SONGS_PREFIX) {
                (CacheKey::AlbumSongs, id)
            } else if let Some(id) = raw.strip_prefix(ALBUM_PREFIX) {
                (CacheKey::Album, id)
            } else if let Some(id) = raw.strip_prefix(LIKES_PREFIX) {
                (CacheKey::AlbumLikes, id)
            } else {
                return None;
            };

        if id.is_empty() {
            return None;
        }
        Some(ctor(AlbumId::new(id)))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_key_formats() {
        let id = AlbumId::new("album-Mk8AnmCp210PwT6B");
        assert_eq!(CacheKey::Albums.encode(), "albums");
        assert_eq!(CacheKey::Album(id.clone()).encode(), "album:album-Mk8AnmCp210PwT6B");
        assert_eq!(
            CacheKey::AlbumSongs(id.clone()).encode(),
            "album-songs:album-Mk8AnmCp210PwT6B"
        );
        assert_eq!(CacheKey::AlbumLikes(id).encode(), "likes:album-Mk8AnmCp210PwT6B");
    }

    #[test]
    fn test_decode_rejects_foreign_keys() {
        assert_eq!(CacheKey::decode("playlists"), None);
        assert_eq!(CacheKey::decode("album:"), None);
        assert_eq!(CacheKey::decode("songs:album-1"), None);
    }

    #[test]
    fn test_decode_distinguishes_album_and_song_keys() {
        assert_eq!(
            CacheKey::decode("album-songs:album-1"),
            Some(CacheKey::AlbumSongs(AlbumId::new("album-1")))
        );
        assert_eq!(
            CacheKey::decode("album:album-songs"),
            Some(CacheKey::Album(AlbumId::new("album-songs")))
        );
    }

    fn key_strategy() -> impl Strategy<Value = CacheKey> {
        let id = "[A-Za-z0-9_:-]{1,24}".prop_map(AlbumId::new);
        prop_oneof![
            Just(CacheKey::Albums),
            id.clone().prop_map(CacheKey::Album),
            id.clone().prop_map(CacheKey::AlbumSongs),
            id.prop_map(CacheKey::AlbumLikes),
        ]
    }

    proptest! {
        /// Property: distinct keys never encode to the same string.
        #[test]
        fn prop_encoding_is_injective(a in key_strategy(), b in key_strategy()) {
            if a != b {
                prop_assert_ne!(a.encode(), b.encode());
            }
        }

        /// Property: decoding an encoded key yields the original key.
        #[test]
        fn prop_decode_inverts_encode(key in key_strategy()) {
            prop_assert_eq!(CacheKey::decode(&key.encode()), Some(key));
        }
    }
}
