//! Identity types for OpenMusic entities
//!
//! Identifiers are opaque strings. Generated identifiers follow the
//! `<prefix>-<suffix>` shape used by the catalog tables, where the suffix is
//! drawn from a URL-safe alphabet.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of the random suffix appended to generated identifiers.
pub const ID_SUFFIX_LENGTH: usize = 16;

const ID_CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_-";

/// Generate a random URL-safe suffix of [`ID_SUFFIX_LENGTH`] characters.
fn random_suffix() -> String {
    let mut rng = rand::rng();
    (0..ID_SUFFIX_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..ID_CHARSET.len());
            ID_CHARSET[idx] as char
        })
        .collect()
}

/// Common behavior for strongly-typed string identifiers.
pub trait EntityIdType:
    Clone + Eq + std::hash::Hash + fmt::Display + AsRef<str> + Send + Sync + 'static
{
    /// Borrow the raw identifier.
    fn as_str(&self) -> &str;
}

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Consume the wrapper and return the raw identifier.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl EntityIdType for $name {
            fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
    ($(#[$meta:meta])* $name:ident, prefix = $prefix:literal) => {
        define_entity_id!($(#[$meta])* $name);

        impl $name {
            /// Prefix used for generated identifiers of this type.
            pub const PREFIX: &'static str = $prefix;

            /// Generate a fresh identifier.
            pub fn generate() -> Self {
                Self(format!("{}-{}", Self::PREFIX, random_suffix()))
            }
        }
    };
}

define_entity_id!(
    /// Album identifier, e.g. `album-Mk8AnmCp210PwT6B`.
    AlbumId,
    prefix = "album"
);

define_entity_id!(
    /// Row identifier of a like tuple, e.g. `likes-qU1pCL8e4zD0fM3a`.
    LikeId,
    prefix = "likes"
);

define_entity_id!(
    /// Song identifier. Songs are created outside this layer.
    SongId
);

define_entity_id!(
    /// User identifier issued by the authentication service.
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_album_id_shape() {
        let id = AlbumId::generate();
        let suffix = id
            .as_str()
            .strip_prefix("album-")
            .expect("album ids carry the album- prefix");
        assert_eq!(suffix.len(), ID_SUFFIX_LENGTH);
        assert!(suffix.bytes().all(|b| ID_CHARSET.contains(&b)));
    }

    #[test]
    fn test_generated_like_id_prefix() {
        assert!(LikeId::generate().as_str().starts_with("likes-"));
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let ids: HashSet<AlbumId> = (0..256).map(|_| AlbumId::generate()).collect();
        assert_eq!(ids.len(), 256);
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = UserId::new("user-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"user-1\"");
        assert_eq!(id.to_string(), "user-1");
    }
}
