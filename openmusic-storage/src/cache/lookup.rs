//! Lookup outcomes and tagged read results.
//!
//! A cache lookup has three outcomes rather than two: a clean miss and a
//! failing cache are different situations, and the read path treats them
//! differently (a miss repopulates, an outage does not).

use openmusic_core::CacheError;

/// Result of a raw cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// The key holds this serialized value.
    Hit(String),
    /// The key is absent.
    Miss,
    /// The cache could not answer.
    Error(CacheError),
}

impl From<Option<String>> for CacheLookup {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(raw) => Self::Hit(raw),
            None => Self::Miss,
        }
    }
}

/// A value returned by a repository read, tagged with where it came from.
///
/// Callers decide how to surface the tag (for example as a response header).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRead<T> {
    value: T,
    from_cache: bool,
}

impl<T> CacheRead<T> {
    /// A value served from the cache.
    pub fn from_cache(value: T) -> Self {
        Self {
            value,
            from_cache: true,
        }
    }

    /// A value loaded from the store.
    pub fn from_store(value: T) -> Self {
        Self {
            value,
            from_cache: false,
        }
    }

    /// Whether the value was served from the cache.
    pub fn is_from_cache(&self) -> bool {
        self.from_cache
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    /// Split into the value and the cache tag.
    pub fn into_parts(self) -> (T, bool) {
        (self.value, self.from_cache)
    }

    /// Transform the value, keeping the tag.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheRead<U> {
        CacheRead {
            value: f(self.value),
            from_cache: self.from_cache,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_from_option() {
        assert_eq!(CacheLookup::from(Some("x".to_string())), CacheLookup::Hit("x".into()));
        assert_eq!(CacheLookup::from(None), CacheLookup::Miss);
    }

    #[test]
    fn test_cache_read_map_keeps_tag() {
        let read = CacheRead::from_cache(vec![1, 2, 3]).map(|v| v.len());
        assert!(read.is_from_cache());
        assert_eq!(read.into_parts(), (3, true));
        assert!(!CacheRead::from_store(()).is_from_cache());
    }
}
