//! Process-local cache backend.
//!
//! Used when no external cache is configured and as the backing map of test
//! doubles. Entries never expire.

use async_trait::async_trait;
use openmusic_core::CacheError;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::lookup::CacheLookup;
use super::traits::{CacheBackend, CacheResult};

/// In-memory string key-value cache.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCacheBackend {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

fn poisoned() -> CacheError {
    CacheError::Unavailable {
        reason: "cache lock poisoned".to_string(),
    }
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> CacheResult<RwLockReadGuard<'_, HashMap<String, String>>> {
        self.entries.read().map_err(|_| poisoned())
    }

    fn write(&self) -> CacheResult<RwLockWriteGuard<'_, HashMap<String, String>>> {
        self.entries.write().map_err(|_| poisoned())
    }

    /// Raw value stored under `key`, bypassing statistics.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.read().ok().and_then(|entries| entries.get(key).cloned())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.read()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }

    /// Overwrite an entry directly, e.g. to plant a stale value.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut entries) = self.write() {
            entries.insert(key.into(), value.into());
        }
    }

    /// Sorted list of present keys.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .read()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.write() {
            entries.clear();
        }
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get(&self, key: &str) -> CacheLookup {
        match self.read() {
            Ok(entries) => entries.get(key).cloned().into(),
            Err(err) => CacheLookup::Error(err),
        }
    }

    async fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        self.write()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.write()?.remove(key);
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        self.read().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set_delete() {
        let cache = InMemoryCacheBackend::new();
        assert_eq!(cache.get("albums").await, CacheLookup::Miss);

        cache.set("albums", "[]").await.unwrap();
        assert_eq!(cache.get("albums").await, CacheLookup::Hit("[]".to_string()));

        cache.delete("albums").await.unwrap();
        assert_eq!(cache.get("albums").await, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_delete_absent_key_is_ok() {
        let cache = InMemoryCacheBackend::new();
        assert!(cache.delete("album:missing").await.is_ok());
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = InMemoryCacheBackend::new();
        let other = cache.clone();
        cache.set("likes:album-1", "[]").await.unwrap();
        assert!(other.contains_key("likes:album-1"));
        assert_eq!(other.keys(), vec!["likes:album-1".to_string()]);
    }
}
