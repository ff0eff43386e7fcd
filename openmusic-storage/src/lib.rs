//! OpenMusic Storage - Cache-Aside Consistency Layer
//!
//! Sits between request handlers and the relational store. Reads are served
//! from the cache when possible and fall through to the store otherwise;
//! writes go to the store and then evict exactly the cache keys they made
//! stale.
//!
//! The Postgres store lives in openmusic-db.

pub mod cache;
pub mod memory_store;
pub mod repository;
pub mod store;

pub use cache::{
    CacheBackend, CacheConfig, CacheKey, CacheLookup, CacheRead, CacheResult, CacheStats,
    InMemoryCacheBackend, Mutation, ReadThroughCache, RedisCacheBackend, RedisConfig,
};
pub use memory_store::{InMemoryAlbumStore, LikeRow};
pub use repository::CachedAlbumRepository;
pub use store::{AlbumStore, StorageResult};
