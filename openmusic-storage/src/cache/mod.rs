//! Cache-aside layer between the repository and the external cache store.
//!
//! The cache store is treated as an opaque string key-value service. This
//! module owns the key namespace, the read-through path and the mapping from
//! mutations to the keys they make stale.
//!
//! # Guarantees
//!
//! - A read never fails because of the cache. Lookup errors fall back to the
//!   store; population failures are logged and counted.
//! - Invalidation runs only after the store confirmed a mutation, and its
//!   failures never turn a successful mutation into an error.
//!
//! # Example
//!
//! ```ignore
//! let read = cache
//!     .read(&CacheKey::Album(id.clone()), || async { load_album(&id).await })
//!     .await?;
//!
//! if read.is_from_cache() {
//!     tracing::debug!("served from cache");
//! }
//! ```

pub mod invalidation;
pub mod keys;
pub mod lookup;
pub mod memory_backend;
pub mod read_through;
pub mod redis_backend;
pub mod traits;

pub use invalidation::Mutation;
pub use keys::CacheKey;
pub use lookup::{CacheLookup, CacheRead};
pub use memory_backend::InMemoryCacheBackend;
pub use read_through::{CacheConfig, ReadThroughCache};
pub use redis_backend::{RedisCacheBackend, RedisConfig};
pub use traits::{CacheBackend, CacheResult, CacheStats};
