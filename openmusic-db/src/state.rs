//! Application state and its lifecycle.
//!
//! `AppState::init` builds the pool and the cache client once at
//! startup, handlers share clones of the state, and `AppState::shutdown`
//! closes the pool. Nothing here is a process-wide singleton.

use openmusic_core::ConfigError;
use openmusic_storage::{CachedAlbumRepository, RedisCacheBackend};
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppConfig;
use crate::db::DbClient;
use crate::health::{check_health, HealthReport};
use crate::pg_store::PgAlbumStore;

/// The repository wired to its production collaborators.
pub type AlbumRepository = CachedAlbumRepository<PgAlbumStore, RedisCacheBackend>;

/// Application-wide state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Pool handle, for schema management and shutdown.
    pub db: DbClient,
    /// Cache-aside album repository.
    pub albums: AlbumRepository,
    pub start_time: Instant,
}

impl AppState {
    /// Create the pool and the cache client and wire the repository.
    ///
    /// Neither connects here. An unreachable store or cache shows up in
    /// [`AppState::health`] and in the operations that need it.
    pub fn init(config: &AppConfig) -> Result<Self, ConfigError> {
        let db = DbClient::from_config(&config.db)?;
        let cache = RedisCacheBackend::new(&config.redis)?;

        let albums = CachedAlbumRepository::new(
            Arc::new(PgAlbumStore::new(db.clone())),
            Arc::new(cache),
            config.cache.clone(),
        );

        tracing::info!(
            db_host = %config.db.host,
            db_name = %config.db.dbname,
            pool_max_size = config.db.max_size,
            "Application state initialized"
        );

        Ok(Self {
            db,
            albums,
            start_time: Instant::now(),
        })
    }

    /// Report store and cache health, with the pool size.
    pub async fn health(&self) -> HealthReport {
        let mut report = check_health(&self.albums, self.start_time).await;
        report.pool_size = Some(self.db.pool_size());
        report
    }

    /// Close the pool. In-flight operations finish with the connection they
    /// hold; new acquisitions fail.
    pub fn shutdown(&self) {
        self.db.close();
        let stats = self.albums.cache_stats();
        tracing::info!(
            uptime_seconds = self.start_time.elapsed().as_secs(),
            cache_hits = stats.hits,
            cache_misses = stats.misses,
            invalidation_failures = stats.invalidation_failures,
            "Application state shut down"
        );
    }
}
