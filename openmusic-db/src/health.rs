//! Store and cache health reporting.
//!
//! The store is required; the cache is an optimization. A cache that does
//! not answer degrades the service but does not make it unhealthy.

use openmusic_storage::{AlbumStore, CacheBackend, CacheStats, CachedAlbumRepository};
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentHealth {
    fn from_check<E: std::fmt::Display>(result: Result<(), E>, start: Instant, down: HealthStatus) -> Self {
        match result {
            Ok(()) => Self {
                status: HealthStatus::Healthy,
                latency_ms: Some(start.elapsed().as_millis() as u64),
                error: None,
            },
            Err(e) => Self {
                status: down,
                latency_ms: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Cache counters as reported by the health check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheUsage {
    pub hits: u64,
    pub misses: u64,
    pub lookup_errors: u64,
    pub populate_failures: u64,
    pub invalidation_failures: u64,
    pub hit_rate: f64,
}

impl From<CacheStats> for CacheUsage {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            lookup_errors: stats.lookup_errors,
            populate_failures: stats.populate_failures,
            invalidation_failures: stats.invalidation_failures,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub store: ComponentHealth,
    pub cache: ComponentHealth,
    pub cache_usage: CacheUsage,
    /// Open store connections, when the store is pooled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_size: Option<usize>,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Ping the store and the cache independently and combine the results.
pub async fn check_health<S, C>(
    repo: &CachedAlbumRepository<S, C>,
    start_time: Instant,
) -> HealthReport
where
    S: AlbumStore,
    C: CacheBackend,
{
    let start = Instant::now();
    let store = ComponentHealth::from_check(repo.store().ping().await, start, HealthStatus::Unhealthy);

    let start = Instant::now();
    let cache = ComponentHealth::from_check(repo.cache().ping().await, start, HealthStatus::Degraded);

    let status = match (store.status, cache.status) {
        (HealthStatus::Healthy, HealthStatus::Healthy) => HealthStatus::Healthy,
        (HealthStatus::Healthy, _) => HealthStatus::Degraded,
        _ => HealthStatus::Unhealthy,
    };

    HealthReport {
        status,
        store,
        cache,
        cache_usage: repo.cache_stats().into(),
        pool_size: None,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: start_time.elapsed().as_secs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openmusic_storage::{CacheConfig, InMemoryAlbumStore, InMemoryCacheBackend};
    use openmusic_test_utils::{FailingCacheBackend, FlakyCacheBackend};
    use std::sync::Arc;
    use std::time::Duration;

    fn repo<C: CacheBackend>(cache: C) -> (CachedAlbumRepository<InMemoryAlbumStore, C>, InMemoryAlbumStore) {
        let store = InMemoryAlbumStore::new();
        let repo = CachedAlbumRepository::new(
            Arc::new(store.clone()),
            Arc::new(cache),
            CacheConfig::default(),
        );
        (repo, store)
    }

    #[tokio::test]
    async fn test_all_components_up() {
        let (repo, _store) = repo(InMemoryCacheBackend::new());
        let report = check_health(&repo, Instant::now()).await;
        assert_eq!(report.status, HealthStatus::Healthy);
        assert!(report.store.latency_ms.is_some());
        assert!(report.cache.error.is_none());
    }

    #[tokio::test]
    async fn test_store_down_is_unhealthy() {
        let (repo, store) = repo(InMemoryCacheBackend::new());
        store.set_unavailable(true);

        let report = check_health(&repo, Instant::now()).await;
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert_eq!(report.store.status, HealthStatus::Unhealthy);
        assert_eq!(report.cache.status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_cache_down_is_degraded() {
        let (repo, _store) = repo(FailingCacheBackend);

        let report = check_health(&repo, Instant::now()).await;
        assert_eq!(report.status, HealthStatus::Degraded);
        assert_eq!(report.store.status, HealthStatus::Healthy);
        assert_eq!(report.cache.status, HealthStatus::Degraded);
        assert!(report.cache.error.is_some());
        assert!(report.cache.latency_ms.is_none());
    }

    #[tokio::test]
    async fn test_stalled_cache_is_degraded() {
        let cache = FlakyCacheBackend::new();
        cache.set_delay(Duration::from_millis(200));
        let store = InMemoryAlbumStore::new();
        let repo = CachedAlbumRepository::new(
            Arc::new(store),
            Arc::new(cache),
            CacheConfig::default().with_op_timeout(Duration::from_millis(20)),
        );

        let report = check_health(&repo, Instant::now()).await;
        assert_eq!(report.status, HealthStatus::Degraded);
        assert_eq!(report.store.status, HealthStatus::Healthy);
        assert_eq!(report.cache.status, HealthStatus::Degraded);
    }

    #[test]
    fn test_report_serialization() {
        let report = HealthReport {
            status: HealthStatus::Degraded,
            store: ComponentHealth {
                status: HealthStatus::Healthy,
                latency_ms: Some(2),
                error: None,
            },
            cache: ComponentHealth {
                status: HealthStatus::Degraded,
                latency_ms: None,
                error: Some("Cache unavailable: refused".to_string()),
            },
            cache_usage: CacheStats::default().into(),
            pool_size: Some(3),
            version: "0.1.0".to_string(),
            uptime_seconds: 5,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "degraded");
        assert!(json["store"].get("error").is_none());
        assert_eq!(json["cache"]["error"], "Cache unavailable: refused");
        assert_eq!(json["pool_size"], 3);
    }
}
