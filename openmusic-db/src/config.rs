//! Environment-driven configuration.
//!
//! Every setting has a development default so a bare `from_env()` works
//! against a local Postgres and Redis.

use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use openmusic_core::ConfigError;
use openmusic_storage::{CacheConfig, RedisConfig};
use std::time::Duration;
use tokio_postgres::NoTls;

use crate::telemetry::TelemetryConfig;

// ============================================================================
// DATABASE
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Wait, create and recycle timeout for pooled connections
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "openmusic".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    ///
    /// Uses the libpq variable names (`PGHOST`, `PGPORT`, `PGDATABASE`,
    /// `PGUSER`, `PGPASSWORD`) plus `OPENMUSIC_DB_POOL_SIZE` and
    /// `OPENMUSIC_DB_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("PGHOST").unwrap_or(defaults.host),
            port: std::env::var("PGPORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            dbname: std::env::var("PGDATABASE").unwrap_or(defaults.dbname),
            user: std::env::var("PGUSER").unwrap_or(defaults.user),
            password: std::env::var("PGPASSWORD").unwrap_or_default(),
            max_size: std::env::var("OPENMUSIC_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size),
            timeout: std::env::var("OPENMUSIC_DB_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Create a connection pool from this configuration.
    ///
    /// No connection is opened here; the first acquisition connects.
    pub fn create_pool(&self) -> Result<Pool, ConfigError> {
        if self.max_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "OPENMUSIC_DB_POOL_SIZE".to_string(),
                value: "0".to_string(),
                reason: "pool needs at least one connection".to_string(),
            });
        }

        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_cfg = deadpool_postgres::PoolConfig::new(self.max_size);
        pool_cfg.timeouts.wait = Some(self.timeout);
        pool_cfg.timeouts.create = Some(self.timeout);
        pool_cfg.timeouts.recycle = Some(self.timeout);
        cfg.pool = Some(pool_cfg);

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ConfigError::InitFailed {
                component: "postgres pool".to_string(),
                reason: e.to_string(),
            })
    }
}

// ============================================================================
// APPLICATION
// ============================================================================

/// Everything [`crate::AppState::init`] needs.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub db: DbConfig,
    pub redis: RedisConfig,
    pub cache: CacheConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load every section from the environment.
    pub fn from_env() -> Self {
        Self {
            db: DbConfig::from_env(),
            redis: RedisConfig::from_env(),
            cache: CacheConfig::from_env(),
            telemetry: TelemetryConfig::from_env(),
        }
    }
}
