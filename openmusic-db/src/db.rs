//! Database Connection Pool Module
//!
//! `DbClient` owns the deadpool-postgres pool. Callers acquire one pooled
//! connection per statement and drop it before doing anything else, so no
//! connection is held across unrelated awaits.

use deadpool_postgres::{Object, Pool, PoolError};
use openmusic_core::{ConfigError, StorageError};
use tokio_postgres::error::SqlState;

use crate::config::DbConfig;
use crate::schema::SCHEMA_SQL;
use openmusic_storage::StorageResult;

// ============================================================================
// ERROR MAPPING
// ============================================================================

/// Map a driver error to the store taxonomy.
///
/// Unique and foreign-key violations are constraint violations; anything
/// else is an outage. Driver details are logged, not returned.
pub(crate) fn storage_error(err: tokio_postgres::Error) -> StorageError {
    if let Some(db_err) = err.as_db_error() {
        let code = db_err.code();
        if *code == SqlState::UNIQUE_VIOLATION || *code == SqlState::FOREIGN_KEY_VIOLATION {
            return StorageError::ConstraintViolation {
                constraint: db_err.constraint().unwrap_or("unknown").to_string(),
                reason: db_err.message().to_string(),
            };
        }
    }

    tracing::error!("Database error: {:?}", err);
    StorageError::Unavailable {
        reason: "database operation failed".to_string(),
    }
}

/// Map a pool acquisition error to the store taxonomy.
pub(crate) fn pool_error(err: PoolError) -> StorageError {
    tracing::error!("Connection pool error: {:?}", err);

    let reason = match err {
        PoolError::Timeout(_) => "connection pool exhausted",
        PoolError::Closed => "connection pool is closed",
        _ => "failed to acquire database connection",
    };
    StorageError::Unavailable {
        reason: reason.to_string(),
    }
}

/// Whether a driver error is a foreign-key violation.
pub(crate) fn is_foreign_key_violation(err: &tokio_postgres::Error) -> bool {
    err.code() == Some(&SqlState::FOREIGN_KEY_VIOLATION)
}

// ============================================================================
// DATABASE CLIENT
// ============================================================================

/// Handle to the connection pool. Clones share the pool.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> Result<Self, ConfigError> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Current number of pooled connections, idle or in use.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Get a connection from the pool.
    pub(crate) async fn get_conn(&self) -> StorageResult<Object> {
        self.pool.get().await.map_err(pool_error)
    }

    /// Create the schema if it does not exist yet.
    pub async fn migrate(&self) -> StorageResult<()> {
        let conn = self.get_conn().await?;
        conn.batch_execute(SCHEMA_SQL).await.map_err(storage_error)?;
        tracing::info!("Database schema is up to date");
        Ok(())
    }

    /// Round-trip a trivial query.
    pub async fn health_check(&self) -> StorageResult<()> {
        let conn = self.get_conn().await?;
        conn.query_one("SELECT 1", &[]).await.map_err(storage_error)?;
        Ok(())
    }

    /// Close the pool.
    ///
    /// Further acquisitions fail with a closed-pool error; connections
    /// currently checked out are dropped when returned.
    pub fn close(&self) {
        self.pool.close();
        tracing::info!("Database pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
