//! Redis cache backend.
//!
//! Each operation opens its own connection from the client, so a Redis
//! restart only fails the operations issued while it is down. Building the
//! backend does not touch the network.

use async_trait::async_trait;
use openmusic_core::{CacheError, ConfigError};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;

use super::lookup::CacheLookup;
use super::traits::{CacheBackend, CacheResult};

/// Connection settings for the Redis cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConfig {
    /// Redis host
    pub host: String,
    /// Redis port
    pub port: u16,
    /// Expiry applied to every entry written. `None` keeps entries until
    /// they are invalidated.
    pub entry_ttl: Option<Duration>,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            entry_ttl: Some(Duration::from_secs(1800)), // 30 minutes
        }
    }
}

impl RedisConfig {
    /// Create a configuration from environment variables.
    ///
    /// Environment variables:
    /// - `REDIS_SERVER`: host name (default: localhost)
    /// - `REDIS_PORT`: port (default: 6379)
    /// - `OPENMUSIC_CACHE_TTL_SECS`: entry expiry, `0` disables it (default: 1800)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var("REDIS_SERVER").unwrap_or(defaults.host);

        let port = std::env::var("REDIS_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let entry_ttl = match std::env::var("OPENMUSIC_CACHE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.entry_ttl,
        };

        Self {
            host,
            port,
            entry_ttl,
        }
    }

    /// Connection URL for the client.
    pub fn url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }
}

/// Cache backend talking to a Redis server.
#[derive(Clone)]
pub struct RedisCacheBackend {
    client: redis::Client,
    entry_ttl: Option<Duration>,
}

fn unavailable(err: redis::RedisError) -> CacheError {
    CacheError::Unavailable {
        reason: err.to_string(),
    }
}

impl RedisCacheBackend {
    /// Create the client. Only an invalid URL fails here; an unreachable
    /// server shows up as failed operations.
    pub fn new(config: &RedisConfig) -> Result<Self, ConfigError> {
        let client = redis::Client::open(config.url()).map_err(|e| ConfigError::InvalidValue {
            field: "redis url".to_string(),
            value: config.url(),
            reason: e.to_string(),
        })?;

        tracing::info!(url = %config.url(), ttl = ?config.entry_ttl, "Redis cache client created");

        Ok(Self {
            client,
            entry_ttl: config.entry_ttl,
        })
    }

    async fn connection(&self) -> CacheResult<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(unavailable)
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &str) -> CacheLookup {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(err) => return CacheLookup::Error(err),
        };
        let result: redis::RedisResult<Option<String>> = conn.get(key).await;
        match result {
            Ok(value) => value.into(),
            Err(err) => CacheLookup::Error(unavailable(err)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = self.entry_ttl {
            cmd.arg("EX").arg(ttl.as_secs().max(1));
        }
        let _: () = cmd.query_async(&mut conn).await.map_err(unavailable)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let _: i64 = conn.del(key).await.map_err(unavailable)?;
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RedisConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 6379);
        assert_eq!(config.entry_ttl, Some(Duration::from_secs(1800)));
        assert_eq!(config.url(), "redis://localhost:6379/");
    }

    fn unreachable_config() -> RedisConfig {
        RedisConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            entry_ttl: None,
        }
    }

    #[test]
    fn test_new_does_not_connect() {
        assert!(RedisCacheBackend::new(&unreachable_config()).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_per_operation() {
        let backend = RedisCacheBackend::new(&unreachable_config()).unwrap();

        assert!(matches!(
            backend.get("albums").await,
            CacheLookup::Error(CacheError::Unavailable { .. })
        ));
        assert!(matches!(
            backend.set("albums", "[]").await,
            Err(CacheError::Unavailable { .. })
        ));
        assert!(backend.delete("albums").await.is_err());
        assert!(backend.ping().await.is_err());
    }
}
