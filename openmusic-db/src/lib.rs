//! OpenMusic DB - PostgreSQL Store and Application Wiring
//!
//! - `PgAlbumStore`: the album store over a deadpool-postgres pool
//! - `DbConfig` / `AppConfig`: environment-driven configuration
//! - `init_tracing`: tracing subscriber setup
//! - `AppState`: startup, health and shutdown of the shared resources

pub mod config;
pub mod db;
pub mod health;
pub mod pg_store;
pub mod schema;
pub mod state;
pub mod telemetry;

pub use config::{AppConfig, DbConfig};
pub use db::DbClient;
pub use health::{check_health, CacheUsage, ComponentHealth, HealthReport, HealthStatus};
pub use pg_store::PgAlbumStore;
pub use schema::SCHEMA_SQL;
pub use state::{AlbumRepository, AppState};
pub use telemetry::{init_tracing, LogFormat, TelemetryConfig};
