//! Tracing subscriber setup.

use openmusic_core::ConfigError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "openmusic_storage=debug,openmusic_db=debug,info";

/// Output format of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::InvalidValue {
                field: "OPENMUSIC_LOG_FORMAT".to_string(),
                value: other.to_string(),
                reason: "expected `pretty` or `json`".to_string(),
            }),
        }
    }
}

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Filter directives, used when `RUST_LOG` is unset
    pub filter: String,
    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::default(),
        }
    }
}

impl TelemetryConfig {
    /// Read `OPENMUSIC_LOG_FILTER` and `OPENMUSIC_LOG_FORMAT`.
    ///
    /// An unrecognized format falls back to pretty output.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            filter: std::env::var("OPENMUSIC_LOG_FILTER").unwrap_or(defaults.filter),
            format: std::env::var("OPENMUSIC_LOG_FORMAT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.format),
        }
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter. Fails if a
/// subscriber is already installed.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), ConfigError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| ConfigError::InvalidValue {
            field: "OPENMUSIC_LOG_FILTER".to_string(),
            value: config.filter.clone(),
            reason: e.to_string(),
        })?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match config.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
    result.map_err(|e| ConfigError::InitFailed {
        component: "tracing subscriber".to_string(),
        reason: e.to_string(),
    })?;

    tracing::info!(format = ?config.format, "Telemetry initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_default_filter() {
        let config = TelemetryConfig::default();
        assert_eq!(config.filter, "openmusic_storage=debug,openmusic_db=debug,info");
        assert_eq!(config.format, LogFormat::Pretty);
    }

    #[test]
    fn test_second_init_fails() {
        let config = TelemetryConfig::default();
        // The first call may race another test's subscriber; the second
        // always finds one installed.
        let _ = init_tracing(&config);
        assert!(matches!(
            init_tracing(&config),
            Err(ConfigError::InitFailed { .. })
        ));
    }
}
