//! Check that the album store and the cache are reachable.
//!
//! Prints the health report as JSON and exits non-zero when the store is
//! down. Pass `--migrate` to create the schema before checking.

use openmusic_db::{init_tracing, AppConfig, AppState, HealthStatus};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let config = AppConfig::from_env();
    if let Err(e) = init_tracing(&config.telemetry) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let state = match AppState::init(&config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    if std::env::args().any(|arg| arg == "--migrate") {
        if let Err(e) = state.db.migrate().await {
            tracing::error!(error = %e, "Migration failed");
            state.shutdown();
            return ExitCode::FAILURE;
        }
    }

    let report = state.health().await;
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "Could not encode health report"),
    }
    state.shutdown();

    if report.status == HealthStatus::Unhealthy {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
