//! weather-server – entry point.
//!
//! Startup order:
//! 1. Load configuration (config file, then `WEATHER_*` environment overrides).
//! 2. Initialise tracing (JSON or human-readable).
//! 3. Build the upstream provider; fail fast without an API key.
//! 4. Open the history database and run pending migrations.
//! 5. Serve the HTTP API until SIGINT/SIGTERM, then close the database.

mod error;
mod routes;
mod state;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use weather_core::{Config, SqliteHistoryStore, WeatherService, provider_from_config};

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::load()?;

    init_tracing(&cfg);
    info!(version = env!("CARGO_PKG_VERSION"), "weather-server starting");

    let provider = provider_from_config(&cfg)?;

    let store = SqliteHistoryStore::connect(&cfg.server.database_url)
        .await
        .with_context(|| format!("Failed to open history database {}", cfg.server.database_url))?;
    info!(database_url = %cfg.server.database_url, "database ready");

    let service = WeatherService::new(provider, Arc::new(store))
        .with_record_empty_searches(cfg.server.record_empty_searches);
    let state = Arc::new(AppState { service: service.clone() });

    let app = routes::build(state);
    let bind = cfg.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    let addr = listener.local_addr()?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    service.shutdown().await;
    info!("weather-server stopped");
    Ok(())
}

fn init_tracing(cfg: &Config) {
    // RUST_LOG wins over the configured level.
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.server.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: WEATHER_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.server.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);

    if cfg.server.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
