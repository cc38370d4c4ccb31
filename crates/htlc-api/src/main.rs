//! # htlc-api: Binary Entry Point
//!
//! Loads configuration from the environment, mints genesis balances, and
//! serves the escrow API on `0.0.0.0:$PORT` (default 8080).

use std::sync::Arc;

use htlc_api::config::{AppConfig, LogFormat};
use htlc_api::state::AppState;
use htlc_escrow::SystemClock;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configuration first: the log format depends on it.
    let config = AppConfig::from_env()?;

    // Initialize structured tracing.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    if config.api_tokens.is_none() {
        tracing::warn!(
            "HTLC_API_TOKENS not set; bearer values are accepted as account names"
        );
    }

    let port = config.port;
    let state = AppState::from_config(config, Arc::new(SystemClock::new())).map_err(|e| {
        tracing::error!("genesis minting failed: {e}");
        e
    })?;

    let app = htlc_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("HTLC API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
