//! # htlc-api: Axum Service for the HTLC Escrow Ledger
//!
//! Exposes one shared [`EscrowLedger`](htlc_escrow::EscrowLedger) over
//! HTTP. Every `/v1` request is made on behalf of the account named by its
//! bearer credential; the ledger decides whether that account may act.
//!
//! ## API Surface
//!
//! | Prefix                      | Module                 | Domain            |
//! |-----------------------------|------------------------|-------------------|
//! | `/v1/htlcs/*`, `/v1/escrow` | [`routes::htlcs`]      | HTLC lifecycle    |
//! | `/v1/accounts/*`            | [`routes::accounts`]   | Bank balances     |
//! | `/openapi.json`             | [`openapi`]            | API document      |
//! | `/health/*`                 | this module            | Probes (no auth)  |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer -> AuthMiddleware -> Handler
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) are mounted outside the auth middleware
/// so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig::new(state.config.api_tokens.clone());

    // Authenticated API routes.
    let api = Router::new()
        .merge(routes::htlcs::router())
        .merge(routes::accounts::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(middleware::tracing_layer::layer())
        .layer(axum::Extension(auth_config))
        .with_state(state);

    // Unauthenticated health probes.
    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe. Always 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. The ledger is in memory, so the service is ready as
/// soon as it serves.
async fn readiness() -> &'static str {
    "ready"
}
