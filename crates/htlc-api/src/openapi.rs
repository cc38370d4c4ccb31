//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into one OpenAPI document served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the HTLC API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "HTLC Escrow API",
        version = "0.1.0",
        description = "Hashed timelock contracts over an in-memory escrow ledger: fund, claim with a preimage, refund after expiry.",
        license(name = "BUSL-1.1")
    ),
    paths(
        // HTLCs
        crate::routes::htlcs::fund_htlc,
        crate::routes::htlcs::get_htlc,
        crate::routes::htlcs::claim_htlc,
        crate::routes::htlcs::refund_htlc,
        crate::routes::htlcs::escrow_summary,
        // Accounts
        crate::routes::accounts::get_balance,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::htlcs::FundRequest,
        crate::routes::htlcs::ClaimRequest,
        crate::routes::htlcs::HtlcResponse,
        crate::routes::htlcs::SettlementResponse,
        crate::routes::htlcs::EscrowSummary,
        crate::routes::accounts::BalanceResponse,
    )),
    tags(
        (name = "htlcs", description = "HTLC lifecycle"),
        (name = "accounts", description = "Account balances"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_operation() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/v1/htlcs",
            "/v1/htlcs/{id}",
            "/v1/htlcs/{id}/claim",
            "/v1/htlcs/{id}/refund",
            "/v1/escrow",
            "/v1/accounts/{account}/balance",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing {expected}"
            );
        }
    }
}
