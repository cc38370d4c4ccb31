//! # Account Balances
//!
//! Read-only view of the in-memory bank backing the ledger.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use htlc_core::AccountId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::state::AppState;

/// Balance of one account.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    pub account: String,
    /// Decimal string in the smallest unit.
    pub balance: String,
}

/// Build the accounts router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/accounts/:account/balance", get(get_balance))
}

/// GET /v1/accounts/:account/balance: Balance of an account. Unknown
/// accounts hold zero.
#[utoipa::path(
    get,
    path = "/v1/accounts/{account}/balance",
    params(("account" = String, Path, description = "Account identifier")),
    responses(
        (status = 200, description = "Account balance", body = BalanceResponse),
        (status = 422, description = "Malformed account identifier", body = crate::error::ErrorBody),
    ),
    tag = "accounts"
)]
pub(crate) async fn get_balance(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> Result<Json<BalanceResponse>, AppError> {
    let account = AccountId::new(account)?;
    Ok(Json(BalanceResponse {
        balance: state.bank.balance(&account).to_string(),
        account: account.to_string(),
    }))
}
