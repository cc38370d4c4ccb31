//! # HTLC Operations API
//!
//! Funds, inspects, claims, and refunds hashed timelock contracts on the
//! shared escrow ledger. The authenticated caller is the sender for `fund`
//! and `refund` and the recipient for `claim`.
//!
//! ## Endpoints
//!
//! - `POST /v1/htlcs`: lock value under a hashlock and timelock.
//! - `GET /v1/htlcs/:id`: active HTLC by id.
//! - `POST /v1/htlcs/:id/claim`: release to the recipient against the preimage.
//! - `POST /v1/htlcs/:id/refund`: return to the sender after expiry.
//! - `GET /v1/escrow`: active count and escrowed total.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use htlc_core::{AccountId, Amount, Hashlock, HtlcId, Preimage, Timestamp, ValidationError};
use htlc_escrow::{Htlc, HtlcTerms, Settlement};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

/// Request to fund a new HTLC. The caller becomes the sender.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FundRequest {
    /// 32-byte identifier, hex (optional `0x` prefix).
    pub id: String,
    /// Account allowed to claim.
    pub recipient: String,
    /// SHA-256 of the secret preimage, hex.
    pub hashlock: String,
    /// Value to lock, decimal string in the smallest unit.
    pub amount: String,
    /// Absolute expiry, seconds since the Unix epoch.
    pub timelock: u64,
}

impl Validate for FundRequest {
    type Validated = HtlcTerms;

    fn validate(self) -> Result<HtlcTerms, ValidationError> {
        Ok(HtlcTerms {
            id: HtlcId::from_hex(&self.id)?,
            recipient: AccountId::new(self.recipient)?,
            hashlock: Hashlock::from_hex(&self.hashlock)?,
            amount: Amount::parse(&self.amount)?,
            timelock: Timestamp::from_secs(self.timelock),
        })
    }
}

/// Request to claim an HTLC.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ClaimRequest {
    /// The secret preimage, hex. May be empty.
    pub preimage: String,
}

impl Validate for ClaimRequest {
    type Validated = Preimage;

    fn validate(self) -> Result<Preimage, ValidationError> {
        Preimage::from_hex(&self.preimage)
    }
}

/// An active or just-resolved HTLC.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HtlcResponse {
    pub id: String,
    pub sender: String,
    pub recipient: String,
    pub hashlock: String,
    /// Decimal string in the smallest unit.
    pub amount: String,
    /// Seconds since the Unix epoch.
    pub timelock: u64,
    /// The timelock rendered as ISO 8601 UTC.
    pub timelock_utc: String,
    /// `FUNDED`, `CLAIMED`, or `REFUNDED`.
    pub state: String,
}

impl From<&Htlc> for HtlcResponse {
    fn from(htlc: &Htlc) -> Self {
        Self {
            id: htlc.id.to_hex(),
            sender: htlc.sender.to_string(),
            recipient: htlc.recipient.to_string(),
            hashlock: htlc.hashlock.to_hex(),
            amount: htlc.amount.to_string(),
            timelock: htlc.timelock.as_secs(),
            timelock_utc: htlc.timelock.to_string(),
            state: htlc.state.as_str().to_string(),
        }
    }
}

/// Outcome of a successful claim or refund.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SettlementResponse {
    pub htlc: HtlcResponse,
    /// Account the value was paid to.
    pub paid_to: String,
    /// Revealed preimage, hex. Present for claims only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preimage: Option<String>,
    /// Clock reading at settlement, seconds since the Unix epoch.
    pub settled_at: u64,
}

impl From<Settlement> for SettlementResponse {
    fn from(s: Settlement) -> Self {
        Self {
            htlc: HtlcResponse::from(&s.htlc),
            paid_to: s.paid_to.to_string(),
            preimage: s.preimage.map(|p| p.to_hex()),
            settled_at: s.settled_at.as_secs(),
        }
    }
}

/// Escrow-wide totals.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EscrowSummary {
    /// Number of active HTLCs.
    pub active_htlcs: usize,
    /// Sum of active HTLC amounts, decimal string.
    pub total_escrowed: String,
    /// Balance of the bank's escrow pool, decimal string. Equals
    /// `total_escrowed` while the ledger is the pool's only user.
    pub pool_balance: String,
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the HTLC router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/htlcs", post(fund_htlc))
        .route("/v1/htlcs/:id", get(get_htlc))
        .route("/v1/htlcs/:id/claim", post(claim_htlc))
        .route("/v1/htlcs/:id/refund", post(refund_htlc))
        .route("/v1/escrow", get(escrow_summary))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/htlcs: Lock value for a recipient.
#[utoipa::path(
    post,
    path = "/v1/htlcs",
    request_body = FundRequest,
    responses(
        (status = 201, description = "HTLC funded", body = HtlcResponse),
        (status = 400, description = "Malformed body", body = crate::error::ErrorBody),
        (status = 401, description = "Missing or invalid credentials", body = crate::error::ErrorBody),
        (status = 409, description = "Identifier already active", body = crate::error::ErrorBody),
        (status = 422, description = "Zero amount, invalid field, or insufficient funds", body = crate::error::ErrorBody),
    ),
    tag = "htlcs"
)]
pub(crate) async fn fund_htlc(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<FundRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<HtlcResponse>), AppError> {
    let terms = extract_validated_json(body)?;
    let htlc = state.ledger.fund(&caller.account, terms)?;
    Ok((StatusCode::CREATED, Json(HtlcResponse::from(&htlc))))
}

/// GET /v1/htlcs/:id: Inspect an active HTLC.
#[utoipa::path(
    get,
    path = "/v1/htlcs/{id}",
    params(("id" = String, Path, description = "HTLC identifier, hex")),
    responses(
        (status = 200, description = "Active HTLC", body = HtlcResponse),
        (status = 404, description = "No active HTLC with this id", body = crate::error::ErrorBody),
        (status = 422, description = "Malformed id", body = crate::error::ErrorBody),
    ),
    tag = "htlcs"
)]
pub(crate) async fn get_htlc(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HtlcResponse>, AppError> {
    let htlc_id = HtlcId::from_hex(&id)?;
    state
        .ledger
        .get(&htlc_id)
        .map(|htlc| Json(HtlcResponse::from(&htlc)))
        .ok_or_else(|| AppError::NotFound(format!("htlc {htlc_id} not found")))
}

/// POST /v1/htlcs/:id/claim: Release to the recipient.
#[utoipa::path(
    post,
    path = "/v1/htlcs/{id}/claim",
    params(("id" = String, Path, description = "HTLC identifier, hex")),
    request_body = ClaimRequest,
    responses(
        (status = 200, description = "Claimed", body = SettlementResponse),
        (status = 403, description = "Caller is not the recipient", body = crate::error::ErrorBody),
        (status = 404, description = "No active HTLC with this id", body = crate::error::ErrorBody),
        (status = 409, description = "Timelock reached", body = crate::error::ErrorBody),
        (status = 422, description = "Preimage does not match", body = crate::error::ErrorBody),
    ),
    tag = "htlcs"
)]
pub(crate) async fn claim_htlc(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
    body: Result<Json<ClaimRequest>, JsonRejection>,
) -> Result<Json<SettlementResponse>, AppError> {
    let htlc_id = HtlcId::from_hex(&id)?;
    let preimage = extract_validated_json(body)?;
    let settlement = state.ledger.claim(&caller.account, &htlc_id, preimage)?;
    Ok(Json(settlement.into()))
}

/// POST /v1/htlcs/:id/refund: Return to the sender after expiry.
#[utoipa::path(
    post,
    path = "/v1/htlcs/{id}/refund",
    params(("id" = String, Path, description = "HTLC identifier, hex")),
    responses(
        (status = 200, description = "Refunded", body = SettlementResponse),
        (status = 403, description = "Caller is not the sender", body = crate::error::ErrorBody),
        (status = 404, description = "No active HTLC with this id", body = crate::error::ErrorBody),
        (status = 409, description = "Timelock not yet reached", body = crate::error::ErrorBody),
    ),
    tag = "htlcs"
)]
pub(crate) async fn refund_htlc(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> Result<Json<SettlementResponse>, AppError> {
    let htlc_id = HtlcId::from_hex(&id)?;
    let settlement = state.ledger.refund(&caller.account, &htlc_id)?;
    Ok(Json(settlement.into()))
}

/// GET /v1/escrow: Active count and escrowed total.
#[utoipa::path(
    get,
    path = "/v1/escrow",
    responses(
        (status = 200, description = "Escrow totals", body = EscrowSummary),
    ),
    tag = "htlcs"
)]
pub(crate) async fn escrow_summary(State(state): State<AppState>) -> Json<EscrowSummary> {
    Json(EscrowSummary {
        active_htlcs: state.ledger.len(),
        total_escrowed: state.ledger.total_escrowed().to_string(),
        pool_balance: state.bank.escrow_balance().to_string(),
    })
}
