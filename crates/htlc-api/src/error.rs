//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps ledger and validation errors to HTTP status codes with a JSON body
//! carrying a stable error code. Internal failure details are logged, never
//! returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use htlc_escrow::{EscrowError, TransferError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "EXPIRED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional context, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A ledger call was rejected. Status depends on the rejection kind.
    #[error(transparent)]
    Escrow(#[from] EscrowError),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Escrow(err) => escrow_status(err),
        }
    }

    fn is_internal(&self) -> bool {
        self.status_and_code().0 == StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn escrow_status(err: &EscrowError) -> (StatusCode, &'static str) {
    let status = match err {
        EscrowError::ZeroValue { .. } | EscrowError::InvalidPreimage { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EscrowError::DuplicateId { .. }
        | EscrowError::Expired { .. }
        | EscrowError::NotExpired { .. } => StatusCode::CONFLICT,
        EscrowError::NotFound { .. } => StatusCode::NOT_FOUND,
        EscrowError::Unauthorized { .. } => StatusCode::FORBIDDEN,
        EscrowError::Transfer {
            source: TransferError::InsufficientFunds { .. },
            ..
        } => StatusCode::UNPROCESSABLE_ENTITY,
        EscrowError::Transfer { .. } => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR");
        }
    };
    (status, err.kind())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if self.is_internal() {
            tracing::error!(error = %self, "internal server error");
        }

        let (message, details) = match &self {
            _ if self.is_internal() => ("An internal error occurred".to_string(), None),
            Self::Escrow(err) => (
                err.to_string(),
                Some(serde_json::json!({ "htlc_id": err.htlc_id().to_hex() })),
            ),
            other => (other.to_string(), None),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Convert primitive validation errors to API errors.
impl From<htlc_core::ValidationError> for AppError {
    fn from(err: htlc_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use htlc_core::{AccountId, Amount, HtlcId, Timestamp};
    use http_body_util::BodyExt;

    fn id() -> HtlcId {
        HtlcId::from_bytes([0xab; 32])
    }

    fn status_of(err: EscrowError) -> (StatusCode, &'static str) {
        AppError::from(err).status_and_code()
    }

    #[test]
    fn escrow_errors_map_to_documented_statuses() {
        let t = Timestamp::from_secs(1);
        let caller = AccountId::new("mallory").unwrap();
        let cases = [
            (
                EscrowError::ZeroValue { htlc_id: id() },
                StatusCode::UNPROCESSABLE_ENTITY,
                "ZERO_VALUE",
            ),
            (
                EscrowError::DuplicateId { htlc_id: id() },
                StatusCode::CONFLICT,
                "DUPLICATE_ID",
            ),
            (
                EscrowError::NotFound { htlc_id: id() },
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                EscrowError::Unauthorized {
                    htlc_id: id(),
                    caller,
                    operation: "claim",
                },
                StatusCode::FORBIDDEN,
                "UNAUTHORIZED_CALLER",
            ),
            (
                EscrowError::InvalidPreimage { htlc_id: id() },
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_PREIMAGE",
            ),
            (
                EscrowError::Expired {
                    htlc_id: id(),
                    timelock: t,
                    now: t,
                },
                StatusCode::CONFLICT,
                "EXPIRED",
            ),
            (
                EscrowError::NotExpired {
                    htlc_id: id(),
                    timelock: t,
                    now: t,
                },
                StatusCode::CONFLICT,
                "NOT_EXPIRED",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(status_of(err), (status, code));
        }
    }

    #[test]
    fn insufficient_funds_is_a_client_error() {
        let err = EscrowError::Transfer {
            htlc_id: id(),
            operation: "fund",
            source: TransferError::InsufficientFunds {
                account: AccountId::new("alice").unwrap(),
                requested: Amount::new(2),
                available: Amount::new(1),
            },
        };
        assert_eq!(
            status_of(err),
            (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_FUNDS")
        );
    }

    #[test]
    fn other_transfer_failures_are_internal() {
        let err = EscrowError::Transfer {
            htlc_id: id(),
            operation: "claim",
            source: TransferError::Unavailable("ledger backend".into()),
        };
        assert_eq!(
            status_of(err),
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        );
    }

    #[test]
    fn plain_variants_map_to_fixed_statuses() {
        assert_eq!(
            AppError::BadRequest("x".into()).status_and_code(),
            (StatusCode::BAD_REQUEST, "BAD_REQUEST")
        );
        assert_eq!(
            AppError::Validation("x".into()).status_and_code(),
            (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
        );
        assert_eq!(
            AppError::Unauthorized("x".into()).status_and_code(),
            (StatusCode::UNAUTHORIZED, "UNAUTHORIZED")
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_and_code(),
            (StatusCode::NOT_FOUND, "NOT_FOUND")
        );
    }

    #[test]
    fn validation_error_from_htlc_core() {
        let core_err = htlc_core::ValidationError::InvalidAccountId("a b".to_string());
        match AppError::from(core_err) {
            AppError::Validation(msg) => assert!(msg.contains("a b"), "got: {msg}"),
            other => panic!("expected Validation, got: {other:?}"),
        }
    }

    // ── into_response tests ──────────────────────────────────────

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn escrow_error_body_carries_htlc_id() {
        let (status, body) =
            response_parts(EscrowError::NotFound { htlc_id: id() }.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error.code, "NOT_FOUND");
        assert_eq!(
            body.error.details.unwrap()["htlc_id"],
            serde_json::json!("ab".repeat(32))
        );
    }

    #[tokio::test]
    async fn internal_transfer_failure_hides_details() {
        let err = EscrowError::Transfer {
            htlc_id: id(),
            operation: "refund",
            source: TransferError::Unavailable("core ledger timeout".into()),
        };
        let (status, body) = response_parts(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.message, "An internal error occurred");
        assert!(!body.error.message.contains("timeout"));
        assert!(body.error.details.is_none());
    }

    #[tokio::test]
    async fn validation_error_body() {
        let (status, body) = response_parts(AppError::Validation("bad hex".into())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error.code, "VALIDATION_ERROR");
        assert!(body.error.message.contains("bad hex"));
    }

    #[test]
    fn error_body_omits_empty_details() {
        let body = ErrorBody {
            error: ErrorDetail {
                code: "TEST".to_string(),
                message: "test message".to_string(),
                details: None,
            },
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("TEST"));
        assert!(!json.contains("details"));
    }
}
