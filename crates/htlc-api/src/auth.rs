//! # Caller Authentication
//!
//! Every `/v1` operation acts on behalf of exactly one account: the sender
//! for `fund` and `refund`, the recipient for `claim`. The middleware maps
//! the `Authorization: Bearer` header to that account and injects a
//! [`CallerIdentity`] into the request extensions.
//!
//! ## Token Format
//!
//! ```text
//! Bearer {token}     # HTLC_API_TOKENS set: token bound to one account
//! Bearer {account}   # development mode: the value names the account
//! ```
//!
//! ## Security Invariant
//!
//! Token lookup compares the presented token against every configured token
//! in constant time and never short-circuits, so response timing does not
//! reveal which account's token was closest.

use std::sync::Arc;

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use htlc_core::AccountId;
use subtle::{Choice, ConstantTimeEq};

use crate::config::ApiToken;
use crate::error::{AppError, ErrorBody, ErrorDetail};

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// The authenticated account behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// The account the caller acts as.
    pub account: AccountId,
}

/// Extracts the identity that the auth middleware injected into extensions.
/// Returns 401 if no identity is present.
#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the token values.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// Account-bound tokens. `None` enables development mode.
    pub tokens: Option<Arc<[ApiToken]>>,
}

impl AuthConfig {
    /// Build from the configured token list.
    pub fn new(tokens: Option<Vec<ApiToken>>) -> Self {
        Self {
            tokens: tokens.map(Arc::from),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "tokens",
                &self.tokens.as_ref().map(|t| format!("[REDACTED; {}]", t.len())),
            )
            .finish()
    }
}

// ── Token Validation ────────────────────────────────────────────────────────

/// Constant-time comparison of bearer tokens.
///
/// When lengths differ, performs a dummy comparison so timing does not
/// depend on whether the lengths matched.
fn constant_time_token_eq(provided: &str, expected: &str) -> Choice {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return Choice::from(0);
    }
    provided.ct_eq(expected)
}

/// Resolve the bearer value to a caller.
///
/// With configured tokens, every token is compared and the matching
/// account (if any) is returned. Without, the value must be a valid
/// account identifier.
pub fn resolve_bearer(provided: &str, tokens: Option<&[ApiToken]>) -> Result<CallerIdentity, String> {
    match tokens {
        Some(tokens) => {
            let mut found: Option<&ApiToken> = None;
            for token in tokens {
                if bool::from(constant_time_token_eq(provided, &token.secret)) {
                    found = Some(token);
                }
            }
            found
                .map(|t| CallerIdentity {
                    account: t.account.clone(),
                })
                .ok_or_else(|| "invalid bearer token".to_string())
        }
        None => AccountId::new(provided)
            .map(|account| CallerIdentity { account })
            .map_err(|e| format!("invalid bearer token: {e}")),
    }
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Authenticate the request and inject [`CallerIdentity`].
///
/// Requests without a usable `Authorization: Bearer` header are rejected
/// with 401 in both modes, since every operation needs a caller.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let config = request
        .extensions()
        .get::<AuthConfig>()
        .cloned()
        .unwrap_or_default();

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let provided = match auth_header {
        Some(value) => match value.strip_prefix("Bearer ") {
            Some(token) => token.trim(),
            None => {
                tracing::warn!("authentication failed: non-Bearer authorization scheme");
                return unauthorized_response("authorization header must use Bearer scheme");
            }
        },
        None => {
            tracing::warn!("authentication failed: missing authorization header");
            return unauthorized_response("missing authorization header");
        }
    };

    match resolve_bearer(provided, config.tokens.as_deref()) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(msg) => {
            tracing::warn!(reason = %msg, "authentication failed");
            unauthorized_response(&msg)
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
