//! # Custom Extractors & Validation
//!
//! Request DTOs arrive as plain strings so that malformed JSON (400) and
//! malformed primitives (422) are reported separately. The [`Validate`]
//! trait turns a DTO into its domain form.

use axum::extract::rejection::JsonRejection;
use axum::Json;
use htlc_core::ValidationError;

use crate::error::AppError;

/// Request types that parse into a validated domain value.
pub trait Validate {
    /// The domain value produced on success.
    type Validated;

    /// Parse and validate every field.
    fn validate(self) -> Result<Self::Validated, ValidationError>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it into its domain form.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T::Validated, AppError> {
    let value = extract_json(result)?;
    Ok(value.validate()?)
}
