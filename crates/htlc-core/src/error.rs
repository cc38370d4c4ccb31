//! # Error Hierarchy
//!
//! Validation errors for the domain primitives, built with `thiserror`.
//! Each variant carries the rejected input and the expected format so that
//! callers can report the problem without guesswork.

use thiserror::Error;

/// Validation errors for domain primitive newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Input is not valid hexadecimal.
    #[error("invalid hex for {field}: \"{value}\"")]
    InvalidHex {
        /// Name of the field being parsed (e.g. "htlc id").
        field: &'static str,
        /// The rejected input.
        value: String,
    },

    /// Decoded bytes have the wrong length for a fixed-width value.
    #[error("invalid length for {field}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Name of the field being parsed.
        field: &'static str,
        /// Required byte length.
        expected: usize,
        /// Decoded byte length.
        actual: usize,
    },

    /// Account identifier is empty, too long, or contains forbidden characters.
    #[error("invalid account id: \"{0}\" (expected 1-64 characters of [A-Za-z0-9._@-])")]
    InvalidAccountId(String),

    /// Amount is not a non-negative integer in the smallest unit.
    #[error("invalid amount: \"{0}\" (expected a non-negative integer in the smallest unit)")]
    InvalidAmount(String),
}
