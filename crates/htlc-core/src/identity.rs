//! # Identity Newtypes
//!
//! Identifiers for HTLC records and the accounts that fund and settle them.
//! Each identifier is a distinct type: you cannot pass an [`AccountId`]
//! where an [`HtlcId`] is expected.
//!
//! ## Validation
//!
//! [`HtlcId`] is 32 opaque bytes chosen by the funding caller. Parsing from
//! hex checks the length. [`AccountId`] validates its character set and
//! length at construction time.

use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::digest::parse_hex32;
use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// HTLC identifier
// ---------------------------------------------------------------------------

/// Caller-supplied 32-byte identifier of one HTLC.
///
/// Serializes as 64 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HtlcId([u8; 32]);

impl HtlcId {
    /// Create an identifier from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a fresh random identifier from the OS random source.
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Parse an identifier from hex (optional `0x` prefix, either case).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidHex`] or
    /// [`ValidationError::InvalidLength`] on malformed input.
    pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
        parse_hex32("htlc id", s).map(Self)
    }

    /// Access the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Return the identifier as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for HtlcId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for HtlcId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for HtlcId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for HtlcId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Account identifier
// ---------------------------------------------------------------------------

/// Maximum length of an account identifier in bytes.
pub const MAX_ACCOUNT_ID_LEN: usize = 64;

/// An account that can fund, claim, or be refunded.
///
/// # Validation
///
/// - 1 to 64 characters
/// - ASCII letters, digits, and `.`, `_`, `@`, `-` only
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create a validated account identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAccountId`] if the input is empty,
    /// longer than [`MAX_ACCOUNT_ID_LEN`], or contains other characters.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        let valid_char = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '@' | '-');
        if s.is_empty() || s.len() > MAX_ACCOUNT_ID_LEN || !s.chars().all(valid_char) {
            return Err(ValidationError::InvalidAccountId(s));
        }
        Ok(Self(s))
    }

    /// Access the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for AccountId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}
