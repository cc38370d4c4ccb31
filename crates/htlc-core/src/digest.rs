//! # Hashlocks and Preimages
//!
//! A [`Hashlock`] is the SHA-256 digest an HTLC commits to; a [`Preimage`]
//! is the secret whose digest must match it for a claim to succeed.
//!
//! ## Security Invariant
//!
//! [`Hashlock::matches`] is the only comparison path between a candidate
//! preimage and a stored hashlock, and it runs in constant time.

use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::ValidationError;

/// Compute the SHA-256 digest of arbitrary bytes.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Decode a 32-byte value from hex, accepting an optional `0x` prefix.
pub(crate) fn parse_hex32(field: &'static str, s: &str) -> Result<[u8; 32], ValidationError> {
    let bytes = parse_hex(field, s)?;
    let actual = bytes.len();
    bytes
        .try_into()
        .map_err(|_| ValidationError::InvalidLength {
            field,
            expected: 32,
            actual,
        })
}

/// Decode arbitrary-length hex, accepting an optional `0x` prefix.
pub(crate) fn parse_hex(field: &'static str, s: &str) -> Result<Vec<u8>, ValidationError> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    hex::decode(digits).map_err(|_| ValidationError::InvalidHex {
        field,
        value: s.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Hashlock
// ---------------------------------------------------------------------------

/// SHA-256 commitment to a secret preimage.
///
/// Serializes as 64 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hashlock([u8; 32]);

impl Hashlock {
    /// Wrap a raw 32-byte digest.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Commit to a preimage: `Hashlock(sha256(preimage))`.
    pub fn from_preimage(preimage: &Preimage) -> Self {
        Self(sha256(preimage.as_bytes()))
    }

    /// Parse a hashlock from hex (optional `0x` prefix).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidHex`] or
    /// [`ValidationError::InvalidLength`] on malformed input.
    pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
        parse_hex32("hashlock", s).map(Self)
    }

    /// Whether `sha256(preimage)` equals this hashlock.
    ///
    /// Comparison is constant-time over the 32 digest bytes.
    pub fn matches(&self, preimage: &Preimage) -> bool {
        let candidate = sha256(preimage.as_bytes());
        candidate[..].ct_eq(&self.0[..]).into()
    }

    /// Access the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Return the digest as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for Hashlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for Hashlock {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Hashlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hashlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Preimage
// ---------------------------------------------------------------------------

/// Candidate secret presented to claim an HTLC.
///
/// Arbitrary length, including empty. Serializes as lowercase hex.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Preimage(Vec<u8>);

impl Preimage {
    /// Wrap raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Generate a fresh 32-byte secret from the OS random source.
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes.to_vec())
    }

    /// Parse a preimage from hex (optional `0x` prefix). Empty input yields
    /// an empty preimage.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidHex`] on malformed input.
    pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
        parse_hex("preimage", s).map(Self)
    }

    /// The hashlock this preimage opens.
    pub fn hashlock(&self) -> Hashlock {
        Hashlock::from_preimage(self)
    }

    /// Access the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Return the bytes as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

// Preimages are secrets until revealed by a successful claim.
impl std::fmt::Debug for Preimage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Preimage([REDACTED; {}])", self.0.len())
    }
}

impl Serialize for Preimage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Preimage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Every preimage opens the hashlock derived from it.
        #[test]
        fn preimage_opens_own_hashlock(bytes in prop::collection::vec(any::<u8>(), 0..128)) {
            let preimage = Preimage::new(bytes);
            prop_assert!(preimage.hashlock().matches(&preimage));
        }

        /// Distinct preimages never open each other's hashlocks.
        #[test]
        fn distinct_preimages_do_not_cross_open(
            a in prop::collection::vec(any::<u8>(), 0..64),
            b in prop::collection::vec(any::<u8>(), 0..64),
        ) {
            prop_assume!(a != b);
            let lock = Preimage::new(a).hashlock();
            prop_assert!(!lock.matches(&Preimage::new(b)));
        }

        /// Hex parsing accepts what `to_hex` produces, in either case.
        #[test]
        fn hashlock_hex_parse_inverts_display(bytes in any::<[u8; 32]>(), upper in any::<bool>()) {
            let lock = Hashlock::from_bytes(bytes);
            let text = if upper { lock.to_hex().to_uppercase() } else { lock.to_hex() };
            prop_assert_eq!(Hashlock::from_hex(&text).unwrap(), lock);
        }
    }
}
