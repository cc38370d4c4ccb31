#![deny(missing_docs)]

//! # htlc-core: Foundational Types for the HTLC Escrow Stack
//!
//! This crate defines the primitives every other crate in the workspace
//! depends on. It has no internal crate dependencies, only `serde`,
//! `thiserror`, `chrono`, `sha2`, `hex`, `subtle`, and `rand_core` from the
//! external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** An [`HtlcId`] and a
//!    [`Hashlock`] are both 32 bytes, but you cannot pass one where the
//!    other is expected.
//!
//! 2. **Validation at construction.** [`AccountId`] and [`Amount`] reject
//!    malformed input when parsed, so downstream code never re-validates.
//!
//! 3. **Hashlock verification is constant-time.** [`Hashlock::matches`]
//!    compares digests with `subtle` so a failed claim leaks nothing about
//!    how close the candidate preimage came.
//!
//! 4. **[`ValidationError`] hierarchy.** Structured errors with `thiserror`,
//!    no `.unwrap()` outside tests.

pub mod amount;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use amount::Amount;
pub use digest::{sha256, Hashlock, Preimage};
pub use error::ValidationError;
pub use identity::{AccountId, HtlcId};
pub use temporal::Timestamp;
