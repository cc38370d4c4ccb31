//! # HTLC Records
//!
//! The record a successful `fund` stores, the terms a caller supplies to
//! create one, and the [`Settlement`] reported when it resolves.
//!
//! Status machine: `Funded → [Claimed | Refunded]`
//!
//! Stored records are always `Funded`. Resolution removes the record; the
//! terminal state only appears in the [`Settlement`] returned to the caller.

use htlc_core::{AccountId, Amount, Hashlock, HtlcId, Preimage, Timestamp};
use serde::{Deserialize, Serialize};

// ── HTLC State ─────────────────────────────────────────────────────────

/// Lifecycle state of an HTLC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HtlcState {
    /// Value is locked and awaiting claim or refund.
    Funded,
    /// Released to the recipient against the preimage. Terminal state.
    Claimed,
    /// Returned to the sender after expiry. Terminal state.
    Refunded,
}

impl HtlcState {
    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Funded => "FUNDED",
            Self::Claimed => "CLAIMED",
            Self::Refunded => "REFUNDED",
        }
    }
}

impl std::fmt::Display for HtlcState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Funding Terms ──────────────────────────────────────────────────────

/// What a funding caller specifies. The caller itself becomes the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtlcTerms {
    /// Identifier for the new HTLC; must not collide with an active one.
    pub id: HtlcId,
    /// Account allowed to claim.
    pub recipient: AccountId,
    /// SHA-256 digest the claim preimage must hash to.
    pub hashlock: Hashlock,
    /// Value to lock. Must be non-zero.
    pub amount: Amount,
    /// Absolute expiry. Claims must land strictly before it.
    pub timelock: Timestamp,
}

// ── HTLC Record ────────────────────────────────────────────────────────

/// An active hash-time-locked transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Htlc {
    /// Caller-supplied identifier.
    pub id: HtlcId,
    /// Account that funded the HTLC; the only one allowed to refund.
    pub sender: AccountId,
    /// Account allowed to claim.
    pub recipient: AccountId,
    /// Commitment to the secret preimage.
    pub hashlock: Hashlock,
    /// Locked value, fixed at funding time.
    pub amount: Amount,
    /// Absolute expiry in seconds since the Unix epoch.
    pub timelock: Timestamp,
    /// Lifecycle state.
    pub state: HtlcState,
}

impl Htlc {
    pub(crate) fn funded(sender: AccountId, terms: HtlcTerms) -> Self {
        Self {
            id: terms.id,
            sender,
            recipient: terms.recipient,
            hashlock: terms.hashlock,
            amount: terms.amount,
            timelock: terms.timelock,
            state: HtlcState::Funded,
        }
    }

    /// Whether a claim would pass the time check at `now`.
    pub fn is_claimable_at(&self, now: Timestamp) -> bool {
        now < self.timelock
    }

    /// Whether a refund would pass the time check at `now`.
    ///
    /// Always the complement of [`Htlc::is_claimable_at`].
    pub fn is_refundable_at(&self, now: Timestamp) -> bool {
        now >= self.timelock
    }
}

// ── Settlement ─────────────────────────────────────────────────────────

/// Outcome of a successful claim or refund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// The resolved HTLC, with its terminal state.
    pub htlc: Htlc,
    /// Account the locked value was paid to.
    pub paid_to: AccountId,
    /// The revealed preimage. Present for claims only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preimage: Option<Preimage>,
    /// Clock reading at which the settlement was applied.
    pub settled_at: Timestamp,
}
