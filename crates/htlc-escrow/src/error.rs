//! # Escrow Error Types
//!
//! Structured error hierarchy for the escrow ledger. Every rejected call
//! returns exactly one of these; nothing is mutated and no value moves when
//! an error is returned.
//!
//! Each variant carries the HTLC identifier and, where relevant, the caller
//! or the clock reading that caused the rejection. [`EscrowError::kind`]
//! gives a stable machine-readable code for API layers.

use htlc_core::{AccountId, Amount, HtlcId, Timestamp};
use thiserror::Error;

/// Refusals from a value-transfer capability.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// The debited account cannot cover the requested amount.
    #[error("account {account} has {available}, cannot transfer {requested}")]
    InsufficientFunds {
        /// The account being debited.
        account: AccountId,
        /// The amount requested.
        requested: Amount,
        /// The account's balance at the time of the request.
        available: Amount,
    },

    /// Crediting would overflow the destination balance.
    #[error("crediting {amount} to {destination} would overflow")]
    Overflow {
        /// Account or pool being credited.
        destination: String,
        /// The amount that could not be credited.
        amount: Amount,
    },

    /// The escrow pool holds less than a payout requires.
    #[error("escrow pool holds {available}, cannot pay out {requested}")]
    EscrowShortfall {
        /// The payout amount.
        requested: Amount,
        /// The pool balance at the time of the request.
        available: Amount,
    },

    /// The payout receipt was not issued by this capability, does not match
    /// what was issued, or has already been paid out.
    #[error("escrow receipt {receipt} is unknown or already paid out")]
    UnknownReceipt {
        /// Identifier carried by the rejected receipt.
        receipt: u64,
    },

    /// The capability's backend rejected or could not complete the transfer.
    #[error("value transfer unavailable: {0}")]
    Unavailable(String),
}

impl TransferError {
    /// Stable machine-readable code for this refusal.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::Overflow { .. } => "TRANSFER_OVERFLOW",
            Self::EscrowShortfall { .. } => "ESCROW_SHORTFALL",
            Self::UnknownReceipt { .. } => "UNKNOWN_RECEIPT",
            Self::Unavailable(_) => "TRANSFER_UNAVAILABLE",
        }
    }
}

/// Errors arising from escrow ledger operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EscrowError {
    /// Funding with a zero amount.
    #[error("htlc {htlc_id}: funding amount must be greater than zero")]
    ZeroValue {
        /// The identifier the caller tried to fund.
        htlc_id: HtlcId,
    },

    /// An active HTLC already uses this identifier.
    #[error("htlc {htlc_id} already exists")]
    DuplicateId {
        /// The conflicting identifier.
        htlc_id: HtlcId,
    },

    /// No active HTLC has this identifier (never funded, or already resolved).
    #[error("htlc {htlc_id} not found")]
    NotFound {
        /// The requested identifier.
        htlc_id: HtlcId,
    },

    /// The caller is not the party allowed to perform this operation.
    #[error("caller {caller} may not {operation} htlc {htlc_id}")]
    Unauthorized {
        /// The target HTLC.
        htlc_id: HtlcId,
        /// The rejected caller.
        caller: AccountId,
        /// The attempted operation ("claim" or "refund").
        operation: &'static str,
    },

    /// The presented preimage does not hash to the stored hashlock.
    #[error("htlc {htlc_id}: preimage does not match hashlock")]
    InvalidPreimage {
        /// The target HTLC.
        htlc_id: HtlcId,
    },

    /// Claim attempted at or after the timelock.
    #[error("htlc {htlc_id} expired at {timelock} (now {now})")]
    Expired {
        /// The target HTLC.
        htlc_id: HtlcId,
        /// The HTLC's timelock.
        timelock: Timestamp,
        /// Clock reading at the time of the claim.
        now: Timestamp,
    },

    /// Refund attempted before the timelock.
    #[error("htlc {htlc_id} does not expire until {timelock} (now {now})")]
    NotExpired {
        /// The target HTLC.
        htlc_id: HtlcId,
        /// The HTLC's timelock.
        timelock: Timestamp,
        /// Clock reading at the time of the refund.
        now: Timestamp,
    },

    /// The value-transfer capability refused the debit or the payout.
    #[error("htlc {htlc_id}: {operation} transfer failed: {source}")]
    Transfer {
        /// The target HTLC.
        htlc_id: HtlcId,
        /// The ledger operation that issued the transfer.
        operation: &'static str,
        /// The capability's refusal.
        #[source]
        source: TransferError,
    },
}

impl EscrowError {
    /// Stable machine-readable code for this error.
    ///
    /// Transfer failures report the underlying [`TransferError::kind`].
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ZeroValue { .. } => "ZERO_VALUE",
            Self::DuplicateId { .. } => "DUPLICATE_ID",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Unauthorized { .. } => "UNAUTHORIZED_CALLER",
            Self::InvalidPreimage { .. } => "INVALID_PREIMAGE",
            Self::Expired { .. } => "EXPIRED",
            Self::NotExpired { .. } => "NOT_EXPIRED",
            Self::Transfer { source, .. } => source.kind(),
        }
    }

    /// The HTLC the failed call targeted.
    pub fn htlc_id(&self) -> &HtlcId {
        match self {
            Self::ZeroValue { htlc_id }
            | Self::DuplicateId { htlc_id }
            | Self::NotFound { htlc_id }
            | Self::Unauthorized { htlc_id, .. }
            | Self::InvalidPreimage { htlc_id }
            | Self::Expired { htlc_id, .. }
            | Self::NotExpired { htlc_id, .. }
            | Self::Transfer { htlc_id, .. } => htlc_id,
        }
    }
}
