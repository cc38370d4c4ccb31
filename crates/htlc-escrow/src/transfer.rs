//! # Value-Transfer Capability
//!
//! The ledger never touches balances directly. It moves value through a
//! [`ValueTransfer`] implementation injected at construction: a debit from
//! the funding account into escrow, and a payout from escrow to whichever
//! party resolves the HTLC.
//!
//! A successful debit returns an [`EscrowedValue`] receipt. The ledger keeps
//! the receipt alongside the record and hands it back on payout.
//! Implementations must honour each receipt they issued at most once and
//! refuse any other with [`TransferError::UnknownReceipt`], so every payout
//! corresponds to exactly one earlier debit.

use std::sync::Arc;

use htlc_core::{AccountId, Amount};

use crate::error::TransferError;

/// Receipt for value moved into escrow by [`ValueTransfer::transfer_in`].
///
/// Not `Clone`: one receipt backs one HTLC. Holding a receipt grants
/// nothing by itself; the issuing capability checks it against its own
/// record of outstanding receipts on payout.
#[derive(Debug, PartialEq, Eq)]
pub struct EscrowedValue {
    receipt: u64,
    amount: Amount,
}

impl EscrowedValue {
    /// Record that `amount` now sits in escrow under `receipt`, an
    /// identifier unique among the issuer's outstanding receipts. Called by
    /// capability implementations after a successful debit.
    pub fn new(receipt: u64, amount: Amount) -> Self {
        Self { receipt, amount }
    }

    /// The issuer's identifier for this receipt.
    pub fn receipt(&self) -> u64 {
        self.receipt
    }

    /// The escrowed amount.
    pub fn amount(&self) -> Amount {
        self.amount
    }
}

/// Moves value between accounts and the escrow pool.
///
/// Implementations must be all-or-nothing: an `Err` means no balance
/// changed.
pub trait ValueTransfer: Send + Sync {
    /// Debit `amount` from `from` into escrow.
    fn transfer_in(&self, from: &AccountId, amount: Amount) -> Result<EscrowedValue, TransferError>;

    /// Pay escrowed value out to `to`.
    fn transfer_out(&self, to: &AccountId, value: &EscrowedValue) -> Result<(), TransferError>;
}

impl<T: ValueTransfer + ?Sized> ValueTransfer for Arc<T> {
    fn transfer_in(&self, from: &AccountId, amount: Amount) -> Result<EscrowedValue, TransferError> {
        (**self).transfer_in(from, amount)
    }

    fn transfer_out(&self, to: &AccountId, value: &EscrowedValue) -> Result<(), TransferError> {
        (**self).transfer_out(to, value)
    }
}
