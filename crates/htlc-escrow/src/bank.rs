//! # In-Memory Bank
//!
//! Reference [`ValueTransfer`] implementation: per-account balances plus a
//! single escrow pool, all behind one lock. Used by the HTTP service and by
//! tests that check value conservation.
//!
//! ## Security Invariant
//!
//! Every operation checks all arithmetic before mutating anything, so a
//! refused transfer leaves every balance untouched. Nothing wraps.
//!
//! The pool is shared, so a payout is honoured only against a receipt this
//! bank issued and has not yet paid out, for exactly the amount it was
//! issued for. The outstanding receipts always sum to the pool balance.

use std::collections::HashMap;

use htlc_core::{AccountId, Amount};
use parking_lot::Mutex;

use crate::error::TransferError;
use crate::transfer::{EscrowedValue, ValueTransfer};

#[derive(Debug, Default)]
struct Balances {
    accounts: HashMap<AccountId, Amount>,
    escrow: Amount,
    /// Issued and not yet paid out, by receipt id.
    outstanding: HashMap<u64, Amount>,
    next_receipt: u64,
}

/// Account balances and an escrow pool held in memory.
#[derive(Debug, Default)]
pub struct InMemoryBank {
    inner: Mutex<Balances>,
}

impl InMemoryBank {
    /// Create an empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint `amount` into `account`. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Overflow`] if the balance would exceed
    /// `u128::MAX`.
    pub fn deposit(&self, account: &AccountId, amount: Amount) -> Result<Amount, TransferError> {
        let mut inner = self.inner.lock();
        let current = inner.accounts.get(account).copied().unwrap_or_default();
        let updated = current
            .checked_add(amount)
            .ok_or_else(|| TransferError::Overflow {
                destination: account.to_string(),
                amount,
            })?;
        inner.accounts.insert(account.clone(), updated);
        Ok(updated)
    }

    /// Balance of `account`. Unknown accounts hold zero.
    pub fn balance(&self, account: &AccountId) -> Amount {
        self.inner
            .lock()
            .accounts
            .get(account)
            .copied()
            .unwrap_or_default()
    }

    /// Value currently held in the escrow pool.
    pub fn escrow_balance(&self) -> Amount {
        self.inner.lock().escrow
    }

    /// Sum of all account balances plus the escrow pool. Saturates at
    /// `u128::MAX`.
    pub fn total_supply(&self) -> Amount {
        let inner = self.inner.lock();
        let balances = inner.accounts.values().copied();
        Amount::checked_sum(std::iter::once(inner.escrow).chain(balances))
            .unwrap_or(Amount::new(u128::MAX))
    }
}

impl ValueTransfer for InMemoryBank {
    fn transfer_in(&self, from: &AccountId, amount: Amount) -> Result<EscrowedValue, TransferError> {
        let mut inner = self.inner.lock();
        let available = inner.accounts.get(from).copied().unwrap_or_default();
        let remaining =
            available
                .checked_sub(amount)
                .ok_or_else(|| TransferError::InsufficientFunds {
                    account: from.clone(),
                    requested: amount,
                    available,
                })?;
        let escrow = inner
            .escrow
            .checked_add(amount)
            .ok_or_else(|| TransferError::Overflow {
                destination: "escrow".to_string(),
                amount,
            })?;
        let receipt = inner.next_receipt;
        let next_receipt = receipt
            .checked_add(1)
            .ok_or_else(|| TransferError::Unavailable("escrow receipt ids exhausted".into()))?;
        inner.accounts.insert(from.clone(), remaining);
        inner.escrow = escrow;
        inner.outstanding.insert(receipt, amount);
        inner.next_receipt = next_receipt;
        Ok(EscrowedValue::new(receipt, amount))
    }

    fn transfer_out(&self, to: &AccountId, value: &EscrowedValue) -> Result<(), TransferError> {
        let amount = value.amount();
        let mut inner = self.inner.lock();
        if inner.outstanding.get(&value.receipt()) != Some(&amount) {
            return Err(TransferError::UnknownReceipt {
                receipt: value.receipt(),
            });
        }
        let escrow =
            inner
                .escrow
                .checked_sub(amount)
                .ok_or_else(|| TransferError::EscrowShortfall {
                    requested: amount,
                    available: inner.escrow,
                })?;
        let current = inner.accounts.get(to).copied().unwrap_or_default();
        let credited = current
            .checked_add(amount)
            .ok_or_else(|| TransferError::Overflow {
                destination: to.to_string(),
                amount,
            })?;
        inner.accounts.insert(to.clone(), credited);
        inner.escrow = escrow;
        inner.outstanding.remove(&value.receipt());
        Ok(())
    }
}
