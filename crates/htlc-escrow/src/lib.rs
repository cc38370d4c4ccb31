//! # htlc-escrow: Hashed Timelock Escrow Ledger
//!
//! Locks value for a recipient under a SHA-256 hashlock and an absolute
//! timelock:
//!
//! - **Ledger** ([`ledger`]): the `fund` / `claim` / `refund` state machine
//!   and its read-side queries.
//!
//! - **Records** ([`htlc`]): the stored [`Htlc`], the [`HtlcTerms`] a funder
//!   supplies, and the [`Settlement`] reported on resolution.
//!
//! - **Capabilities** ([`transfer`], [`clock`]): the [`ValueTransfer`] and
//!   [`Clock`] traits the ledger is generic over, with reference
//!   implementations in [`bank`] and [`clock`].
//!
//! - **Errors** ([`error`]): one [`EscrowError`] variant per rejection kind.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use htlc_core::{AccountId, Amount, HtlcId, Preimage, Timestamp};
//! use htlc_escrow::{EscrowLedger, HtlcTerms, InMemoryBank, ManualClock};
//!
//! let alice = AccountId::new("alice").unwrap();
//! let bob = AccountId::new("bob").unwrap();
//! let bank = Arc::new(InMemoryBank::new());
//! bank.deposit(&alice, Amount::new(100)).unwrap();
//!
//! let ledger = EscrowLedger::new(bank.clone(), ManualClock::new(Timestamp::from_secs(10)));
//! let secret = Preimage::random();
//! let id = HtlcId::random();
//! ledger
//!     .fund(&alice, HtlcTerms {
//!         id,
//!         recipient: bob.clone(),
//!         hashlock: secret.hashlock(),
//!         amount: Amount::new(100),
//!         timelock: Timestamp::from_secs(70),
//!     })
//!     .unwrap();
//!
//! ledger.claim(&bob, &id, secret).unwrap();
//! assert_eq!(bank.balance(&bob), Amount::new(100));
//! ```

pub mod bank;
pub mod clock;
pub mod error;
pub mod htlc;
pub mod ledger;
pub mod transfer;

// Re-export primary types.
pub use bank::InMemoryBank;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{EscrowError, TransferError};
pub use htlc::{Htlc, HtlcState, HtlcTerms, Settlement};
pub use ledger::EscrowLedger;
pub use transfer::{EscrowedValue, ValueTransfer};
