//! # Escrow Ledger
//!
//! The HTLC state machine: `fund` locks value under a hashlock and a
//! timelock, `claim` releases it to the recipient against the preimage
//! before expiry, and `refund` returns it to the sender at or after expiry.
//!
//! ## Security Invariant
//!
//! One mutex guards the identifier map, and it is held across the call into
//! the value-transfer capability. A record and the value backing it are
//! therefore inserted together and removed together. If a payout fails the
//! removed record is put back before the lock is released, so no caller can
//! observe an HTLC whose value has left escrow, or escrowed value with no
//! HTLC.
//!
//! Checks run in a fixed order and the first failure is reported:
//!
//! - `fund`: zero amount, duplicate id, debit refused.
//! - `claim`: not found, wrong caller, preimage mismatch, expired, payout
//!   refused.
//! - `refund`: not found, wrong caller, not yet expired, payout refused.
//!
//! Expiry is evaluated against [`Clock::now`] inside the lock on each call.
//! There are no background sweeps.

use std::collections::HashMap;

use htlc_core::{AccountId, Amount, HtlcId, Preimage};
use parking_lot::Mutex;

use crate::clock::Clock;
use crate::error::EscrowError;
use crate::htlc::{Htlc, HtlcState, HtlcTerms, Settlement};
use crate::transfer::{EscrowedValue, ValueTransfer};

/// An active HTLC and the receipt for the value backing it.
#[derive(Debug)]
struct Locked {
    htlc: Htlc,
    value: EscrowedValue,
}

/// Ledger of active HTLCs over injected value-transfer and clock
/// capabilities.
#[derive(Debug)]
pub struct EscrowLedger<T, C> {
    transfer: T,
    clock: C,
    htlcs: Mutex<HashMap<HtlcId, Locked>>,
}

impl<T: ValueTransfer, C: Clock> EscrowLedger<T, C> {
    /// Create an empty ledger.
    pub fn new(transfer: T, clock: C) -> Self {
        Self {
            transfer,
            clock,
            htlcs: Mutex::new(HashMap::new()),
        }
    }

    /// The time oracle.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    // ── State transitions ──────────────────────────────────────────────

    /// Lock `terms.amount` from `caller` for `terms.recipient`.
    ///
    /// The caller becomes the sender. Self-funding and timelocks at or
    /// before the current time are accepted.
    ///
    /// # Errors
    ///
    /// [`EscrowError::ZeroValue`], [`EscrowError::DuplicateId`], or
    /// [`EscrowError::Transfer`] if the debit is refused. Nothing is stored
    /// on error.
    pub fn fund(&self, caller: &AccountId, terms: HtlcTerms) -> Result<Htlc, EscrowError> {
        let htlc_id = terms.id;
        if terms.amount.is_zero() {
            return Err(rejected("fund", EscrowError::ZeroValue { htlc_id }));
        }

        let mut htlcs = self.htlcs.lock();
        if htlcs.contains_key(&htlc_id) {
            return Err(rejected("fund", EscrowError::DuplicateId { htlc_id }));
        }

        let value = self
            .transfer
            .transfer_in(caller, terms.amount)
            .map_err(|source| {
                rejected(
                    "fund",
                    EscrowError::Transfer {
                        htlc_id,
                        operation: "fund",
                        source,
                    },
                )
            })?;

        let htlc = Htlc::funded(caller.clone(), terms);
        htlcs.insert(
            htlc_id,
            Locked {
                htlc: htlc.clone(),
                value,
            },
        );

        tracing::info!(
            htlc_id = %htlc_id,
            sender = %htlc.sender,
            recipient = %htlc.recipient,
            amount = %htlc.amount,
            timelock = htlc.timelock.as_secs(),
            "htlc funded"
        );
        Ok(htlc)
    }

    /// Release the HTLC to its recipient against the preimage.
    ///
    /// # Errors
    ///
    /// [`EscrowError::NotFound`], [`EscrowError::Unauthorized`],
    /// [`EscrowError::InvalidPreimage`], [`EscrowError::Expired`], or
    /// [`EscrowError::Transfer`] if the payout is refused. The HTLC stays
    /// active on error.
    pub fn claim(
        &self,
        caller: &AccountId,
        htlc_id: &HtlcId,
        preimage: Preimage,
    ) -> Result<Settlement, EscrowError> {
        let htlc_id = *htlc_id;
        let mut htlcs = self.htlcs.lock();
        let now = self.clock.now();

        let htlc = match htlcs.get(&htlc_id) {
            Some(locked) => &locked.htlc,
            None => return Err(rejected("claim", EscrowError::NotFound { htlc_id })),
        };
        if caller != &htlc.recipient {
            return Err(rejected(
                "claim",
                EscrowError::Unauthorized {
                    htlc_id,
                    caller: caller.clone(),
                    operation: "claim",
                },
            ));
        }
        if !htlc.hashlock.matches(&preimage) {
            return Err(rejected("claim", EscrowError::InvalidPreimage { htlc_id }));
        }
        if !htlc.is_claimable_at(now) {
            return Err(rejected(
                "claim",
                EscrowError::Expired {
                    htlc_id,
                    timelock: htlc.timelock,
                    now,
                },
            ));
        }

        let locked = self.pay_out(&mut htlcs, htlc_id, "claim", |htlc| &htlc.recipient)?;

        let mut htlc = locked.htlc;
        htlc.state = HtlcState::Claimed;
        tracing::info!(
            htlc_id = %htlc_id,
            recipient = %htlc.recipient,
            amount = %htlc.amount,
            "htlc claimed"
        );
        Ok(Settlement {
            paid_to: htlc.recipient.clone(),
            htlc,
            preimage: Some(preimage),
            settled_at: now,
        })
    }

    /// Return the HTLC's value to its sender after expiry.
    ///
    /// # Errors
    ///
    /// [`EscrowError::NotFound`], [`EscrowError::Unauthorized`],
    /// [`EscrowError::NotExpired`], or [`EscrowError::Transfer`] if the
    /// payout is refused. The HTLC stays active on error.
    pub fn refund(&self, caller: &AccountId, htlc_id: &HtlcId) -> Result<Settlement, EscrowError> {
        let htlc_id = *htlc_id;
        let mut htlcs = self.htlcs.lock();
        let now = self.clock.now();

        let htlc = match htlcs.get(&htlc_id) {
            Some(locked) => &locked.htlc,
            None => return Err(rejected("refund", EscrowError::NotFound { htlc_id })),
        };
        if caller != &htlc.sender {
            return Err(rejected(
                "refund",
                EscrowError::Unauthorized {
                    htlc_id,
                    caller: caller.clone(),
                    operation: "refund",
                },
            ));
        }
        if !htlc.is_refundable_at(now) {
            return Err(rejected(
                "refund",
                EscrowError::NotExpired {
                    htlc_id,
                    timelock: htlc.timelock,
                    now,
                },
            ));
        }

        let locked = self.pay_out(&mut htlcs, htlc_id, "refund", |htlc| &htlc.sender)?;

        let mut htlc = locked.htlc;
        htlc.state = HtlcState::Refunded;
        tracing::info!(
            htlc_id = %htlc_id,
            sender = %htlc.sender,
            amount = %htlc.amount,
            "htlc refunded"
        );
        Ok(Settlement {
            paid_to: htlc.sender.clone(),
            htlc,
            preimage: None,
            settled_at: now,
        })
    }

    /// Remove the record and pay its value to the party `payee` selects.
    /// On payout failure the record is restored before returning.
    fn pay_out(
        &self,
        htlcs: &mut HashMap<HtlcId, Locked>,
        htlc_id: HtlcId,
        operation: &'static str,
        payee: impl Fn(&Htlc) -> &AccountId,
    ) -> Result<Locked, EscrowError> {
        let Some(locked) = htlcs.remove(&htlc_id) else {
            return Err(rejected(operation, EscrowError::NotFound { htlc_id }));
        };

        match self.transfer.transfer_out(payee(&locked.htlc), &locked.value) {
            Ok(()) => Ok(locked),
            Err(source) => {
                tracing::error!(
                    htlc_id = %htlc_id,
                    operation,
                    error = %source,
                    "payout failed, htlc restored"
                );
                htlcs.insert(htlc_id, locked);
                Err(EscrowError::Transfer {
                    htlc_id,
                    operation,
                    source,
                })
            }
        }
    }

    // ── Queries ────────────────────────────────────────────────────────

    /// Snapshot of an active HTLC.
    pub fn get(&self, htlc_id: &HtlcId) -> Option<Htlc> {
        self.htlcs.lock().get(htlc_id).map(|l| l.htlc.clone())
    }

    /// Number of active HTLCs.
    pub fn len(&self) -> usize {
        self.htlcs.lock().len()
    }

    /// Whether no HTLC is active.
    pub fn is_empty(&self) -> bool {
        self.htlcs.lock().is_empty()
    }

    /// Sum of the amounts of all active HTLCs. Saturates at `u128::MAX`.
    pub fn total_escrowed(&self) -> Amount {
        let htlcs = self.htlcs.lock();
        Amount::checked_sum(htlcs.values().map(|l| l.htlc.amount))
            .unwrap_or(Amount::new(u128::MAX))
    }
}

fn rejected(operation: &'static str, err: EscrowError) -> EscrowError {
    tracing::warn!(
        htlc_id = %err.htlc_id(),
        operation,
        kind = err.kind(),
        "htlc call rejected"
    );
    err
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use htlc_core::{Hashlock, Timestamp};

    use super::*;
    use crate::bank::InMemoryBank;
    use crate::clock::ManualClock;
    use crate::error::TransferError;

    const T0: u64 = 1_000;

    struct Fixture {
        ledger: EscrowLedger<Arc<InMemoryBank>, Arc<ManualClock>>,
        bank: Arc<InMemoryBank>,
        clock: Arc<ManualClock>,
    }

    fn acct(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn alice() -> AccountId {
        acct("alice")
    }

    fn bob() -> AccountId {
        acct("bob")
    }

    fn mallory() -> AccountId {
        acct("mallory")
    }

    fn id(b: u8) -> HtlcId {
        HtlcId::from_bytes([b; 32])
    }

    fn secret() -> Preimage {
        Preimage::new(b"s3cret".to_vec())
    }

    fn fixture() -> Fixture {
        let bank = Arc::new(InMemoryBank::new());
        let clock = Arc::new(ManualClock::new(Timestamp::from_secs(T0)));
        bank.deposit(&alice(), Amount::new(1_000)).unwrap();
        Fixture {
            ledger: EscrowLedger::new(bank.clone(), clock.clone()),
            bank,
            clock,
        }
    }

    fn terms(htlc_id: HtlcId, amount: u128, timelock: u64) -> HtlcTerms {
        HtlcTerms {
            id: htlc_id,
            recipient: bob(),
            hashlock: secret().hashlock(),
            amount: Amount::new(amount),
            timelock: Timestamp::from_secs(timelock),
        }
    }

    // ── fund ───────────────────────────────────────────────────────────

    #[test]
    fn fund_locks_value_and_stores_record() {
        let f = fixture();
        let htlc = f.ledger.fund(&alice(), terms(id(1), 100, T0 + 60)).unwrap();

        assert_eq!(htlc.sender, alice());
        assert_eq!(htlc.recipient, bob());
        assert_eq!(htlc.state, HtlcState::Funded);
        assert_eq!(f.ledger.get(&id(1)), Some(htlc));
        assert_eq!(f.bank.balance(&alice()), Amount::new(900));
        assert_eq!(f.bank.escrow_balance(), Amount::new(100));
        assert_eq!(f.ledger.total_escrowed(), Amount::new(100));
    }

    #[test]
    fn fund_zero_value_is_rejected() {
        let f = fixture();
        let err = f.ledger.fund(&alice(), terms(id(1), 0, T0 + 60)).unwrap_err();
        assert_eq!(err, EscrowError::ZeroValue { htlc_id: id(1) });
        assert!(f.ledger.is_empty());
    }

    #[test]
    fn zero_value_is_checked_before_duplicate() {
        let f = fixture();
        f.ledger.fund(&alice(), terms(id(1), 10, T0 + 60)).unwrap();
        let err = f.ledger.fund(&alice(), terms(id(1), 0, T0 + 60)).unwrap_err();
        assert_eq!(err.kind(), "ZERO_VALUE");
    }

    #[test]
    fn fund_duplicate_id_is_rejected_without_moving_value() {
        let f = fixture();
        f.ledger.fund(&alice(), terms(id(1), 100, T0 + 60)).unwrap();
        let err = f
            .ledger
            .fund(&alice(), terms(id(1), 50, T0 + 120))
            .unwrap_err();
        assert_eq!(err, EscrowError::DuplicateId { htlc_id: id(1) });
        assert_eq!(f.bank.balance(&alice()), Amount::new(900));
        assert_eq!(f.ledger.get(&id(1)).unwrap().amount, Amount::new(100));
    }

    #[test]
    fn fund_with_insufficient_balance_stores_nothing() {
        let f = fixture();
        let err = f
            .ledger
            .fund(&alice(), terms(id(1), 1_001, T0 + 60))
            .unwrap_err();
        assert_eq!(err.kind(), "INSUFFICIENT_FUNDS");
        assert!(matches!(
            err,
            EscrowError::Transfer {
                operation: "fund",
                source: TransferError::InsufficientFunds { .. },
                ..
            }
        ));
        assert!(f.ledger.get(&id(1)).is_none());
        assert_eq!(f.bank.balance(&alice()), Amount::new(1_000));
    }

    #[test]
    fn self_funding_is_allowed() {
        let f = fixture();
        let mut t = terms(id(1), 10, T0 + 60);
        t.recipient = alice();
        let htlc = f.ledger.fund(&alice(), t).unwrap();
        assert_eq!(htlc.sender, htlc.recipient);

        let settlement = f.ledger.claim(&alice(), &id(1), secret()).unwrap();
        assert_eq!(settlement.paid_to, alice());
        assert_eq!(f.bank.balance(&alice()), Amount::new(1_000));
    }

    #[test]
    fn past_timelock_is_accepted_and_immediately_refundable() {
        let f = fixture();
        f.ledger.fund(&alice(), terms(id(1), 10, 0)).unwrap();
        let err = f.ledger.claim(&bob(), &id(1), secret()).unwrap_err();
        assert_eq!(err.kind(), "EXPIRED");
        f.ledger.refund(&alice(), &id(1)).unwrap();
        assert_eq!(f.bank.balance(&alice()), Amount::new(1_000));
    }

    // ── claim ──────────────────────────────────────────────────────────

    #[test]
    fn happy_claim_pays_recipient_and_reveals_preimage() {
        let f = fixture();
        f.ledger.fund(&alice(), terms(id(1), 100, T0 + 60)).unwrap();

        let settlement = f.ledger.claim(&bob(), &id(1), secret()).unwrap();

        assert_eq!(settlement.htlc.state, HtlcState::Claimed);
        assert_eq!(settlement.paid_to, bob());
        assert_eq!(settlement.preimage, Some(secret()));
        assert_eq!(settlement.settled_at, Timestamp::from_secs(T0));
        assert_eq!(f.bank.balance(&bob()), Amount::new(100));
        assert_eq!(f.bank.escrow_balance(), Amount::ZERO);
        assert!(f.ledger.get(&id(1)).is_none());
    }

    #[test]
    fn second_claim_is_not_found() {
        let f = fixture();
        f.ledger.fund(&alice(), terms(id(1), 100, T0 + 60)).unwrap();
        f.ledger.claim(&bob(), &id(1), secret()).unwrap();
        let err = f.ledger.claim(&bob(), &id(1), secret()).unwrap_err();
        assert_eq!(err, EscrowError::NotFound { htlc_id: id(1) });
        assert_eq!(f.bank.balance(&bob()), Amount::new(100));
    }

    #[test]
    fn claim_unknown_id_is_not_found() {
        let f = fixture();
        let err = f.ledger.claim(&bob(), &id(9), secret()).unwrap_err();
        assert_eq!(err.kind(), "NOT_FOUND");
    }

    #[test]
    fn claim_by_non_recipient_is_unauthorized() {
        let f = fixture();
        f.ledger.fund(&alice(), terms(id(1), 100, T0 + 60)).unwrap();
        for caller in [alice(), mallory()] {
            let err = f.ledger.claim(&caller, &id(1), secret()).unwrap_err();
            assert_eq!(err.kind(), "UNAUTHORIZED_CALLER");
        }
        assert!(f.ledger.get(&id(1)).is_some());
    }

    #[test]
    fn unauthorized_is_checked_before_preimage() {
        let f = fixture();
        f.ledger.fund(&alice(), terms(id(1), 100, T0 + 60)).unwrap();
        let err = f
            .ledger
            .claim(&mallory(), &id(1), Preimage::new(b"wrong".to_vec()))
            .unwrap_err();
        assert_eq!(err.kind(), "UNAUTHORIZED_CALLER");
    }

    #[test]
    fn claim_with_wrong_preimage_is_rejected() {
        let f = fixture();
        f.ledger.fund(&alice(), terms(id(1), 100, T0 + 60)).unwrap();

        let other = Preimage::new(b"other".to_vec());
        let mut t = terms(id(2), 10, T0 + 60);
        t.hashlock = other.hashlock();
        f.ledger.fund(&alice(), t).unwrap();

        for bad in [Preimage::new(Vec::new()), Preimage::new(b"S3CRET".to_vec()), other] {
            let err = f.ledger.claim(&bob(), &id(1), bad).unwrap_err();
            assert_eq!(err, EscrowError::InvalidPreimage { htlc_id: id(1) });
        }
        assert_eq!(f.bank.balance(&bob()), Amount::ZERO);
    }

    #[test]
    fn wrong_preimage_is_reported_before_expiry() {
        let f = fixture();
        f.ledger.fund(&alice(), terms(id(1), 100, T0)).unwrap();
        let err = f
            .ledger
            .claim(&bob(), &id(1), Preimage::new(b"nope".to_vec()))
            .unwrap_err();
        assert_eq!(err.kind(), "INVALID_PREIMAGE");
    }

    #[test]
    fn claim_at_timelock_is_expired() {
        let f = fixture();
        f.ledger.fund(&alice(), terms(id(1), 100, T0 + 60)).unwrap();
        f.clock.set(Timestamp::from_secs(T0 + 60));
        let err = f.ledger.claim(&bob(), &id(1), secret()).unwrap_err();
        assert_eq!(
            err,
            EscrowError::Expired {
                htlc_id: id(1),
                timelock: Timestamp::from_secs(T0 + 60),
                now: Timestamp::from_secs(T0 + 60),
            }
        );
    }

    #[test]
    fn claim_one_second_before_timelock_succeeds() {
        let f = fixture();
        f.ledger.fund(&alice(), terms(id(1), 100, T0 + 60)).unwrap();
        f.clock.set(Timestamp::from_secs(T0 + 59));
        f.ledger.claim(&bob(), &id(1), secret()).unwrap();
    }

    // ── refund ─────────────────────────────────────────────────────────

    #[test]
    fn refund_after_expiry_returns_value_to_sender() {
        let f = fixture();
        f.ledger.fund(&alice(), terms(id(1), 100, T0 + 60)).unwrap();
        f.clock.advance(60);

        let settlement = f.ledger.refund(&alice(), &id(1)).unwrap();

        assert_eq!(settlement.htlc.state, HtlcState::Refunded);
        assert_eq!(settlement.paid_to, alice());
        assert!(settlement.preimage.is_none());
        assert_eq!(f.bank.balance(&alice()), Amount::new(1_000));
        assert_eq!(f.bank.escrow_balance(), Amount::ZERO);
        assert!(f.ledger.is_empty());
    }

    #[test]
    fn refund_before_expiry_is_rejected() {
        let f = fixture();
        f.ledger.fund(&alice(), terms(id(1), 100, T0 + 60)).unwrap();
        f.clock.advance(59);
        let err = f.ledger.refund(&alice(), &id(1)).unwrap_err();
        assert_eq!(err.kind(), "NOT_EXPIRED");
        assert!(f.ledger.get(&id(1)).is_some());
    }

    #[test]
    fn refund_by_non_sender_is_unauthorized() {
        let f = fixture();
        f.ledger.fund(&alice(), terms(id(1), 100, T0)).unwrap();
        for caller in [bob(), mallory()] {
            let err = f.ledger.refund(&caller, &id(1)).unwrap_err();
            assert_eq!(err.kind(), "UNAUTHORIZED_CALLER");
        }
    }

    #[test]
    fn refund_after_claim_is_not_found() {
        let f = fixture();
        f.ledger.fund(&alice(), terms(id(1), 100, T0 + 60)).unwrap();
        f.ledger.claim(&bob(), &id(1), secret()).unwrap();
        f.clock.advance(120);
        let err = f.ledger.refund(&alice(), &id(1)).unwrap_err();
        assert_eq!(err.kind(), "NOT_FOUND");
        assert_eq!(f.bank.balance(&alice()), Amount::new(900));
    }

    // ── id reuse ───────────────────────────────────────────────────────

    #[test]
    fn id_can_be_funded_again_after_resolution() {
        let f = fixture();
        f.ledger.fund(&alice(), terms(id(1), 100, T0 + 60)).unwrap();
        f.ledger.claim(&bob(), &id(1), secret()).unwrap();
        let again = f.ledger.fund(&alice(), terms(id(1), 5, T0 + 60)).unwrap();
        assert_eq!(again.amount, Amount::new(5));
    }

    // ── payout failure ─────────────────────────────────────────────────

    #[test]
    fn failed_payout_restores_record() {
        let f = fixture();
        f.ledger.fund(&alice(), terms(id(1), 100, T0 + 60)).unwrap();
        f.bank.deposit(&bob(), Amount::new(u128::MAX)).unwrap();

        let err = f.ledger.claim(&bob(), &id(1), secret()).unwrap_err();

        assert!(matches!(
            err,
            EscrowError::Transfer {
                operation: "claim",
                source: TransferError::Overflow { .. },
                ..
            }
        ));
        let restored = f.ledger.get(&id(1)).unwrap();
        assert_eq!(restored.state, HtlcState::Funded);
        assert_eq!(f.bank.escrow_balance(), Amount::new(100));
        assert_eq!(f.ledger.total_escrowed(), Amount::new(100));

        // The sender can still recover after expiry.
        f.clock.advance(60);
        f.ledger.refund(&alice(), &id(1)).unwrap();
        assert_eq!(f.bank.balance(&alice()), Amount::new(1_000));
    }

    // ── queries ────────────────────────────────────────────────────────

    #[test]
    fn queries_track_active_set() {
        let f = fixture();
        assert!(f.ledger.is_empty());
        assert_eq!(f.ledger.total_escrowed(), Amount::ZERO);

        f.ledger.fund(&alice(), terms(id(1), 100, T0 + 60)).unwrap();
        f.ledger.fund(&alice(), terms(id(2), 250, T0 + 60)).unwrap();
        assert_eq!(f.ledger.len(), 2);
        assert_eq!(f.ledger.total_escrowed(), Amount::new(350));

        f.ledger.claim(&bob(), &id(1), secret()).unwrap();
        assert_eq!(f.ledger.len(), 1);
        assert_eq!(f.ledger.total_escrowed(), Amount::new(250));
        assert_eq!(f.ledger.total_escrowed(), f.bank.escrow_balance());
    }

    #[test]
    fn hashlock_of_other_htlc_does_not_transfer() {
        let f = fixture();
        let lock = Hashlock::from_bytes([0; 32]);
        let mut t = terms(id(1), 100, T0 + 60);
        t.hashlock = lock;
        f.ledger.fund(&alice(), t).unwrap();
        let err = f.ledger.claim(&bob(), &id(1), secret()).unwrap_err();
        assert_eq!(err.kind(), "INVALID_PREIMAGE");
    }
}
