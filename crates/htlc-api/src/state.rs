//! # Application State
//!
//! One [`EscrowLedger`] shared by every request, backed by an
//! [`InMemoryBank`] and a [`Clock`] chosen at start-up. The clock is a
//! trait object so tests can drive expiry with a
//! [`ManualClock`](htlc_escrow::ManualClock) through the same router the
//! binary serves.

use std::sync::Arc;

use htlc_escrow::{Clock, EscrowLedger, InMemoryBank, SystemClock, TransferError};

use crate::config::AppConfig;

/// The ledger type served by the API.
pub type Ledger = EscrowLedger<Arc<InMemoryBank>, Arc<dyn Clock>>;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// The escrow ledger.
    pub ledger: Arc<Ledger>,
    /// The bank behind the ledger, for balance queries.
    pub bank: Arc<InMemoryBank>,
    /// Configuration the service was started with.
    pub config: AppConfig,
}

impl AppState {
    /// Empty state on the system clock with default configuration.
    pub fn new() -> Self {
        Self::with_parts(
            AppConfig::default(),
            Arc::new(InMemoryBank::new()),
            Arc::new(SystemClock::new()),
        )
    }

    /// Build state from configuration, minting the configured genesis
    /// balances into a fresh bank.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Overflow`] if a genesis balance cannot be
    /// credited.
    pub fn from_config(config: AppConfig, clock: Arc<dyn Clock>) -> Result<Self, TransferError> {
        let bank = Arc::new(InMemoryBank::new());
        for (account, amount) in &config.genesis_balances {
            bank.deposit(account, *amount)?;
            tracing::info!(account = %account, amount = %amount, "genesis balance minted");
        }
        Ok(Self::with_parts(config, bank, clock))
    }

    fn with_parts(config: AppConfig, bank: Arc<InMemoryBank>, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger: Arc::new(EscrowLedger::new(bank.clone(), clock)),
            bank,
            config,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("active_htlcs", &self.ledger.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use htlc_core::{AccountId, Amount, Timestamp};
    use htlc_escrow::ManualClock;

    #[test]
    fn genesis_balances_are_minted() {
        let alice = AccountId::new("alice").unwrap();
        let config = AppConfig {
            genesis_balances: vec![(alice.clone(), Amount::new(500))],
            ..AppConfig::default()
        };
        let clock = Arc::new(ManualClock::new(Timestamp::from_secs(1)));
        let state = AppState::from_config(config, clock).unwrap();
        assert_eq!(state.bank.balance(&alice), Amount::new(500));
        assert!(state.ledger.is_empty());
    }

    #[test]
    fn ledger_reads_injected_clock() {
        let clock = Arc::new(ManualClock::new(Timestamp::from_secs(42)));
        let state = AppState::from_config(AppConfig::default(), clock.clone()).unwrap();
        clock.advance(8);
        assert_eq!(state.ledger.clock().now(), Timestamp::from_secs(50));
    }

    #[test]
    fn debug_summarises_state() {
        let dbg = format!("{:?}", AppState::new());
        assert!(dbg.contains("active_htlcs"));
    }
}
