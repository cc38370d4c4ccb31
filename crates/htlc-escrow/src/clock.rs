//! # Time Oracle
//!
//! The ledger reads the current time through [`Clock`] so expiry can be
//! driven deterministically in tests. Readings must never go backwards;
//! equal readings across calls are fine.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use htlc_core::Timestamp;

/// Source of the current time in whole seconds.
pub trait Clock: Send + Sync {
    /// The current time. Monotonically non-decreasing across calls.
    fn now(&self) -> Timestamp;
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Wall-clock time from the operating system.
///
/// If the system clock is set back, readings hold at the latest time
/// already reported until the wall clock catches up.
#[derive(Debug, Default)]
pub struct SystemClock {
    latest: AtomicU64,
}

impl SystemClock {
    /// A clock that has reported nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `reading`, or the latest earlier report if that is later.
    fn observe(&self, reading: Timestamp) -> Timestamp {
        let previous = self.latest.fetch_max(reading.as_secs(), Ordering::SeqCst);
        Timestamp::from_secs(previous.max(reading.as_secs()))
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        self.observe(Timestamp::now())
    }
}

/// Settable clock for tests and simulations.
///
/// Never moves backwards: [`ManualClock::set`] ignores earlier times and
/// [`ManualClock::advance`] saturates at `u64::MAX`.
#[derive(Debug, Default)]
pub struct ManualClock {
    secs: AtomicU64,
}

impl ManualClock {
    /// Start the clock at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            secs: AtomicU64::new(start.as_secs()),
        }
    }

    /// Move the clock to `t` if `t` is later than the current reading.
    pub fn set(&self, t: Timestamp) {
        self.secs.fetch_max(t.as_secs(), Ordering::SeqCst);
    }

    /// Move the clock forward by `secs`.
    pub fn advance(&self, secs: u64) {
        // The closure always returns Some, so the update cannot fail.
        let _ = self
            .secs
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |cur| {
                Some(cur.saturating_add(secs))
            });
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_secs(self.secs.load(Ordering::SeqCst))
    }
}
