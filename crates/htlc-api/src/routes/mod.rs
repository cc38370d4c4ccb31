//! # API Route Modules
//!
//! - `htlcs`: fund, inspect, claim, and refund HTLCs, plus escrow totals.
//! - `accounts`: balances held by the in-memory bank.

pub mod accounts;
pub mod htlcs;
