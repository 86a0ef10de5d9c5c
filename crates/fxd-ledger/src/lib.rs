//! Position lifecycle and PnL book-keeping for a single instrument.
//!
//! # Purpose
//! [`PositionLedger`] owns at most one open position, computes pip PnL on
//! exit, triggers protective exits, and maintains the trade log and equity
//! curve. It enforces its preconditions on every mutation:
//!
//! - Entering over an open position is an error, never a silent overwrite.
//! - Exiting or amending with no open position is an error.
//! - The ledger is **not** mutated when a precondition fails.
//!
//! # Determinism
//! Pure — no IO, no time source, no randomness. Two ledgers fed the same
//! sequence of calls produce identical state.

mod ledger;
mod types;

pub use ledger::{LedgerError, PositionLedger};
pub use types::{Direction, ExitReason, LedgerSnapshot, Position, TradeRecord, CAPITAL_CEILING};
