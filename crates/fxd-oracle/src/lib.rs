//! Contract with the external decision source.
//!
//! The models that produce a trading verdict live outside this system; the
//! core only sees the [`OracleClient`] boundary and the [`Verdict`] it
//! returns. This crate also owns the input records an oracle consumes
//! ([`MarketFeatures`], [`SessionState`]) and the sanitation applied to them
//! before any calculation.

mod client;
mod features;
mod session;
mod verdict;

pub use client::{OracleClient, OracleError, ScriptedOracle};
pub use features::MarketFeatures;
pub use session::SessionState;
pub use verdict::{Decision, EntryPlan, Verdict};
