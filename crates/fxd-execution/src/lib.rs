//! Per-step orchestration: protective exits, risk gating, and the verdict
//! transition table, applied against one instrument's ledger and risk guard.
//!
//! One [`DecisionExecutor`] is the single logical owner of one instrument's
//! [`PositionLedger`](fxd_ledger::PositionLedger) and
//! [`RiskGuard`](fxd_risk::RiskGuard) — state is never shared across
//! instruments. Entries and exits leave the process through the
//! [`OrderRouter`] boundary; an unfilled route mutates nothing.

mod executor;
mod router;
mod session;

pub use executor::{DecisionExecutor, ExecutorConfig, StepAction, StepOutcome, SuppressReason};
pub use router::{ImmediateFill, MarketOrder, OrderReceipt, OrderRouter, OrderSide, RouteError};
pub use session::SessionTracker;
