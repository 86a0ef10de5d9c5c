//! Live-market driver: one synchronous control loop per process.
//!
//! The loop polls a [`MarketFeed`] on a fixed cadence, asks the oracle for a
//! verdict, and applies it through one
//! [`DecisionExecutor`](fxd_execution::DecisionExecutor) per symbol — state
//! is never shared across instruments. Operator pause/stop arrive as atomic
//! flags read once at the top of every iteration: stop ends the loop cleanly
//! after the current step; pause skips the trading-action portion of a step
//! but keeps polling data.

mod control;
mod driver;
mod feed;

pub use control::{ControlFlags, ControlState};
pub use driver::{LiveConfig, LiveDriver, LiveSummary};
pub use feed::{Candle, FeedError, MarketFeed};
