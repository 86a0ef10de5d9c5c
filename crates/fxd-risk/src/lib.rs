//! Self-protecting risk policy: drawdown ceiling, loss-streak block, and
//! post-loss cooldown.
//!
//! The guard tracks its own view of capital (compounded from per-trade
//! returns) independently of the ledger's currency accounting. Callers hold a
//! strict sequencing contract:
//!
//! - [`RiskGuard::update_after_trade`] exactly once per closed trade;
//! - [`RiskGuard::check_cooldown`] exactly once per step (it consumes one
//!   cooldown step per invocation);
//! - [`RiskGuard::is_blocked`] is a pure read, consulted once per step.

mod guard;
mod types;

pub use guard::RiskGuard;
pub use types::{BlockReason, RiskConfig, RiskSnapshot};
