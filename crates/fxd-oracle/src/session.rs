use serde::{Deserialize, Serialize};

/// Trading-session context handed to the oracle next to the market features.
///
/// Mirrors what the decision models were trained on: account state plus a few
/// rolling descriptors of recent performance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub capital: f64,
    pub in_position: bool,
    /// Fractional decline from the running capital peak.
    pub drawdown: f64,
    /// Steps the current position has been open (0 when flat).
    pub time_in_trade: i64,
    /// Losses among the last 3 closed trades.
    pub recent_losses: u32,
    /// Unrealized fractional return of the open position (0 when flat).
    pub profit_pct: f64,
    /// Loss share of the last 10 closed trades.
    pub rolling_loss_ratio: f64,
    pub time_since_last_trade: i64,
}

impl SessionState {
    /// Fresh session: full capital, flat, no history.
    pub fn initial(capital: f64) -> Self {
        Self {
            capital,
            in_position: false,
            drawdown: 0.0,
            time_in_trade: 0,
            recent_losses: 0,
            profit_pct: 0.0,
            rolling_loss_ratio: 0.0,
            time_since_last_trade: 0,
        }
    }
}
