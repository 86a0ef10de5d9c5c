use serde::{Deserialize, Serialize};

/// Equity and capital are ceiling-clipped here; there is intentionally no
/// floor clip (negative capital stays representable — no margin-call model).
pub const CAPITAL_CEILING: f64 = 1e7;

/// Which side of the market an open position sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

/// Why a position was closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    ModelExit,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::ModelExit => "model_exit",
        }
    }
}

/// The single open position of an instrument.
///
/// Stop and take-profit prices are fixed at entry; only
/// [`PositionLedger::move_stop`](crate::PositionLedger::move_stop) may amend
/// the stop, and it recomputes from `entry_price`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub entry_price: f64,
    pub direction: Direction,
    pub size_lots: f64,
    pub stop_price: f64,
    pub take_profit_price: f64,
    pub entry_time: i64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
}

/// Immutable record written once per closed trade.
///
/// Prices are recorded to 5 decimal places, lots to 2, PnL to 5 — the
/// resolution the trade log is exported at.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub entry_price: f64,
    pub exit_price: f64,
    pub size_lots: f64,
    pub direction: Direction,
    pub entry_time: i64,
    pub exit_time: i64,
    /// Realized PnL in account currency.
    pub pnl: f64,
    pub pnl_pips: f64,
    pub reason: ExitReason,
}

impl TradeRecord {
    /// Signed fractional return of the trade, as fed to the risk guard:
    /// (exit − entry)/entry for longs, (entry − exit)/entry for shorts.
    pub fn return_pct(&self) -> f64 {
        if self.entry_price == 0.0 {
            return 0.0;
        }
        match self.direction {
            Direction::Long => (self.exit_price - self.entry_price) / self.entry_price,
            Direction::Short => (self.entry_price - self.exit_price) / self.entry_price,
        }
    }

    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }
}

/// Full ledger state — enough to resume an instrument after a restart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub symbol: String,
    pub initial_capital: f64,
    pub capital: f64,
    pub balance: f64,
    pub position: Option<Position>,
    pub trade_log: Vec<TradeRecord>,
    pub equity_curve: Vec<f64>,
}
