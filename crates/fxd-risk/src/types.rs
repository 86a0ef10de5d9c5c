use serde::{Deserialize, Serialize};

/// Risk thresholds. Fractions, not percent: `max_drawdown: 0.25` = 25%.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    pub initial_capital: f64,
    /// Block new entries once drawdown from initial capital exceeds this.
    pub max_drawdown: f64,
    /// Block new entries at this many consecutive losing trades.
    pub max_consecutive_losses: u32,
    /// Number of steps a post-loss cooldown lasts.
    pub cooldown_steps: u32,
}

impl RiskConfig {
    pub fn new(
        initial_capital: f64,
        max_drawdown: f64,
        max_consecutive_losses: u32,
        cooldown_steps: u32,
    ) -> Self {
        Self {
            initial_capital,
            max_drawdown,
            max_consecutive_losses,
            cooldown_steps,
        }
    }

    /// Reference thresholds: 25% drawdown, 3 losses, 3-step cooldown.
    pub fn defaults_for(initial_capital: f64) -> Self {
        Self::new(initial_capital, 0.25, 3, 3)
    }
}

/// Why the guard refuses new entries. Ordered: drawdown outranks loss streak.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    DrawdownExceeded,
    TooManyLosses,
}

impl BlockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::DrawdownExceeded => "drawdown_exceeded",
            BlockReason::TooManyLosses => "too_many_losses",
        }
    }
}

/// Full guard state plus thresholds — enough to resume after a restart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskSnapshot {
    pub initial_capital: f64,
    pub capital: f64,
    pub drawdown: f64,
    pub recent_losses: u32,
    pub cooldown_active: bool,
    pub cooldown_counter: u32,
    pub max_drawdown: f64,
    pub max_consecutive_losses: u32,
    pub cooldown_steps: u32,
}
