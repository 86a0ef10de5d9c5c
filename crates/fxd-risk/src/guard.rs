use crate::types::{BlockReason, RiskConfig, RiskSnapshot};

/// Drawdown / loss-streak / cooldown state machine.
///
/// Two stored regimes (active, cooldown) plus a blocked condition computed on
/// demand by [`RiskGuard::is_blocked`] — blocking is derived, never stored.
#[derive(Clone, Debug, PartialEq)]
pub struct RiskGuard {
    config: RiskConfig,
    capital: f64,
    drawdown: f64,
    recent_losses: u32,
    cooldown_active: bool,
    cooldown_counter: u32,
}

impl RiskGuard {
    pub fn new(config: RiskConfig) -> Self {
        Self {
            config,
            capital: config.initial_capital,
            drawdown: 0.0,
            recent_losses: 0,
            cooldown_active: false,
            cooldown_counter: 0,
        }
    }

    /// Fold one closed trade into the guard. Must be called exactly once per
    /// closed trade, protective or discretionary.
    ///
    /// A losing trade starts (or restarts) the cooldown; a winning trade
    /// clears both the loss streak and any cooldown in progress.
    pub fn update_after_trade(&mut self, profit_pct: f64) {
        self.capital *= 1.0 + profit_pct;
        self.drawdown = 1.0 - self.capital / self.config.initial_capital;

        if profit_pct < 0.0 {
            self.recent_losses += 1;
            self.cooldown_active = true;
            self.cooldown_counter = 0;
        } else {
            self.recent_losses = 0;
            self.cooldown_active = false;
            self.cooldown_counter = 0;
        }
    }

    /// Whether new entries are refused, and why. Pure read.
    ///
    /// Drawdown is checked first; a loss streak only surfaces once the
    /// drawdown ceiling holds.
    pub fn is_blocked(&self) -> Option<BlockReason> {
        if self.drawdown > self.config.max_drawdown {
            return Some(BlockReason::DrawdownExceeded);
        }
        if self.recent_losses >= self.config.max_consecutive_losses {
            return Some(BlockReason::TooManyLosses);
        }
        None
    }

    /// Advance the cooldown by one step and report whether it was active for
    /// this call.
    ///
    /// Each invocation consumes one cooldown step; the call that reaches
    /// `cooldown_steps` clears the state but still reports active.
    pub fn check_cooldown(&mut self) -> bool {
        if self.cooldown_active {
            self.cooldown_counter += 1;
            if self.cooldown_counter >= self.config.cooldown_steps {
                self.cooldown_active = false;
                self.cooldown_counter = 0;
            }
            return true;
        }
        false
    }

    /// Restore capital, drawdown, loss streak, and cooldown to initial values.
    pub fn reset(&mut self) {
        self.capital = self.config.initial_capital;
        self.drawdown = 0.0;
        self.recent_losses = 0;
        self.cooldown_active = false;
        self.cooldown_counter = 0;
    }

    pub fn capital(&self) -> f64 {
        self.capital
    }

    pub fn drawdown(&self) -> f64 {
        self.drawdown
    }

    pub fn recent_losses(&self) -> u32 {
        self.recent_losses
    }

    pub fn cooldown_active(&self) -> bool {
        self.cooldown_active
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Snapshot / restore
    // -----------------------------------------------------------------------

    pub fn snapshot(&self) -> RiskSnapshot {
        RiskSnapshot {
            initial_capital: self.config.initial_capital,
            capital: self.capital,
            drawdown: self.drawdown,
            recent_losses: self.recent_losses,
            cooldown_active: self.cooldown_active,
            cooldown_counter: self.cooldown_counter,
            max_drawdown: self.config.max_drawdown,
            max_consecutive_losses: self.config.max_consecutive_losses,
            cooldown_steps: self.config.cooldown_steps,
        }
    }

    pub fn restore(snapshot: &RiskSnapshot) -> Self {
        Self {
            config: RiskConfig::new(
                snapshot.initial_capital,
                snapshot.max_drawdown,
                snapshot.max_consecutive_losses,
                snapshot.cooldown_steps,
            ),
            capital: snapshot.capital,
            drawdown: snapshot.drawdown,
            recent_losses: snapshot.recent_losses,
            cooldown_active: snapshot.cooldown_active,
            cooldown_counter: snapshot.cooldown_counter,
        }
    }
}
