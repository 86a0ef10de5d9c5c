use fxd_instruments::{pip_size, PIP_VALUE_PER_LOT};

use crate::types::{
    Direction, ExitReason, LedgerSnapshot, Position, TradeRecord, CAPITAL_CEILING,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Precondition violations the ledger refuses to absorb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// `enter_position` while a position is already open. Overwriting an open
    /// position would orphan its stop and take-profit, so it is rejected.
    PositionAlreadyOpen,
    /// `exit_position` / `move_stop` with no open position.
    NoOpenPosition,
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PositionAlreadyOpen => {
                write!(f, "ledger invariant: a position is already open")
            }
            Self::NoOpenPosition => write!(f, "ledger invariant: no open position"),
        }
    }
}

impl std::error::Error for LedgerError {}

// ---------------------------------------------------------------------------
// PositionLedger
// ---------------------------------------------------------------------------

/// Book-keeping for one instrument: the open position (0 or 1), realized
/// capital and balance, the trade log, and the per-step equity curve.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionLedger {
    symbol: String,
    pip_size: f64,
    initial_capital: f64,
    capital: f64,
    balance: f64,
    position: Option<Position>,
    trade_log: Vec<TradeRecord>,
    equity_curve: Vec<f64>,
}

impl PositionLedger {
    pub fn new(symbol: impl Into<String>, initial_capital: f64) -> Self {
        let symbol = symbol.into();
        let pip_size = pip_size(&symbol);
        Self {
            symbol,
            pip_size,
            initial_capital,
            capital: initial_capital,
            balance: initial_capital,
            position: None,
            trade_log: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Write surface
    // -----------------------------------------------------------------------

    /// Open a position. Stop and take-profit are derived from the entry price:
    /// long → stop below / tp above; short → stop above / tp below.
    ///
    /// # Errors
    /// [`LedgerError::PositionAlreadyOpen`] if a position is open. The ledger
    /// is not mutated on error.
    pub fn enter_position(
        &mut self,
        price: f64,
        size_lots: f64,
        stop_loss_pct: f64,
        take_profit_pct: f64,
        time: i64,
        direction: Direction,
    ) -> Result<(), LedgerError> {
        if self.position.is_some() {
            return Err(LedgerError::PositionAlreadyOpen);
        }

        let (stop_price, take_profit_price) = match direction {
            Direction::Long => (
                price * (1.0 - stop_loss_pct),
                price * (1.0 + take_profit_pct),
            ),
            Direction::Short => (
                price * (1.0 + stop_loss_pct),
                price * (1.0 - take_profit_pct),
            ),
        };

        self.position = Some(Position {
            entry_price: price,
            direction,
            size_lots,
            stop_price,
            take_profit_price,
            entry_time: time,
            stop_loss_pct,
            take_profit_pct,
        });
        Ok(())
    }

    /// Close the open position at `price`, realizing PnL into capital and
    /// balance and appending one [`TradeRecord`].
    ///
    /// PnL: pips = (exit − entry)/pip_size for longs, (entry − exit)/pip_size
    /// for shorts; currency = pips × pip value per lot × size. Capital is
    /// ceiling-clipped at [`CAPITAL_CEILING`] after the update.
    ///
    /// # Errors
    /// [`LedgerError::NoOpenPosition`] if flat.
    pub fn exit_position(
        &mut self,
        price: f64,
        time: i64,
        reason: ExitReason,
    ) -> Result<TradeRecord, LedgerError> {
        let pos = self.position.take().ok_or(LedgerError::NoOpenPosition)?;

        let pnl_pips = match pos.direction {
            Direction::Long => (price - pos.entry_price) / self.pip_size,
            Direction::Short => (pos.entry_price - price) / self.pip_size,
        };
        let pnl = pnl_pips * PIP_VALUE_PER_LOT * pos.size_lots;

        self.balance += pnl;
        self.capital += pnl;
        self.capital = self.capital.min(CAPITAL_CEILING);

        let record = TradeRecord {
            entry_price: round_dp(pos.entry_price, 5),
            exit_price: round_dp(price, 5),
            size_lots: round_dp(pos.size_lots, 2),
            direction: pos.direction,
            entry_time: pos.entry_time,
            exit_time: time,
            pnl: round_dp(pnl, 5),
            pnl_pips: round_dp(pnl_pips, 5),
            reason,
        };
        self.trade_log.push(record.clone());
        Ok(record)
    }

    /// Evaluate protective exits for this step's price. Called once per step,
    /// before any discretionary verdict.
    ///
    /// The stop is checked before the take-profit for both directions — if a
    /// degenerate configuration satisfies both at once, the stop wins. A
    /// protective exit fills at the protective level, not at `price`.
    pub fn check_stop_or_take_profit(&mut self, price: f64, time: i64) -> Option<TradeRecord> {
        let pos = self.position.as_ref()?;
        let (stop_hit, tp_hit) = match pos.direction {
            Direction::Long => (price <= pos.stop_price, price >= pos.take_profit_price),
            Direction::Short => (price >= pos.stop_price, price <= pos.take_profit_price),
        };

        if stop_hit {
            let fill = pos.stop_price;
            // Position is known open: exit cannot fail here.
            return self.exit_position(fill, time, ExitReason::StopLoss).ok();
        }
        if tp_hit {
            let fill = pos.take_profit_price;
            return self.exit_position(fill, time, ExitReason::TakeProfit).ok();
        }
        None
    }

    /// Recompute the stop from the position's original entry price and
    /// direction using a new stop-loss percentage. Never opens or closes.
    ///
    /// # Errors
    /// [`LedgerError::NoOpenPosition`] if flat.
    pub fn move_stop(&mut self, stop_loss_pct: f64) -> Result<(), LedgerError> {
        let pos = self.position.as_mut().ok_or(LedgerError::NoOpenPosition)?;
        pos.stop_price = match pos.direction {
            Direction::Long => pos.entry_price * (1.0 - stop_loss_pct),
            Direction::Short => pos.entry_price * (1.0 + stop_loss_pct),
        };
        pos.stop_loss_pct = stop_loss_pct;
        Ok(())
    }

    /// Append the current (ceiling-clipped) capital to the equity curve.
    /// Called every step whether or not a trade occurred.
    pub fn log_equity(&mut self) {
        self.equity_curve.push(self.capital.min(CAPITAL_CEILING));
    }

    // -----------------------------------------------------------------------
    // Read surface
    // -----------------------------------------------------------------------

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn capital(&self) -> f64 {
        self.capital
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    pub fn trade_log(&self) -> &[TradeRecord] {
        &self.trade_log
    }

    pub fn equity_curve(&self) -> &[f64] {
        &self.equity_curve
    }

    // -----------------------------------------------------------------------
    // Snapshot / restore
    // -----------------------------------------------------------------------

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            symbol: self.symbol.clone(),
            initial_capital: self.initial_capital,
            capital: self.capital,
            balance: self.balance,
            position: self.position.clone(),
            trade_log: self.trade_log.clone(),
            equity_curve: self.equity_curve.clone(),
        }
    }

    pub fn restore(snapshot: LedgerSnapshot) -> Self {
        let pip_size = pip_size(&snapshot.symbol);
        Self {
            symbol: snapshot.symbol,
            pip_size,
            initial_capital: snapshot.initial_capital,
            capital: snapshot.capital,
            balance: snapshot.balance,
            position: snapshot.position,
            trade_log: snapshot.trade_log,
            equity_curve: snapshot.equity_curve,
        }
    }
}

fn round_dp(x: f64, dp: u32) -> f64 {
    let scale = 10f64.powi(dp as i32);
    (x * scale).round() / scale
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
