use std::collections::VecDeque;

use fxd_ledger::{Direction, PositionLedger, TradeRecord};
use fxd_oracle::SessionState;

/// Window of closed trades feeding `rolling_loss_ratio`.
const ROLLING_WINDOW: usize = 10;

/// Window of closed trades feeding `recent_losses`.
const RECENT_WINDOW: usize = 3;

/// Rolling descriptors of recent performance, maintained alongside the ledger
/// to build the oracle's [`SessionState`] each step.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionTracker {
    peak_capital: f64,
    last_trade_time: i64,
    /// Win/loss outcomes of recent closed trades, oldest first.
    outcomes: VecDeque<bool>,
}

impl SessionTracker {
    pub fn new(initial_capital: f64, start_time: i64) -> Self {
        Self {
            peak_capital: initial_capital,
            last_trade_time: start_time,
            outcomes: VecDeque::new(),
        }
    }

    /// Record a position entry (resets the time-since-last-trade clock).
    pub fn on_entered(&mut self, time: i64) {
        self.last_trade_time = time;
    }

    /// Fold one closed trade into the rolling windows.
    pub fn on_trade_closed(&mut self, record: &TradeRecord, time: i64) {
        self.last_trade_time = time;
        if self.outcomes.len() == ROLLING_WINDOW {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(record.is_win());
    }

    /// Build the oracle input for this step. Reads the ledger, then advances
    /// the running capital peak.
    pub fn session_state(&mut self, ledger: &PositionLedger, price: f64, time: i64) -> SessionState {
        let capital = ledger.capital();
        let drawdown = if self.peak_capital > 0.0 {
            (self.peak_capital - capital) / self.peak_capital
        } else {
            0.0
        };
        self.peak_capital = self.peak_capital.max(capital);

        let (in_position, time_in_trade, profit_pct) = match ledger.position() {
            Some(pos) => {
                let unrealized = if pos.entry_price != 0.0 {
                    match pos.direction {
                        Direction::Long => (price - pos.entry_price) / pos.entry_price,
                        Direction::Short => (pos.entry_price - price) / pos.entry_price,
                    }
                } else {
                    0.0
                };
                (true, time - pos.entry_time, unrealized)
            }
            None => (false, 0, 0.0),
        };

        SessionState {
            capital,
            in_position,
            drawdown,
            time_in_trade,
            recent_losses: self.recent_losses(),
            profit_pct,
            rolling_loss_ratio: self.rolling_loss_ratio(),
            time_since_last_trade: time - self.last_trade_time,
        }
    }

    /// Losses among the last 3 closed trades; 0 until three trades exist.
    fn recent_losses(&self) -> u32 {
        if self.outcomes.len() < RECENT_WINDOW {
            return 0;
        }
        self.outcomes
            .iter()
            .rev()
            .take(RECENT_WINDOW)
            .filter(|win| !**win)
            .count() as u32
    }

    fn rolling_loss_ratio(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        let losses = self.outcomes.iter().filter(|win| !**win).count();
        losses as f64 / self.outcomes.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxd_ledger::ExitReason;

    fn record(pnl: f64) -> TradeRecord {
        TradeRecord {
            entry_price: 1.1,
            exit_price: 1.1,
            size_lots: 0.1,
            direction: Direction::Long,
            entry_time: 0,
            exit_time: 1,
            pnl,
            pnl_pips: pnl,
            reason: ExitReason::ModelExit,
        }
    }

    #[test]
    fn drawdown_measured_against_running_peak() {
        let mut tracker = SessionTracker::new(10_000.0, 0);
        let ledger = PositionLedger::new("EURUSD", 10_000.0);

        let s = tracker.session_state(&ledger, 1.1, 1);
        assert_eq!(s.drawdown, 0.0);
        assert!(!s.in_position);
    }

    #[test]
    fn recent_losses_needs_three_trades() {
        let mut tracker = SessionTracker::new(10_000.0, 0);
        let ledger = PositionLedger::new("EURUSD", 10_000.0);

        tracker.on_trade_closed(&record(-1.0), 1);
        tracker.on_trade_closed(&record(-1.0), 2);
        assert_eq!(tracker.session_state(&ledger, 1.1, 3).recent_losses, 0);

        tracker.on_trade_closed(&record(-1.0), 3);
        assert_eq!(tracker.session_state(&ledger, 1.1, 4).recent_losses, 3);
    }

    #[test]
    fn rolling_loss_ratio_over_last_ten() {
        let mut tracker = SessionTracker::new(10_000.0, 0);
        let ledger = PositionLedger::new("EURUSD", 10_000.0);

        for i in 0..10 {
            tracker.on_trade_closed(&record(if i % 2 == 0 { 1.0 } else { -1.0 }), i);
        }
        let s = tracker.session_state(&ledger, 1.1, 20);
        assert!((s.rolling_loss_ratio - 0.5).abs() < 1e-12);

        // Window slides: two more wins push two outcomes out.
        tracker.on_trade_closed(&record(1.0), 21);
        tracker.on_trade_closed(&record(1.0), 22);
        let s = tracker.session_state(&ledger, 1.1, 23);
        assert!((s.rolling_loss_ratio - 0.4).abs() < 1e-12);
    }

    #[test]
    fn time_since_last_trade_resets_on_entry_and_close() {
        let mut tracker = SessionTracker::new(10_000.0, 100);
        let ledger = PositionLedger::new("EURUSD", 10_000.0);

        assert_eq!(tracker.session_state(&ledger, 1.1, 110).time_since_last_trade, 10);
        tracker.on_entered(110);
        assert_eq!(tracker.session_state(&ledger, 1.1, 115).time_since_last_trade, 5);
        tracker.on_trade_closed(&record(1.0), 120);
        assert_eq!(tracker.session_state(&ledger, 1.1, 121).time_since_last_trade, 1);
    }

    #[test]
    fn open_position_reports_unrealized_return() {
        let mut tracker = SessionTracker::new(10_000.0, 0);
        let mut ledger = PositionLedger::new("EURUSD", 10_000.0);
        ledger
            .enter_position(1.0, 0.1, 0.05, 0.05, 5, Direction::Long)
            .unwrap();

        let s = tracker.session_state(&ledger, 1.01, 8);
        assert!(s.in_position);
        assert_eq!(s.time_in_trade, 3);
        assert!((s.profit_pct - 0.01).abs() < 1e-12);
    }
}
