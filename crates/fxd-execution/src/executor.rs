use serde::{Deserialize, Serialize};

use fxd_instruments::{quantize, LotLimits};
use fxd_ledger::{Direction, ExitReason, LedgerSnapshot, PositionLedger, TradeRecord};
use fxd_oracle::{Decision, EntryPlan, Verdict};
use fxd_risk::{BlockReason, RiskGuard, RiskSnapshot};

use crate::router::{MarketOrder, OrderRouter, OrderSide};
use crate::session::SessionTracker;

/// Executor knobs beyond the risk thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Minimum verdict confidence required to open a position. 0 disables the
    /// gate (replay default); live runs set it from config.
    pub min_confidence: f64,
    /// Entry size used when a verdict suggests no size (0 lots).
    pub fallback_size_lots: f64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.0,
            fallback_size_lots: 0.01,
        }
    }
}

/// Why a requested entry or exit did not happen this step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    RiskBlocked(BlockReason),
    Cooldown,
    LowConfidence,
    /// The router declined or failed; nothing was mutated.
    OrderRejected,
}

/// The single discretionary action taken by the transition table this step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    None,
    Entered {
        direction: Direction,
        size_lots: f64,
        fill_price: f64,
        order_id: String,
    },
    Exited(TradeRecord),
    StopMoved {
        stop_price: f64,
    },
    Suppressed(SuppressReason),
}

/// Everything that happened in one step, in the order it happened.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Protective exit, if one fired before the verdict was applied.
    pub protective_exit: Option<TradeRecord>,
    /// Whether this step consumed a cooldown step.
    pub cooldown_consumed: bool,
    /// Risk-guard block status read this step.
    pub blocked: Option<BlockReason>,
    pub action: StepAction,
}

/// Per-instrument orchestrator. Owns the ledger, risk guard, and session
/// tracker for exactly one instrument.
#[derive(Debug)]
pub struct DecisionExecutor {
    ledger: PositionLedger,
    guard: RiskGuard,
    tracker: SessionTracker,
    limits: LotLimits,
    config: ExecutorConfig,
}

impl DecisionExecutor {
    pub fn new(
        ledger: PositionLedger,
        guard: RiskGuard,
        limits: LotLimits,
        config: ExecutorConfig,
        start_time: i64,
    ) -> Self {
        let tracker = SessionTracker::new(ledger.capital(), start_time);
        Self {
            ledger,
            guard,
            tracker,
            limits,
            config,
        }
    }

    /// Run one step against this instrument.
    ///
    /// Sequencing is fixed: protective exits first (a stop or take-profit
    /// that fires updates the risk guard and leaves the book flat before the
    /// verdict is considered), then one `check_cooldown`, one `is_blocked`,
    /// then the transition table keyed by (position direction, decision):
    ///
    /// | state | buy        | sell        | move_stop  | other |
    /// |-------|------------|-------------|------------|-------|
    /// | flat  | enter long | enter short | no-op      | no-op |
    /// | long  | no-op      | exit        | amend stop | no-op |
    /// | short | exit       | no-op       | amend stop | no-op |
    pub fn step(
        &mut self,
        price: f64,
        time: i64,
        verdict: &Verdict,
        router: &mut dyn OrderRouter,
    ) -> StepOutcome {
        let protective_exit = self.ledger.check_stop_or_take_profit(price, time);
        if let Some(record) = &protective_exit {
            self.guard.update_after_trade(record.return_pct());
            self.tracker.on_trade_closed(record, time);
        }

        let cooldown_consumed = self.guard.check_cooldown();
        let blocked = self.guard.is_blocked();

        let verdict = verdict.validated();
        let action = self.apply_verdict(price, time, &verdict, cooldown_consumed, blocked, router);

        StepOutcome {
            protective_exit,
            cooldown_consumed,
            blocked,
            action,
        }
    }

    fn apply_verdict(
        &mut self,
        price: f64,
        time: i64,
        verdict: &Verdict,
        cooldown_consumed: bool,
        blocked: Option<BlockReason>,
        router: &mut dyn OrderRouter,
    ) -> StepAction {
        let held = self.ledger.position().map(|p| p.direction);

        match (held, verdict.decision) {
            (None, Decision::Buy(plan)) => self.try_enter(
                Direction::Long,
                plan,
                verdict.confidence,
                price,
                time,
                cooldown_consumed,
                blocked,
                router,
            ),
            (None, Decision::Sell(plan)) => self.try_enter(
                Direction::Short,
                plan,
                verdict.confidence,
                price,
                time,
                cooldown_consumed,
                blocked,
                router,
            ),
            (Some(Direction::Long), Decision::Sell(_))
            | (Some(Direction::Short), Decision::Buy(_)) => {
                self.try_model_exit(price, time, router)
            }
            (Some(_), Decision::MoveStop { stop_loss_pct }) => {
                // Position presence just matched; move_stop cannot fail.
                self.ledger
                    .move_stop(stop_loss_pct)
                    .expect("move_stop on open position");
                let stop_price = self
                    .ledger
                    .position()
                    .expect("position still open after move_stop")
                    .stop_price;
                StepAction::StopMoved { stop_price }
            }
            _ => StepAction::None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn try_enter(
        &mut self,
        direction: Direction,
        plan: EntryPlan,
        confidence: f64,
        price: f64,
        time: i64,
        cooldown_consumed: bool,
        blocked: Option<BlockReason>,
        router: &mut dyn OrderRouter,
    ) -> StepAction {
        if let Some(reason) = blocked {
            return StepAction::Suppressed(SuppressReason::RiskBlocked(reason));
        }
        if cooldown_consumed {
            return StepAction::Suppressed(SuppressReason::Cooldown);
        }
        if self.config.min_confidence > 0.0 && confidence < self.config.min_confidence {
            return StepAction::Suppressed(SuppressReason::LowConfidence);
        }

        // The oracle's raw size is never trusted to sit on the lot grid.
        let raw_size = if plan.size_lots > 0.0 {
            plan.size_lots
        } else {
            self.config.fallback_size_lots
        };
        let size_lots = quantize(raw_size, &self.limits);

        let order = MarketOrder {
            symbol: self.ledger.symbol().to_string(),
            side: match direction {
                Direction::Long => OrderSide::Buy,
                Direction::Short => OrderSide::Sell,
            },
            size_lots,
            price,
        };

        match router.market_entry(&order) {
            Ok(Some(receipt)) => {
                self.ledger
                    .enter_position(
                        receipt.fill_price,
                        receipt.size_lots,
                        plan.stop_loss_pct,
                        plan.take_profit_pct,
                        time,
                        direction,
                    )
                    .expect("ledger flat before entry");
                self.tracker.on_entered(time);
                StepAction::Entered {
                    direction,
                    size_lots: receipt.size_lots,
                    fill_price: receipt.fill_price,
                    order_id: receipt.order_id,
                }
            }
            Ok(None) | Err(_) => StepAction::Suppressed(SuppressReason::OrderRejected),
        }
    }

    fn try_model_exit(
        &mut self,
        price: f64,
        time: i64,
        router: &mut dyn OrderRouter,
    ) -> StepAction {
        let (direction, size_lots) = {
            let pos = self
                .ledger
                .position()
                .expect("model exit requires an open position");
            (pos.direction, pos.size_lots)
        };

        let order = MarketOrder {
            symbol: self.ledger.symbol().to_string(),
            side: match direction {
                Direction::Long => OrderSide::Sell,
                Direction::Short => OrderSide::Buy,
            },
            size_lots,
            price,
        };

        match router.market_exit(&order) {
            Ok(Some(receipt)) => {
                let record = self
                    .ledger
                    .exit_position(receipt.fill_price, time, ExitReason::ModelExit)
                    .expect("position open before model exit");
                self.guard.update_after_trade(record.return_pct());
                self.tracker.on_trade_closed(&record, time);
                StepAction::Exited(record)
            }
            Ok(None) | Err(_) => StepAction::Suppressed(SuppressReason::OrderRejected),
        }
    }

    /// Oracle input for this step. Reads the ledger and rolling windows.
    pub fn session_state(&mut self, price: f64, time: i64) -> fxd_oracle::SessionState {
        self.tracker.session_state(&self.ledger, price, time)
    }

    /// Append this step's equity point. Called once per step by the drivers.
    pub fn log_equity(&mut self) {
        self.ledger.log_equity();
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    pub fn guard(&self) -> &RiskGuard {
        &self.guard
    }

    pub fn ledger_snapshot(&self) -> LedgerSnapshot {
        self.ledger.snapshot()
    }

    pub fn risk_snapshot(&self) -> RiskSnapshot {
        self.guard.snapshot()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
