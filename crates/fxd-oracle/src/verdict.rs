use serde::{Deserialize, Serialize};

/// Sizing and protective levels for a new entry. Percentages are fractions of
/// the entry price.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntryPlan {
    /// Raw suggested size in lots — always quantized to the instrument's lot
    /// grid before use.
    pub size_lots: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
}

/// What the oracle wants done this step.
///
/// Only the variants that need them carry sizing or stop fields; `hold`,
/// `partial_exit`, and `no_action` are payload-free and treated identically
/// by the executor (no-op).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "final_decision", rename_all = "snake_case")]
pub enum Decision {
    Buy(EntryPlan),
    Sell(EntryPlan),
    MoveStop { stop_loss_pct: f64 },
    PartialExit,
    Hold,
    NoAction,
}

impl Decision {
    /// Stable wire/reporting label for this decision.
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Buy(_) => "buy",
            Decision::Sell(_) => "sell",
            Decision::MoveStop { .. } => "move_stop",
            Decision::PartialExit => "partial_exit",
            Decision::Hold => "hold",
            Decision::NoAction => "no_action",
        }
    }
}

/// One oracle response: the model signal, its confidence, and the decision.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub signal: i32,
    pub confidence: f64,
    #[serde(flatten)]
    pub decision: Decision,
}

impl Verdict {
    pub fn no_action() -> Self {
        Self {
            signal: 0,
            confidence: 0.0,
            decision: Decision::NoAction,
        }
    }

    pub fn hold(signal: i32, confidence: f64) -> Self {
        Self {
            signal,
            confidence,
            decision: Decision::Hold,
        }
    }

    pub fn buy(signal: i32, confidence: f64, plan: EntryPlan) -> Self {
        Self {
            signal,
            confidence,
            decision: Decision::Buy(plan),
        }
    }

    pub fn sell(signal: i32, confidence: f64, plan: EntryPlan) -> Self {
        Self {
            signal,
            confidence,
            decision: Decision::Sell(plan),
        }
    }

    pub fn move_stop(signal: i32, confidence: f64, stop_loss_pct: f64) -> Self {
        Self {
            signal,
            confidence,
            decision: Decision::MoveStop { stop_loss_pct },
        }
    }

    /// Demote an out-of-domain verdict to `no_action`.
    ///
    /// A malformed verdict must never abort a step: non-finite or negative
    /// sizes/percentages and a confidence outside [0, 1] all collapse to
    /// [`Decision::NoAction`] with the original signal preserved.
    pub fn validated(self) -> Self {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Self {
                signal: self.signal,
                confidence: 0.0,
                decision: Decision::NoAction,
            };
        }

        let ok = match self.decision {
            Decision::Buy(plan) | Decision::Sell(plan) => {
                plan.size_lots.is_finite()
                    && plan.size_lots >= 0.0
                    && pct_ok(plan.stop_loss_pct)
                    && pct_ok(plan.take_profit_pct)
            }
            Decision::MoveStop { stop_loss_pct } => pct_ok(stop_loss_pct),
            Decision::PartialExit | Decision::Hold | Decision::NoAction => true,
        };

        if ok {
            self
        } else {
            Self {
                signal: self.signal,
                confidence: self.confidence,
                decision: Decision::NoAction,
            }
        }
    }
}

fn pct_ok(pct: f64) -> bool {
    pct.is_finite() && pct >= 0.0
}
