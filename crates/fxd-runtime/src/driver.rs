use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use fxd_audit::JournalWriter;
use fxd_execution::{DecisionExecutor, ExecutorConfig, OrderRouter, StepAction};
use fxd_instruments::{lot_limits_or_default, InstrumentCatalog};
use fxd_ledger::{LedgerSnapshot, PositionLedger};
use fxd_oracle::{OracleClient, Verdict};
use fxd_risk::{RiskConfig, RiskGuard, RiskSnapshot};
use fxd_state::StateRepository;

use crate::control::ControlFlags;
use crate::feed::MarketFeed;

/// Live loop configuration.
#[derive(Clone, Debug)]
pub struct LiveConfig {
    pub symbols: Vec<String>,
    pub initial_capital: f64,
    /// Per-symbol risk thresholds (each symbol gets its own guard).
    pub risk: RiskConfig,
    pub executor: ExecutorConfig,
    /// Cadence between loop iterations.
    pub poll_interval: Duration,
    /// Bounded wait applied to feed polls.
    pub call_timeout: Duration,
    /// Candles that must accumulate per symbol before decisions start.
    pub warmup_candles: usize,
}

impl LiveConfig {
    pub fn test_defaults(symbols: &[&str]) -> Self {
        Self {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            initial_capital: 10_000.0,
            risk: RiskConfig::defaults_for(10_000.0),
            executor: ExecutorConfig::default(),
            poll_interval: Duration::ZERO,
            call_timeout: Duration::from_secs(1),
            warmup_candles: 5,
        }
    }
}

/// What the loop did before it stopped.
#[derive(Clone, Debug, PartialEq)]
pub struct LiveSummary {
    pub run_id: Uuid,
    pub iterations: u64,
    pub final_capital: BTreeMap<String, f64>,
    pub closed_trades: BTreeMap<String, usize>,
}

struct InstrumentSession {
    executor: DecisionExecutor,
    buffer: VecDeque<crate::feed::Candle>,
}

/// The live driver. One per process; one instrument unit per symbol.
pub struct LiveDriver {
    config: LiveConfig,
    run_id: Uuid,
    sessions: BTreeMap<String, InstrumentSession>,
}

impl LiveDriver {
    /// Build the per-symbol units, restoring risk and ledger snapshots where
    /// they exist so the process resumes exactly where it left off. A
    /// snapshot that fails to load is logged and replaced with fresh state.
    pub fn new(
        config: LiveConfig,
        catalog: &dyn InstrumentCatalog,
        repo: &dyn StateRepository,
    ) -> Self {
        let mut sessions = BTreeMap::new();

        for symbol in &config.symbols {
            let limits = lot_limits_or_default(catalog, symbol);

            let guard = match fxd_state::load::<RiskSnapshot>(repo, &format!("risk_{symbol}")) {
                Ok(Some(snapshot)) => {
                    info!(%symbol, "restored risk state from snapshot");
                    RiskGuard::restore(&snapshot)
                }
                Ok(None) => RiskGuard::new(config.risk),
                Err(e) => {
                    warn!(%symbol, error = %e, "risk snapshot unreadable; starting fresh");
                    RiskGuard::new(config.risk)
                }
            };

            let ledger = match fxd_state::load::<LedgerSnapshot>(repo, &format!("ledger_{symbol}"))
            {
                Ok(Some(snapshot)) => {
                    info!(%symbol, "restored ledger from snapshot");
                    PositionLedger::restore(snapshot)
                }
                Ok(None) => PositionLedger::new(symbol.clone(), config.initial_capital),
                Err(e) => {
                    warn!(%symbol, error = %e, "ledger snapshot unreadable; starting fresh");
                    PositionLedger::new(symbol.clone(), config.initial_capital)
                }
            };

            let executor = DecisionExecutor::new(ledger, guard, limits, config.executor, 0);
            sessions.insert(
                symbol.clone(),
                InstrumentSession {
                    executor,
                    buffer: VecDeque::new(),
                },
            );
        }

        Self {
            config,
            run_id: Uuid::new_v4(),
            sessions,
        }
    }

    /// Run the control loop until the operator stops it or a risk guard
    /// blocks.
    ///
    /// Flags are read once at the top of every iteration. Stop ends the loop
    /// cleanly after the current step. Pause keeps the data-polling portion
    /// (candles still accumulate) and skips only the trading-action portion.
    /// Feed, oracle, persistence, and journal failures are absorbed per step.
    pub fn run(
        &mut self,
        feed: &mut dyn MarketFeed,
        oracle: &mut dyn OracleClient,
        router: &mut dyn OrderRouter,
        repo: &mut dyn StateRepository,
        mut journal: Option<&mut JournalWriter>,
        flags: &ControlFlags,
    ) -> LiveSummary {
        info!(run_id = %self.run_id, symbols = ?self.config.symbols, "live loop started");
        let mut iterations: u64 = 0;
        let buffer_cap = self.config.warmup_candles.max(1);

        'control: loop {
            let state = flags.read();
            if state.stopped {
                info!("stop requested; shutting down cleanly");
                break;
            }

            for symbol in self.config.symbols.clone() {
                let candle = match feed.poll_candle(&symbol, self.config.call_timeout) {
                    Ok(c) => c,
                    Err(e) => {
                        warn!(%symbol, error = %e, "feed poll failed; skipping symbol this step");
                        continue;
                    }
                };

                let session = match self.sessions.get_mut(&symbol) {
                    Some(s) => s,
                    None => continue,
                };
                if session.buffer.len() == buffer_cap {
                    session.buffer.pop_front();
                }
                session.buffer.push_back(candle.clone());

                if state.paused {
                    debug!(%symbol, "paused; data polled, trading skipped");
                    continue;
                }
                if session.buffer.len() < self.config.warmup_candles {
                    debug!(%symbol, have = session.buffer.len(), "warming up");
                    continue;
                }

                let features = candle.features.clone().sanitized();
                let oracle_state = session.executor.session_state(candle.close, candle.time);
                let verdict = match oracle.decide(&features, &oracle_state) {
                    Ok(v) => v,
                    Err(e) => {
                        warn!(%symbol, error = %e, "oracle failed; treating as no_action");
                        Verdict::no_action()
                    }
                };

                journal_event(
                    &mut journal,
                    self.run_id,
                    "decision",
                    &symbol,
                    serde_json::to_value(verdict).unwrap_or_default(),
                );

                let outcome = session
                    .executor
                    .step(candle.close, candle.time, &verdict, router);

                if let Some(exit) = &outcome.protective_exit {
                    info!(%symbol, reason = exit.reason.as_str(), pnl = exit.pnl, "protective exit");
                    journal_event(
                        &mut journal,
                        self.run_id,
                        "protective_exit",
                        &symbol,
                        serde_json::to_value(exit).unwrap_or_default(),
                    );
                }
                match &outcome.action {
                    StepAction::Entered {
                        direction,
                        size_lots,
                        fill_price,
                        order_id,
                    } => {
                        info!(%symbol, direction = direction.as_str(), size_lots, price = fill_price, "entered position");
                        journal_event(
                            &mut journal,
                            self.run_id,
                            "entry",
                            &symbol,
                            json!({
                                "direction": direction.as_str(),
                                "size_lots": size_lots,
                                "fill_price": fill_price,
                                "order_id": order_id,
                                "confidence": verdict.confidence,
                            }),
                        );
                    }
                    StepAction::Exited(record) => {
                        info!(%symbol, pnl = record.pnl, "model exit");
                        journal_event(
                            &mut journal,
                            self.run_id,
                            "exit",
                            &symbol,
                            serde_json::to_value(record).unwrap_or_default(),
                        );
                    }
                    _ => {}
                }

                persist_unit(repo, &symbol, &session.executor);
                session.executor.log_equity();

                if let Some(reason) = outcome.blocked {
                    warn!(%symbol, reason = reason.as_str(), "risk guard blocked; halting loop");
                    journal_event(
                        &mut journal,
                        self.run_id,
                        "risk_block",
                        &symbol,
                        json!({ "reason": reason.as_str() }),
                    );
                    iterations += 1;
                    break 'control;
                }
            }

            iterations += 1;
            if !self.config.poll_interval.is_zero() {
                std::thread::sleep(self.config.poll_interval);
            }
        }

        let final_capital = self
            .sessions
            .iter()
            .map(|(s, unit)| (s.clone(), unit.executor.ledger().capital()))
            .collect();
        let closed_trades = self
            .sessions
            .iter()
            .map(|(s, unit)| (s.clone(), unit.executor.ledger().trade_log().len()))
            .collect();

        LiveSummary {
            run_id: self.run_id,
            iterations,
            final_capital,
            closed_trades,
        }
    }
}

/// Snapshots are overwritten after every mutation; a failed write is logged
/// and the loop continues on in-memory state.
fn persist_unit(repo: &mut dyn StateRepository, symbol: &str, executor: &DecisionExecutor) {
    if let Err(e) = fxd_state::save(repo, &format!("risk_{symbol}"), &executor.risk_snapshot()) {
        warn!(%symbol, error = %e, "risk snapshot persist failed; continuing in-memory");
    }
    if let Err(e) = fxd_state::save(
        repo,
        &format!("ledger_{symbol}"),
        &executor.ledger_snapshot(),
    ) {
        warn!(%symbol, error = %e, "ledger snapshot persist failed; continuing in-memory");
    }
}

fn journal_event(
    journal: &mut Option<&mut JournalWriter>,
    run_id: Uuid,
    kind: &str,
    symbol: &str,
    payload: serde_json::Value,
) {
    if let Some(writer) = journal.as_deref_mut() {
        if let Err(e) = writer.append(run_id, kind, symbol, payload) {
            warn!(kind, %symbol, error = %e, "journal append failed");
        }
    }
}
