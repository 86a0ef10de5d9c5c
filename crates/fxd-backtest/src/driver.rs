use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use fxd_execution::{
    DecisionExecutor, ExecutorConfig, ImmediateFill, StepAction,
};
use fxd_instruments::LotLimits;
use fxd_ledger::{PositionLedger, TradeRecord};
use fxd_oracle::{OracleClient, Verdict};
use fxd_report::{summarize, PerformanceSummary};
use fxd_risk::{RiskConfig, RiskGuard};
use fxd_state::StateRepository;

use crate::loader::ReplayRow;

/// Everything a replay run needs beyond the rows themselves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    pub symbol: String,
    pub initial_capital: f64,
    /// First row the scan acts on; earlier rows exist only as history.
    pub start_index: usize,
    pub risk: RiskConfig,
    pub executor: ExecutorConfig,
    pub limits: LotLimits,
    /// Hash of the configuration this run executed under, when known.
    pub config_hash: Option<String>,
}

impl ReplayConfig {
    pub fn test_defaults(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            initial_capital: 10_000.0,
            start_index: 0,
            risk: RiskConfig::defaults_for(10_000.0),
            executor: ExecutorConfig::default(),
            limits: fxd_instruments::DEFAULT_LOT_LIMITS,
            config_hash: None,
        }
    }
}

/// Output of one replay run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub run_id: Uuid,
    pub symbol: String,
    pub config_hash: Option<String>,
    pub final_capital: f64,
    pub equity_curve: Vec<f64>,
    pub trades: Vec<TradeRecord>,
    pub decision_counts: BTreeMap<String, u64>,
    pub summary: PerformanceSummary,
}

/// The replay driver: owns one instrument unit and an always-fill router.
pub struct ReplayDriver {
    config: ReplayConfig,
    executor: DecisionExecutor,
    router: ImmediateFill,
}

impl ReplayDriver {
    pub fn new(config: ReplayConfig) -> Self {
        let ledger = PositionLedger::new(config.symbol.clone(), config.initial_capital);
        let guard = RiskGuard::new(config.risk);
        let executor = DecisionExecutor::new(
            ledger,
            guard,
            config.limits,
            config.executor,
            config.start_index as i64,
        );
        Self {
            config,
            executor,
            router: ImmediateFill::new(),
        }
    }

    /// Scan `rows` from `start_index`, one step per row.
    ///
    /// Per-step errors (oracle failure, persistence failure) are logged and
    /// absorbed; the scan always completes so the report covers the whole
    /// input. The run id is derived from the input length and config hash so
    /// identical runs produce identical reports.
    pub fn run(
        &mut self,
        rows: &[ReplayRow],
        oracle: &mut dyn OracleClient,
        repo: &mut dyn StateRepository,
    ) -> ReplayReport {
        let run_id = self.derive_run_id(rows.len());
        let mut decision_counts: BTreeMap<String, u64> = BTreeMap::new();

        info!(
            symbol = %self.config.symbol,
            rows = rows.len(),
            start_index = self.config.start_index,
            "replay started"
        );

        for (index, row) in rows.iter().enumerate().skip(self.config.start_index) {
            let features = row.features.clone().sanitized();
            let session = self.executor.session_state(row.close, row.time);

            let verdict = match oracle.decide(&features, &session) {
                Ok(v) => v,
                Err(e) => {
                    warn!(step = index, error = %e, "oracle failed; treating as no_action");
                    Verdict::no_action()
                }
            };
            *decision_counts
                .entry(verdict.decision.label().to_string())
                .or_insert(0) += 1;

            let outcome = self
                .executor
                .step(row.close, row.time, &verdict, &mut self.router);

            if let Some(exit) = &outcome.protective_exit {
                info!(
                    step = index,
                    reason = exit.reason.as_str(),
                    pnl = exit.pnl,
                    "protective exit"
                );
            }
            match &outcome.action {
                StepAction::Entered {
                    direction,
                    size_lots,
                    fill_price,
                    ..
                } => info!(
                    step = index,
                    direction = direction.as_str(),
                    size_lots,
                    price = fill_price,
                    confidence = verdict.confidence,
                    "entered position"
                ),
                StepAction::Exited(record) => {
                    info!(step = index, pnl = record.pnl, "model exit")
                }
                _ => {}
            }

            self.persist(repo);
            self.executor.log_equity();
        }

        let ledger = self.executor.ledger();
        let summary = summarize(ledger.equity_curve(), ledger.trade_log());
        info!(
            symbol = %self.config.symbol,
            trades = summary.trades,
            final_capital = ledger.capital(),
            "replay complete"
        );

        ReplayReport {
            run_id,
            symbol: self.config.symbol.clone(),
            config_hash: self.config.config_hash.clone(),
            final_capital: ledger.capital(),
            equity_curve: ledger.equity_curve().to_vec(),
            trades: ledger.trade_log().to_vec(),
            decision_counts,
            summary,
        }
    }

    /// Snapshots are overwritten after every step; a failed write is logged
    /// and the scan continues on in-memory state.
    fn persist(&self, repo: &mut dyn StateRepository) {
        let risk_name = format!("risk_{}", self.config.symbol);
        if let Err(e) = fxd_state::save(repo, &risk_name, &self.executor.risk_snapshot()) {
            warn!(error = %e, "risk snapshot persist failed; continuing in-memory");
        }
        let ledger_name = format!("ledger_{}", self.config.symbol);
        if let Err(e) = fxd_state::save(repo, &ledger_name, &self.executor.ledger_snapshot()) {
            warn!(error = %e, "ledger snapshot persist failed; continuing in-memory");
        }
    }

    /// Deterministic run id: UUIDv5 over (symbol, row count, start index,
    /// config hash). Identical inputs name identical runs.
    fn derive_run_id(&self, rows: usize) -> Uuid {
        let material = format!(
            "{}|{}|{}|{}",
            self.config.symbol,
            rows,
            self.config.start_index,
            self.config.config_hash.as_deref().unwrap_or("")
        );
        Uuid::new_v5(&Uuid::NAMESPACE_OID, material.as_bytes())
    }
}
