use fxd_backtest::{write_run_artifacts, ReplayConfig, ReplayDriver, ReplayRow};
use fxd_oracle::{EntryPlan, MarketFeatures, ScriptedOracle, Verdict};
use fxd_risk::{RiskConfig, RiskSnapshot};
use fxd_state::MemoryStateRepository;

fn rows(prices: &[f64]) -> Vec<ReplayRow> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &close)| ReplayRow {
            time: i as i64,
            close,
            features: MarketFeatures::from_iter([("close", close)]),
        })
        .collect()
}

fn buy() -> Verdict {
    Verdict::buy(
        1,
        0.9,
        EntryPlan {
            size_lots: 0.1,
            stop_loss_pct: 0.01,
            take_profit_pct: 0.02,
        },
    )
}

#[test]
fn blocked_guard_suppresses_entries_but_the_scan_completes() {
    // One-loss streak limit: the first stop-out blocks all further entries.
    let data = rows(&[1.0000, 0.9800, 1.0000, 1.0000, 1.0000]);
    let mut config = ReplayConfig::test_defaults("EURUSD");
    config.risk = RiskConfig::new(10_000.0, 0.25, 1, 1);
    let mut driver = ReplayDriver::new(config);
    let mut oracle = ScriptedOracle::new(std::iter::repeat(buy()).take(5));
    let mut repo = MemoryStateRepository::new();

    let report = driver.run(&data, &mut oracle, &mut repo);

    // Exactly one trade: the stop-out. Every later buy was refused.
    assert_eq!(report.trades.len(), 1);
    assert_eq!(report.trades[0].reason, fxd_ledger::ExitReason::StopLoss);
    // The scan still covered every row.
    assert_eq!(report.equity_curve.len(), data.len());
    assert_eq!(report.decision_counts["buy"], 5);
}

#[test]
fn snapshots_are_persisted_every_step() {
    let data = rows(&[1.0000, 1.0010, 1.0020]);
    let mut driver = ReplayDriver::new(ReplayConfig::test_defaults("EURUSD"));
    let mut oracle = ScriptedOracle::new([buy()]);
    let mut repo = MemoryStateRepository::new();

    driver.run(&data, &mut oracle, &mut repo);

    assert_eq!(repo.record_count(), 2); // risk_EURUSD + ledger_EURUSD
    let risk: Option<RiskSnapshot> = fxd_state::load(&repo, "risk_EURUSD").unwrap();
    let risk = risk.expect("risk snapshot written");
    assert_eq!(risk.initial_capital, 10_000.0);

    let ledger: Option<fxd_ledger::LedgerSnapshot> =
        fxd_state::load(&repo, "ledger_EURUSD").unwrap();
    let ledger = ledger.expect("ledger snapshot written");
    assert_eq!(ledger.symbol, "EURUSD");
    // Position opened on step 0 and never closed.
    assert!(ledger.position.is_some());
}

#[test]
fn persistence_outage_is_absorbed() {
    let data = rows(&[1.0000, 1.0010, 1.0020]);
    let mut driver = ReplayDriver::new(ReplayConfig::test_defaults("EURUSD"));
    let mut oracle = ScriptedOracle::new([buy()]);
    let mut repo = MemoryStateRepository::new();
    repo.set_fail_writes(true);

    // Every snapshot write fails; the run must still complete normally.
    let report = driver.run(&data, &mut oracle, &mut repo);
    assert_eq!(report.equity_curve.len(), data.len());
    assert_eq!(repo.record_count(), 0);
}

#[test]
fn run_artifacts_are_written_and_reloadable() {
    let data = rows(&[1.0000, 1.0010, 1.0020, 1.0030]);
    let mut driver = ReplayDriver::new(ReplayConfig::test_defaults("EURUSD"));
    let mut oracle = ScriptedOracle::new([
        buy(),
        Verdict::hold(1, 0.8),
        Verdict::sell(
            -1,
            0.9,
            EntryPlan {
                size_lots: 0.1,
                stop_loss_pct: 0.01,
                take_profit_pct: 0.02,
            },
        ),
    ]);
    let mut repo = MemoryStateRepository::new();
    let report = driver.run(&data, &mut oracle, &mut repo);

    let exports = tempfile::tempdir().unwrap();
    let artifacts = write_run_artifacts(&report, exports.path()).unwrap();

    assert!(artifacts.equity_curve_csv.exists());
    assert!(artifacts.trade_log_csv.exists());
    assert!(artifacts.metrics_json.exists());

    let metrics: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&artifacts.metrics_json).unwrap()).unwrap();
    assert_eq!(metrics["symbol"], "EURUSD");
    assert_eq!(metrics["trades"], 1);

    let equity = std::fs::read_to_string(&artifacts.equity_curve_csv).unwrap();
    // Header + one row per step.
    assert_eq!(equity.lines().count(), 1 + data.len());
}
