use assert_cmd::Command;
use predicates::prelude::*;

use fxd_oracle::{EntryPlan, Verdict};

fn fxdesk() -> Command {
    Command::cargo_bin("fxdesk").expect("binary builds")
}

#[test]
fn help_lists_subcommands() {
    fxdesk()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("backtest"))
        .stdout(predicate::str::contains("live"))
        .stdout(predicate::str::contains("config-hash"));
}

#[test]
fn config_hash_is_stable_and_hex() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("base.yaml");
    std::fs::write(&cfg, "trading:\n  initial_capital: 5000\n").unwrap();

    let run = || {
        let out = fxdesk()
            .arg("--config")
            .arg(&cfg)
            .arg("config-hash")
            .output()
            .unwrap();
        assert!(out.status.success());
        String::from_utf8(out.stdout).unwrap()
    };

    let first = run();
    assert_eq!(first, run());

    let hash = first.lines().next().unwrap();
    assert_eq!(hash.len(), 64);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn backtest_runs_end_to_end_and_exports_artifacts() {
    let dir = tempfile::tempdir().unwrap();

    let data = dir.path().join("market.csv");
    std::fs::write(&data, "close\n1.0000\n1.0010\n1.0020\n1.0030\n").unwrap();

    let plan = EntryPlan {
        size_lots: 0.1,
        stop_loss_pct: 0.01,
        take_profit_pct: 0.02,
    };
    let verdicts = dir.path().join("verdicts.jsonl");
    let script = [
        serde_json::to_string(&Verdict::buy(1, 0.9, plan)).unwrap(),
        serde_json::to_string(&Verdict::hold(1, 0.8)).unwrap(),
        serde_json::to_string(&Verdict::sell(-1, 0.9, plan)).unwrap(),
    ]
    .join("\n");
    std::fs::write(&verdicts, script).unwrap();

    let exports = dir.path().join("exports");
    let state = dir.path().join("state");

    fxdesk()
        .arg("backtest")
        .arg("--data")
        .arg(&data)
        .arg("--verdicts")
        .arg(&verdicts)
        .arg("--exports")
        .arg(&exports)
        .arg("--state-dir")
        .arg(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains("final_capital:   10020.00"))
        .stdout(predicate::str::contains("trades:          1"));

    // Exactly one run directory with the three artifacts.
    let run_dirs: Vec<_> = std::fs::read_dir(&exports).unwrap().collect();
    assert_eq!(run_dirs.len(), 1);
    let run_dir = run_dirs[0].as_ref().unwrap().path();
    assert!(run_dir.join("equity_curve.csv").exists());
    assert!(run_dir.join("trade_log.csv").exists());
    assert!(run_dir.join("metrics.json").exists());

    // Snapshots were written for the default symbol.
    assert!(state.join("risk_EURUSD.json").exists());
    assert!(state.join("ledger_EURUSD.json").exists());
}

#[test]
fn backtest_rejects_out_of_range_start_index() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("market.csv");
    std::fs::write(&data, "close\n1.0\n").unwrap();

    fxdesk()
        .arg("backtest")
        .arg("--data")
        .arg(&data)
        .arg("--start-index")
        .arg("5")
        .arg("--exports")
        .arg(dir.path().join("exports"))
        .arg("--state-dir")
        .arg(dir.path().join("state"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("start index"));
}
