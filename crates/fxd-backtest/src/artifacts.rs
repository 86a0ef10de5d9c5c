use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::driver::ReplayReport;

/// Where a run's exported files landed.
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub run_dir: PathBuf,
    pub equity_curve_csv: PathBuf,
    pub trade_log_csv: PathBuf,
    pub metrics_json: PathBuf,
}

#[derive(Serialize)]
struct EquityRow {
    step: usize,
    equity: f64,
}

#[derive(Serialize)]
struct MetricsDoc<'a> {
    run_id: String,
    symbol: &'a str,
    config_hash: Option<&'a str>,
    final_capital: f64,
    #[serde(flatten)]
    summary: &'a fxd_report::PerformanceSummary,
}

/// Write `exports/<run_id>/{equity_curve.csv, trade_log.csv, metrics.json}`.
///
/// Contents are fully determined by the report, so re-exporting the same run
/// overwrites byte-identical files.
pub fn write_run_artifacts(report: &ReplayReport, exports_root: &Path) -> Result<RunArtifacts> {
    let run_dir = exports_root.join(report.run_id.to_string());
    fs::create_dir_all(&run_dir)
        .with_context(|| format!("create exports dir failed: {}", run_dir.display()))?;

    let equity_curve_csv = run_dir.join("equity_curve.csv");
    let mut w = csv::Writer::from_path(&equity_curve_csv)
        .with_context(|| format!("open {} failed", equity_curve_csv.display()))?;
    for (step, equity) in report.equity_curve.iter().enumerate() {
        w.serialize(EquityRow {
            step,
            equity: *equity,
        })
        .context("write equity row failed")?;
    }
    w.flush().context("flush equity curve failed")?;

    let trade_log_csv = run_dir.join("trade_log.csv");
    let mut w = csv::Writer::from_path(&trade_log_csv)
        .with_context(|| format!("open {} failed", trade_log_csv.display()))?;
    for trade in &report.trades {
        w.serialize(trade).context("write trade row failed")?;
    }
    w.flush().context("flush trade log failed")?;

    let metrics_json = run_dir.join("metrics.json");
    let doc = MetricsDoc {
        run_id: report.run_id.to_string(),
        symbol: &report.symbol,
        config_hash: report.config_hash.as_deref(),
        final_capital: report.final_capital,
        summary: &report.summary,
    };
    let json = serde_json::to_string_pretty(&doc).context("serialize metrics failed")?;
    fs::write(&metrics_json, format!("{json}\n"))
        .with_context(|| format!("write metrics failed: {}", metrics_json.display()))?;

    Ok(RunArtifacts {
        run_dir,
        equity_curve_csv,
        trade_log_csv,
        metrics_json,
    })
}
