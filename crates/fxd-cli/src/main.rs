//! fxdesk entry point.
//!
//! This file is intentionally thin: it sets up tracing, loads layered
//! config, and wires the replay or live driver. All engine behavior lives in
//! the fxd-* library crates.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use fxd_backtest::{write_run_artifacts, ReplayConfig, ReplayDriver};
use fxd_broker_paper::PaperBroker;
use fxd_config::{load_layered_yaml, load_layered_yaml_from_strings, LoadedConfig, Settings};
use fxd_execution::ExecutorConfig;
use fxd_instruments::StaticCatalog;
use fxd_oracle::ScriptedOracle;
use fxd_risk::RiskConfig;
use fxd_runtime::{Candle, ControlFlags, FeedError, LiveConfig, LiveDriver, MarketFeed};
use fxd_state::JsonStateRepository;

#[derive(Parser)]
#[command(name = "fxdesk")]
#[command(about = "FX position-lifecycle and risk-control engine", long_about = None)]
struct Cli {
    /// YAML config paths in merge order (base -> overrides).
    #[arg(long = "config", global = true)]
    config: Vec<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay historical rows through the engine and export run artifacts.
    Backtest {
        /// Market CSV (header row, `close` required). Defaults to
        /// general.data_path from config.
        #[arg(long)]
        data: Option<String>,

        /// Verdict log (JSONL, one verdict per step). Without it every step
        /// is no_action.
        #[arg(long)]
        verdicts: Option<String>,

        /// First row the scan acts on.
        #[arg(long, default_value_t = 0)]
        start_index: usize,

        /// Run artifact root directory.
        #[arg(long, default_value = "exports")]
        exports: String,

        /// Snapshot directory. Defaults to runtime.state_dir from config.
        #[arg(long)]
        state_dir: Option<String>,
    },

    /// Run the live loop against a paper broker, polling a feed directory
    /// (`<dir>/<SYMBOL>.csv`, last row = latest candle). Operator commands
    /// (`pause` / `resume` / `stop`) are read from stdin.
    Live {
        /// Directory of per-symbol candle CSVs.
        #[arg(long, default_value = "feed")]
        feed_dir: String,

        /// Snapshot + journal directory. Defaults to runtime.state_dir from
        /// config.
        #[arg(long)]
        state_dir: Option<String>,
    },

    /// Compute the layered config hash + print canonical JSON.
    ConfigHash,
}

fn main() -> Result<()> {
    // Load .env.local if present (dev convenience). Silent when absent —
    // production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();
    let loaded = load_config(&cli.config)?;

    match cli.cmd {
        Commands::Backtest {
            data,
            verdicts,
            start_index,
            exports,
            state_dir,
        } => run_backtest(&loaded, data, verdicts, start_index, &exports, state_dir),
        Commands::Live {
            feed_dir,
            state_dir,
        } => run_live(&loaded, &feed_dir, state_dir),
        Commands::ConfigHash => {
            println!("{}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
            Ok(())
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn load_config(paths: &[String]) -> Result<LoadedConfig> {
    if paths.is_empty() {
        // No config given: defaults for every section.
        return load_layered_yaml_from_strings(&[]);
    }
    let refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    load_layered_yaml(&refs)
}

fn run_backtest(
    loaded: &LoadedConfig,
    data: Option<String>,
    verdicts: Option<String>,
    start_index: usize,
    exports: &str,
    state_dir: Option<String>,
) -> Result<()> {
    let settings = loaded.settings()?;
    let symbol = first_symbol(&settings)?;
    let state_dir = state_dir.unwrap_or_else(|| settings.runtime.state_dir.clone());

    let data_path = data.unwrap_or_else(|| settings.general.data_path.clone());
    let rows = fxd_backtest::load_csv_file(&data_path)
        .with_context(|| format!("load market data from {data_path}"))?;
    if start_index >= rows.len() {
        bail!(
            "start index {start_index} is beyond the data ({} rows)",
            rows.len()
        );
    }

    let mut oracle = match &verdicts {
        Some(path) => {
            let script = fxd_backtest::load_verdict_log(path)
                .with_context(|| format!("load verdict log from {path}"))?;
            info!(verdicts = script.len(), "loaded verdict log");
            ScriptedOracle::new(script)
        }
        None => {
            warn!("no verdict log given; every step will be no_action");
            ScriptedOracle::default()
        }
    };

    let config = ReplayConfig {
        symbol: symbol.clone(),
        initial_capital: settings.trading.initial_capital,
        start_index,
        risk: risk_config(&settings),
        executor: ExecutorConfig {
            min_confidence: 0.0,
            fallback_size_lots: settings.broker.lot_size,
        },
        limits: fxd_instruments::DEFAULT_LOT_LIMITS,
        config_hash: Some(loaded.config_hash.clone()),
    };

    let mut repo = JsonStateRepository::new(state_dir);
    let mut driver = ReplayDriver::new(config);
    let report = driver.run(&rows, &mut oracle, &mut repo);

    let artifacts = write_run_artifacts(&report, Path::new(exports))?;

    println!("run_id:          {}", report.run_id);
    println!("final_capital:   {:.2}", report.final_capital);
    println!("trades:          {}", report.summary.trades);
    println!("max_drawdown:    {:.2}%", report.summary.max_drawdown * 100.0);
    println!("sharpe:          {:.2}", report.summary.sharpe);
    println!("win_rate:        {:.2}%", report.summary.win_rate * 100.0);
    println!("avg_win:         {:.2}", report.summary.avg_win);
    println!("avg_loss:        {:.2}", report.summary.avg_loss);
    println!("profit_factor:   {:.2}", report.summary.profit_factor);
    println!("recovery_factor: {:.2}", report.summary.recovery_factor);
    for (decision, count) in &report.decision_counts {
        println!("decision {decision}: {count}");
    }
    println!("artifacts: {}", artifacts.run_dir.display());

    Ok(())
}

fn run_live(loaded: &LoadedConfig, feed_dir: &str, state_dir: Option<String>) -> Result<()> {
    let settings = loaded.settings()?;
    if settings.general.symbols.is_empty() {
        bail!("no symbols configured");
    }
    let state_dir = state_dir.unwrap_or_else(|| settings.runtime.state_dir.clone());

    let config = LiveConfig {
        symbols: settings.general.symbols.clone(),
        initial_capital: settings.trading.initial_capital,
        risk: risk_config(&settings),
        executor: ExecutorConfig {
            min_confidence: settings.trading.min_confidence,
            fallback_size_lots: settings.broker.lot_size,
        },
        poll_interval: Duration::from_secs(settings.runtime.poll_interval_secs),
        call_timeout: Duration::from_secs(settings.runtime.call_timeout_secs),
        warmup_candles: 5,
    };

    let mut repo = JsonStateRepository::new(&state_dir);
    let mut journal =
        fxd_audit::JournalWriter::new(Path::new(&state_dir).join("journal.jsonl"), true)?;

    let flags = ControlFlags::new();
    spawn_operator_reader(flags.clone());

    let mut feed = LatestRowFeed {
        dir: PathBuf::from(feed_dir),
    };
    let mut router = PaperBroker::new(settings.trading.initial_capital);
    // The external decision source is wired per deployment; with none
    // attached the loop books protective exits only.
    let mut oracle = ScriptedOracle::default();

    let catalog = StaticCatalog::new();
    let mut driver = LiveDriver::new(config, &catalog, &repo);
    let summary = driver.run(
        &mut feed,
        &mut oracle,
        &mut router,
        &mut repo,
        Some(&mut journal),
        &flags,
    );

    println!("run_id:     {}", summary.run_id);
    println!("iterations: {}", summary.iterations);
    for (symbol, capital) in &summary.final_capital {
        println!(
            "{symbol}: capital {:.2}, trades {}",
            capital, summary.closed_trades[symbol]
        );
    }

    Ok(())
}

fn risk_config(settings: &Settings) -> RiskConfig {
    RiskConfig::new(
        settings.trading.initial_capital,
        settings.trading.max_drawdown,
        settings.trading.max_consecutive_losses,
        settings.trading.cooldown_steps,
    )
}

fn first_symbol(settings: &Settings) -> Result<String> {
    settings
        .general
        .symbols
        .first()
        .cloned()
        .context("no symbols configured")
}

/// Reads operator commands from stdin and writes the control flags.
/// Single writer, as the loop requires.
fn spawn_operator_reader(flags: ControlFlags) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) => break, // stdin closed; the loop keeps running
                Ok(_) => match line.trim() {
                    "pause" => flags.pause(),
                    "resume" => flags.resume(),
                    "stop" => {
                        flags.stop();
                        break;
                    }
                    "" => {}
                    other => eprintln!("unknown command: {other} (pause|resume|stop)"),
                },
                Err(_) => break,
            }
        }
    });
}

/// Feed that re-reads `<dir>/<SYMBOL>.csv` and serves its last row as the
/// latest candle. Reads are single bounded file reads, so the configured
/// call timeout is honored trivially.
struct LatestRowFeed {
    dir: PathBuf,
}

impl MarketFeed for LatestRowFeed {
    fn poll_candle(&mut self, symbol: &str, _timeout: Duration) -> Result<Candle, FeedError> {
        let path = self.dir.join(format!("{symbol}.csv"));
        let content = std::fs::read_to_string(&path).map_err(|e| FeedError::Unavailable {
            detail: format!("{}: {e}", path.display()),
        })?;
        let rows = fxd_backtest::parse_csv_rows(&content).map_err(|e| FeedError::Unavailable {
            detail: e.to_string(),
        })?;
        let row = rows.last().ok_or_else(|| FeedError::Unavailable {
            detail: format!("{}: no rows", path.display()),
        })?;
        Ok(Candle {
            time: row.time,
            close: row.close,
            features: row.features.clone(),
        })
    }
}
