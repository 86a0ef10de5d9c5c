//! Post-hoc performance analytics over a completed equity curve and trade
//! log. Pure free functions plus a summary struct; nothing here mutates
//! engine state.

use serde::{Deserialize, Serialize};

use fxd_ledger::TradeRecord;

/// Divisor guard for ratio metrics.
const EPS: f64 = 1e-8;

/// Annualization factor for the Sharpe ratio (daily steps).
const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Headline metrics for one run.
///
/// `profit_factor` is +∞ when there are no losing trades and
/// `recovery_factor` is +∞ when max drawdown is zero; with an empty trade log
/// every trade statistic is 0.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub max_drawdown: f64,
    pub sharpe: f64,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: f64,
    pub recovery_factor: f64,
    pub trades: usize,
}

/// Compute the full summary for an equity curve and trade log.
pub fn summarize(equity_curve: &[f64], trades: &[TradeRecord]) -> PerformanceSummary {
    let max_drawdown = max_drawdown(equity_curve);
    let sharpe = sharpe_ratio(equity_curve);

    if trades.is_empty() {
        return PerformanceSummary {
            max_drawdown,
            sharpe,
            win_rate: 0.0,
            avg_win: 0.0,
            avg_loss: 0.0,
            profit_factor: 0.0,
            recovery_factor: 0.0,
            trades: 0,
        };
    }

    let pnl: Vec<f64> = trades.iter().map(|t| t.pnl).collect();
    let wins: Vec<f64> = pnl.iter().copied().filter(|p| *p > 0.0).collect();
    let losses: Vec<f64> = pnl.iter().copied().filter(|p| *p < 0.0).collect();

    let win_rate = wins.len() as f64 / pnl.len() as f64;
    let avg_win = mean_or_zero(&wins);
    let avg_loss = mean_or_zero(&losses);

    let profit_factor = if losses.is_empty() {
        f64::INFINITY
    } else {
        let gross_loss: f64 = losses.iter().sum::<f64>().abs();
        wins.iter().sum::<f64>() / (gross_loss + EPS)
    };

    let recovery_factor = recovery_factor(equity_curve, max_drawdown);

    PerformanceSummary {
        max_drawdown,
        sharpe,
        win_rate,
        avg_win,
        avg_loss,
        profit_factor,
        recovery_factor,
        trades: pnl.len(),
    }
}

/// Deepest fractional decline from the running equity peak. Always ≤ 0.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut running_max = f64::MIN;
    let mut worst: f64 = 0.0;
    for &e in equity_curve {
        running_max = running_max.max(e);
        if running_max > 0.0 {
            worst = worst.min((e - running_max) / running_max);
        }
    }
    worst
}

/// Annualized Sharpe ratio over simple step returns, risk-free rate 0.
/// Fewer than two equity points yields 0.
pub fn sharpe_ratio(equity_curve: &[f64]) -> f64 {
    let returns = step_returns(equity_curve);
    if returns.is_empty() {
        return 0.0;
    }
    let mean = mean_or_zero(&returns);
    let variance =
        returns.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / returns.len() as f64;
    mean / (variance.sqrt() + EPS) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Net gain over the magnitude of the worst drawdown (in currency terms).
/// +∞ when the curve never drew down.
pub fn recovery_factor(equity_curve: &[f64], max_drawdown: f64) -> f64 {
    let (Some(first), Some(last)) = (equity_curve.first(), equity_curve.last()) else {
        return 0.0;
    };
    if max_drawdown == 0.0 {
        return f64::INFINITY;
    }
    (last - first) / (max_drawdown * first).abs()
}

/// Simple percentage change between consecutive equity points.
fn step_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

fn mean_or_zero(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().sum::<f64>() / xs.len() as f64
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
