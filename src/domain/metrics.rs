//! Performance summary of one strategy instance.
//!
//! Computed on demand from the trade log and equity series; never stored on the instance.

use serde::Serialize;

use super::ledger::{EquitySample, Side, Trade};

/// Sharpe annualisation assumes one-minute bars.
pub const BARS_PER_DAY: f64 = 1440.0;

const SECONDS_PER_DAY: f64 = 86_400.0;
const DAYS_PER_YEAR: f64 = 365.0;
const MIN_SPAN: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub id: usize,
    pub name: String,
    pub final_equity: f64,
    pub pnl: f64,
    pub sharpe: f64,
    pub max_dd: f64,
    pub trade_count: usize,
    pub winrate: f64,
    pub cagr: f64,
    pub days: f64,
}

impl Metrics {
    /// Returns `None` when the equity series holds no valid sample.
    pub fn compute(
        id: usize,
        name: &str,
        trades: &[Trade],
        equity: &[EquitySample],
    ) -> Option<Metrics> {
        let first_valid = equity.iter().find(|s| s.equity.is_finite())?;
        let last = equity.last()?;
        let values: Vec<f64> = equity
            .iter()
            .map(|s| s.equity)
            .filter(|v| v.is_finite())
            .collect();

        let seconds = (last.timestamp - first_valid.timestamp).num_milliseconds() as f64 / 1000.0;
        let days = (seconds / SECONDS_PER_DAY).max(MIN_SPAN);

        let start_equity = values[0];
        let final_equity = values[values.len() - 1];
        let years = days / DAYS_PER_YEAR;
        let cagr = if start_equity > 0.0 {
            (final_equity / start_equity).powf(1.0 / years.max(MIN_SPAN)) - 1.0
        } else {
            0.0
        };

        let (wins, losses) = count_wins_losses(trades);

        Some(Metrics {
            id,
            name: name.to_string(),
            final_equity,
            pnl: final_equity - start_equity,
            sharpe: compute_sharpe(&values),
            max_dd: compute_drawdown(&values),
            trade_count: trades.len(),
            winrate: wins as f64 / (wins + losses).max(1) as f64,
            cagr,
            days,
        })
    }
}

/// Per-sample simple returns; the first return is zero.
fn simple_returns(values: &[f64]) -> Vec<f64> {
    let mut returns = Vec::with_capacity(values.len());
    returns.push(0.0);
    returns.extend(values.windows(2).map(|w| {
        let r = w[1] / w[0] - 1.0;
        if r.is_nan() { 0.0 } else { r }
    }));
    returns
}

fn compute_sharpe(values: &[f64]) -> f64 {
    let returns = simple_returns(values);
    if returns.len() < 2 {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();
    if stddev > 0.0 {
        mean / stddev * BARS_PER_DAY.sqrt()
    } else {
        0.0
    }
}

fn compute_drawdown(values: &[f64]) -> f64 {
    let Some(&first) = values.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &v in values {
        peak = peak.max(v);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - v) / peak);
        }
    }
    max_dd
}

/// Pair trades two at a time as (BUY, SELL). A trailing BUY without its SELL is not
/// counted.
pub fn count_wins_losses(trades: &[Trade]) -> (usize, usize) {
    let mut wins = 0;
    let mut losses = 0;
    for pair in trades.chunks_exact(2) {
        let (buy, sell) = (&pair[0], &pair[1]);
        debug_assert!(buy.side == Side::Buy && sell.side == Side::Sell);
        if (sell.price - buy.price) * buy.quantity > 0.0 {
            wins += 1;
        } else {
            losses += 1;
        }
    }
    (wins, losses)
}
