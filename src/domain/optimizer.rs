//! Scoring and exhaustive grid search over a strategy's declared parameter grid.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use super::backtest::{run_single, StrategySpec};
use super::error::TradebotError;
use super::ledger::LedgerConfig;
use super::metrics::Metrics;
use super::ohlcv::Bar;
use super::strategy::{StrategyKind, StrategyParams};

/// Score of a disqualified candidate.
pub const SCORE_SENTINEL: f64 = -1e9;

pub const DEFAULT_MIN_TRADES: usize = 6;
pub const DEFAULT_MAX_DD_CAP: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreConfig {
    pub min_trades: usize,
    pub max_dd_cap: f64,
    /// Evaluate candidates on the rayon pool. Ignored without the `parallel` feature.
    pub parallel: bool,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        ScoreConfig {
            min_trades: DEFAULT_MIN_TRADES,
            max_dd_cap: DEFAULT_MAX_DD_CAP,
            parallel: true,
        }
    }
}

/// 0.6 * sharpe + 0.4 * cagr% - 2 * max_dd%, or the sentinel when the run has too few
/// trades, does not grow, or draws down past the cap.
pub fn score(metrics: &Metrics, config: &ScoreConfig) -> f64 {
    if metrics.trade_count < config.min_trades
        || metrics.cagr <= 0.0
        || metrics.max_dd > config.max_dd_cap
    {
        return SCORE_SENTINEL;
    }
    0.6 * metrics.sharpe + 0.4 * (metrics.cagr * 100.0) - 2.0 * (metrics.max_dd * 100.0)
}

fn score_or_sentinel(metrics: Option<&Metrics>, config: &ScoreConfig) -> f64 {
    metrics.map_or(SCORE_SENTINEL, |m| score(m, config))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridSearchOutcome {
    pub kind: StrategyKind,
    pub params: StrategyParams,
    /// `None` only when the series holds no valid bar.
    pub metrics: Option<Metrics>,
    pub score: f64,
    /// False when every candidate was disqualified and `params` is merely the least bad.
    pub viable: bool,
    pub candidates: usize,
}

impl GridSearchOutcome {
    /// The winning parameters as a spec for a follow-up backtest.
    pub fn spec(&self, ledger: LedgerConfig) -> StrategySpec {
        StrategySpec::new(self.params.clone(), ledger)
    }
}

fn evaluate(
    bars: &[Bar],
    params: &StrategyParams,
    ledger: LedgerConfig,
    config: &ScoreConfig,
) -> (Option<Metrics>, f64) {
    let instance = run_single(bars, &StrategySpec::new(params.clone(), ledger));
    let metrics = instance.metrics();
    let score = score_or_sentinel(metrics.as_ref(), config);
    debug!(?params, score, "candidate evaluated");
    (metrics, score)
}

fn evaluate_all(
    bars: &[Bar],
    grid: &[StrategyParams],
    ledger: LedgerConfig,
    config: &ScoreConfig,
) -> Vec<(Option<Metrics>, f64)> {
    #[cfg(feature = "parallel")]
    {
        if config.parallel {
            return grid
                .par_iter()
                .map(|params| evaluate(bars, params, ledger, config))
                .collect();
        }
    }
    grid.iter()
        .map(|params| evaluate(bars, params, ledger, config))
        .collect()
}

/// Backtest every combination of `kind`'s grid over `bars` and keep the best score.
///
/// Results are reduced in enumeration order with a strict `>`, so the first candidate to
/// reach the maximum wins ties and parallel evaluation gives the same answer as serial.
pub fn grid_search_one(
    bars: &[Bar],
    kind: StrategyKind,
    ledger: LedgerConfig,
    config: &ScoreConfig,
) -> Result<GridSearchOutcome, TradebotError> {
    grid_search(bars, kind, StrategyParams::grid(kind), ledger, config)
}

/// Grid search over an explicit candidate list of one kind.
pub fn grid_search(
    bars: &[Bar],
    kind: StrategyKind,
    grid: Vec<StrategyParams>,
    ledger: LedgerConfig,
    config: &ScoreConfig,
) -> Result<GridSearchOutcome, TradebotError> {
    let _span = info_span!("grid_search", strategy = %kind, candidates = grid.len()).entered();

    let results = evaluate_all(bars, &grid, ledger, config);
    let candidates = grid.len();

    let mut best: Option<(StrategyParams, Option<Metrics>, f64)> = None;
    for (params, (metrics, score)) in grid.into_iter().zip(results) {
        let better = match &best {
            None => true,
            Some((_, _, best_score)) => score > *best_score,
        };
        if better {
            best = Some((params, metrics, score));
        }
    }

    let (params, metrics, score) = best.ok_or(TradebotError::EmptyGrid {
        strategy: kind.config_name().to_string(),
    })?;
    let viable = score > SCORE_SENTINEL;
    if viable {
        info!(?params, score, "best parameters");
    } else {
        warn!(?params, "every candidate was disqualified");
    }

    Ok(GridSearchOutcome {
        kind,
        params,
        metrics,
        score,
        viable,
        candidates,
    })
}

/// Grid search each kind in turn, in the order given.
pub fn optimize_all(
    bars: &[Bar],
    kinds: &[StrategyKind],
    ledger: LedgerConfig,
    config: &ScoreConfig,
) -> Result<Vec<GridSearchOutcome>, TradebotError> {
    kinds
        .iter()
        .map(|&kind| grid_search_one(bars, kind, ledger, config))
        .collect()
}
