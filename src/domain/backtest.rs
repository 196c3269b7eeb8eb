//! Backtest runner: replays one bar series through several strategy instances in
//! lockstep.

use serde::Serialize;
use tracing::{debug, info_span};

use super::instance::StrategyInstance;
use super::ledger::LedgerConfig;
use super::ohlcv::Bar;
use super::strategy::{BarView, StrategyKind, StrategyParams};

/// What to instantiate: rule parameters plus the ledger they trade through.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategySpec {
    pub params: StrategyParams,
    pub ledger: LedgerConfig,
}

impl StrategySpec {
    pub fn new(params: StrategyParams, ledger: LedgerConfig) -> Self {
        StrategySpec { params, ledger }
    }

    pub fn default_for(kind: StrategyKind) -> Self {
        StrategySpec::new(StrategyParams::default_for(kind), LedgerConfig::default())
    }
}

/// All four strategy kinds with default parameters and ledger settings.
pub fn default_specs() -> Vec<StrategySpec> {
    StrategyKind::ALL
        .into_iter()
        .map(StrategySpec::default_for)
        .collect()
}

/// Run every spec over `bars`. Instances get ids 1, 2, ... in spec order.
///
/// Bars whose close is not finite are skipped entirely: no strategy sees them and no
/// equity is sampled for them. Every instance is stepped on bar `i` before any instance
/// sees bar `i + 1`.
pub fn run_backtest(bars: &[Bar], specs: &[StrategySpec]) -> Vec<StrategyInstance> {
    let _span = info_span!("backtest", bars = bars.len(), strategies = specs.len()).entered();

    let mut instances: Vec<StrategyInstance> = specs
        .iter()
        .enumerate()
        .map(|(i, spec)| StrategyInstance::new(i + 1, spec.params.clone(), spec.ledger))
        .collect();

    let mut history: Vec<Bar> = Vec::with_capacity(bars.len());
    let mut closes: Vec<f64> = Vec::with_capacity(bars.len());
    let mut skipped = 0usize;
    for bar in bars {
        if !bar.has_valid_close() {
            skipped += 1;
            continue;
        }
        history.push(*bar);
        closes.push(bar.close);
        let view = BarView {
            timestamp: bar.timestamp,
            price: bar.close,
            closes: &closes,
            bars: Some(&history),
            holding: false,
        };
        for instance in &mut instances {
            instance.step(&view);
        }
    }

    debug!(processed = history.len(), skipped, "backtest finished");
    instances
}

/// Backtest a single fresh instance.
pub fn run_single(bars: &[Bar], spec: &StrategySpec) -> StrategyInstance {
    let mut instances = run_backtest(bars, std::slice::from_ref(spec));
    instances.remove(0)
}
