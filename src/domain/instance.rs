//! A strategy instance: one rule bound to its own ledger.

use super::ledger::{EquitySample, Ledger, LedgerConfig, Trade};
use super::metrics::Metrics;
use super::strategy::{BarView, Signal, StrategyKind, StrategyParams, StrategyRule};

#[derive(Debug, Clone)]
pub struct StrategyInstance {
    id: usize,
    name: String,
    params: StrategyParams,
    rule: StrategyRule,
    ledger: Ledger,
    last_signal: Signal,
}

impl StrategyInstance {
    pub fn new(id: usize, params: StrategyParams, ledger: LedgerConfig) -> Self {
        StrategyInstance {
            id,
            name: format!("{}: {}", id, params.kind().display_name()),
            rule: StrategyRule::new(&params),
            params,
            ledger: Ledger::new(id, ledger),
            last_signal: Signal::Hold,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> StrategyKind {
        self.params.kind()
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn trades(&self) -> &[Trade] {
        self.ledger.trades()
    }

    pub fn equity(&self) -> &[EquitySample] {
        self.ledger.equity()
    }

    /// The signal emitted on the most recent bar, for an execution collaborator.
    pub fn last_signal(&self) -> Signal {
        self.last_signal
    }

    /// Decide on the current bar and settle the decision in the ledger.
    pub fn step(&mut self, view: &BarView<'_>) -> Signal {
        let view = BarView {
            holding: self.ledger.is_holding(),
            ..*view
        };
        let signal = self.rule.decide(&view);
        self.ledger.step(view.timestamp, view.price, signal);
        self.last_signal = signal;
        signal
    }

    pub fn reset(&mut self) {
        self.rule.reset();
        self.ledger.reset();
        self.last_signal = Signal::Hold;
    }

    pub fn metrics(&self) -> Option<Metrics> {
        Metrics::compute(self.id, &self.name, self.ledger.trades(), self.ledger.equity())
    }
}
