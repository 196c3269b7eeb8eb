//! Cash and position accounting for one strategy instance.
//!
//! Long only, all-in: a BUY spends the whole cash balance (fee included) and a SELL
//! liquidates the whole position. Equity is sampled on every step.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::strategy::Signal;

/// Quantities at or below this are treated as nothing to buy.
pub const MIN_QUANTITY: f64 = 1e-9;

pub const DEFAULT_FEE: f64 = 0.001;
pub const DEFAULT_START_CASH: f64 = 5000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LedgerConfig {
    /// Proportional fee charged on both sides of a trade.
    pub fee: f64,
    pub start_cash: f64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            fee: DEFAULT_FEE,
            start_cash: DEFAULT_START_CASH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub timestamp: DateTime<Utc>,
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
    pub strategy_id: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquitySample {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    strategy_id: usize,
    config: LedgerConfig,
    cash: f64,
    position: f64,
    trades: Vec<Trade>,
    equity: Vec<EquitySample>,
}

impl Ledger {
    pub fn new(strategy_id: usize, config: LedgerConfig) -> Self {
        Ledger {
            strategy_id,
            config,
            cash: config.start_cash,
            position: 0.0,
            trades: Vec::new(),
            equity: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.cash = self.config.start_cash;
        self.position = 0.0;
        self.trades.clear();
        self.equity.clear();
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn is_holding(&self) -> bool {
        self.position > 0.0
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn equity(&self) -> &[EquitySample] {
        &self.equity
    }

    /// Apply `signal` at `price`, then record equity. Returns the side of the trade
    /// executed on this step, if any.
    pub fn step(&mut self, timestamp: DateTime<Utc>, price: f64, signal: Signal) -> Option<Side> {
        let executed = match signal {
            Signal::Buy if self.position == 0.0 => self.buy(timestamp, price),
            Signal::Sell if self.position > 0.0 => Some(self.sell(timestamp, price)),
            _ => None,
        };
        self.equity.push(EquitySample {
            timestamp,
            equity: self.cash + self.position * price,
        });
        executed
    }

    fn buy(&mut self, timestamp: DateTime<Utc>, price: f64) -> Option<Side> {
        let unit_cost = price * (1.0 + self.config.fee);
        let quantity = self.cash / unit_cost;
        // A zero or invalid price yields an infinite or NaN quantity.
        if !quantity.is_finite() || quantity <= MIN_QUANTITY {
            return None;
        }
        self.cash = (self.cash - quantity * unit_cost).max(0.0);
        self.position = quantity;
        self.record(timestamp, Side::Buy, price, quantity);
        Some(Side::Buy)
    }

    fn sell(&mut self, timestamp: DateTime<Utc>, price: f64) -> Side {
        let quantity = self.position;
        self.cash += quantity * price * (1.0 - self.config.fee);
        self.position = 0.0;
        self.record(timestamp, Side::Sell, price, quantity);
        Side::Sell
    }

    fn record(&mut self, timestamp: DateTime<Utc>, side: Side, price: f64, quantity: f64) {
        debug!(
            strategy_id = self.strategy_id,
            ?side,
            price,
            quantity,
            cash = self.cash,
            "trade"
        );
        self.trades.push(Trade {
            timestamp,
            side,
            price,
            quantity,
            strategy_id: self.strategy_id,
        });
    }
}
