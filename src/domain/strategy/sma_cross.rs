//! Fast/slow SMA crossover with an RSI filter and a percentage trailing stop.

use serde::Serialize;

use super::{crossed_down, crossed_up, unseen, BarView, Signal};
use crate::domain::indicator::{RollingWindow, Rsi};

/// RSI level above which an open position is always closed.
pub const OVERBOUGHT: f64 = 70.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmaCrossParams {
    pub fast: usize,
    pub slow: usize,
    pub rsi_period: usize,
    pub rsi_filter: f64,
    pub trail_pct: f64,
}

impl Default for SmaCrossParams {
    fn default() -> Self {
        SmaCrossParams {
            fast: 10,
            slow: 30,
            rsi_period: 14,
            rsi_filter: 50.0,
            trail_pct: 0.02,
        }
    }
}

impl SmaCrossParams {
    pub fn grid() -> Vec<Self> {
        let mut out = Vec::new();
        for fast in [7, 10, 14] {
            for slow in [25, 30, 40] {
                if fast >= slow {
                    continue;
                }
                for rsi_period in [10, 14, 21] {
                    for rsi_filter in [48.0, 50.0, 55.0] {
                        for trail_pct in [0.01, 0.02, 0.03] {
                            out.push(SmaCrossParams {
                                fast,
                                slow,
                                rsi_period,
                                rsi_filter,
                                trail_pct,
                            });
                        }
                    }
                }
            }
        }
        out
    }

    /// Bars of history required before the rule may act.
    pub fn min_history(&self) -> usize {
        self.fast.max(self.slow) + 2
    }
}

#[derive(Debug, Clone)]
pub struct SmaCross {
    params: SmaCrossParams,
    fast: RollingWindow,
    slow: RollingWindow,
    rsi: Rsi,
    seen: usize,
    spread_prev: Option<f64>,
    spread_now: Option<f64>,
    rsi_now: Option<f64>,
    high_since_entry: Option<f64>,
}

impl SmaCross {
    pub fn new(params: SmaCrossParams) -> Self {
        SmaCross {
            fast: RollingWindow::new(params.fast),
            slow: RollingWindow::new(params.slow),
            rsi: Rsi::new(params.rsi_period),
            params,
            seen: 0,
            spread_prev: None,
            spread_now: None,
            rsi_now: None,
            high_since_entry: None,
        }
    }

    pub fn params(&self) -> &SmaCrossParams {
        &self.params
    }

    pub fn reset(&mut self) {
        *self = SmaCross::new(self.params.clone());
    }

    fn ingest(&mut self, closes: &[f64]) {
        for &close in unseen(closes, self.seen) {
            self.fast.push(close);
            self.slow.push(close);
            self.spread_prev = self.spread_now;
            self.spread_now = self.fast.mean().zip(self.slow.mean()).map(|(f, s)| f - s);
            self.rsi_now = self.rsi.update(close);
            self.seen += 1;
        }
    }

    pub fn decide(&mut self, view: &BarView<'_>) -> Signal {
        self.ingest(view.closes);
        if view.closes.len() < self.params.min_history() {
            return Signal::Hold;
        }
        let (Some(prev), Some(now)) = (self.spread_prev, self.spread_now) else {
            return Signal::Hold;
        };

        let p = &self.params;
        let price = view.price;
        if view.holding {
            let mark = self.high_since_entry.map_or(price, |m| m.max(price));
            self.high_since_entry = Some(mark);
            let overbought = self.rsi_now.is_some_and(|r| r > OVERBOUGHT);
            if price <= mark * (1.0 - p.trail_pct) || crossed_down(prev, now) || overbought {
                self.high_since_entry = None;
                return Signal::Sell;
            }
        } else if crossed_up(prev, now) && self.rsi_now.is_some_and(|r| r >= p.rsi_filter) {
            self.high_since_entry = Some(price);
            return Signal::Buy;
        }
        Signal::Hold
    }
}
