//! Donchian channel breakout with an ATR trailing stop.
//!
//! The entry channel is the highest high of the `ch` bars ending one bar back, so the
//! current bar never counts against its own breakout. The exit channel is the lowest low
//! of the last `exit_ch` bars including the current one. The trailing stop only ratchets
//! up.

use serde::Serialize;

use super::{unseen, BarView, Signal};
use crate::domain::indicator::{Atr, RollingExtreme};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonchianParams {
    pub ch: usize,
    pub exit_ch: usize,
    pub atr_n: usize,
    pub atr_mult: f64,
}

impl Default for DonchianParams {
    fn default() -> Self {
        DonchianParams {
            ch: 20,
            exit_ch: 10,
            atr_n: 14,
            atr_mult: 2.0,
        }
    }
}

impl DonchianParams {
    pub fn grid() -> Vec<Self> {
        let mut out = Vec::new();
        for ch in [20, 30] {
            for exit_ch in [10, 15] {
                for atr_n in [14] {
                    for atr_mult in [2.0, 2.5] {
                        out.push(DonchianParams {
                            ch,
                            exit_ch,
                            atr_n,
                            atr_mult,
                        });
                    }
                }
            }
        }
        out
    }

    pub fn min_history(&self) -> usize {
        self.ch.max(self.exit_ch) + 2
    }
}

#[derive(Debug, Clone)]
pub struct DonchianBreakout {
    params: DonchianParams,
    channel_high: RollingExtreme,
    exit_low: RollingExtreme,
    atr: Atr,
    seen: usize,
    prev_channel_high: Option<f64>,
    trailing: Option<f64>,
}

impl DonchianBreakout {
    pub fn new(params: DonchianParams) -> Self {
        DonchianBreakout {
            channel_high: RollingExtreme::max(params.ch),
            exit_low: RollingExtreme::min(params.exit_ch),
            atr: Atr::new(params.atr_n),
            params,
            seen: 0,
            prev_channel_high: None,
            trailing: None,
        }
    }

    pub fn params(&self) -> &DonchianParams {
        &self.params
    }

    /// Current trailing stop, `None` while flat or before ATR is defined.
    pub fn trailing(&self) -> Option<f64> {
        self.trailing
    }

    pub fn reset(&mut self) {
        *self = DonchianBreakout::new(self.params.clone());
    }

    pub fn decide(&mut self, view: &BarView<'_>) -> Signal {
        let Some(bars) = view.bars else {
            return Signal::Hold;
        };
        for bar in unseen(bars, self.seen) {
            self.prev_channel_high = self.channel_high.value();
            self.channel_high.update(bar.high);
            self.exit_low.update(bar.low);
            self.atr.update(bar);
            self.seen += 1;
        }
        let Some(last) = bars.last() else {
            return Signal::Hold;
        };
        if bars.len() < self.params.min_history() {
            return Signal::Hold;
        }

        let price = view.price;
        let stop_candidate = self.atr.value().map(|a| price - self.params.atr_mult * a);
        if view.holding {
            self.trailing = match (self.trailing, stop_candidate) {
                (Some(t), Some(c)) => Some(t.max(c)),
                (t, c) => t.or(c),
            };
            let below_channel = self.exit_low.value().is_some_and(|low| last.close < low);
            let stopped = self.trailing.is_some_and(|t| price < t);
            if below_channel || stopped {
                self.trailing = None;
                return Signal::Sell;
            }
        } else if self.prev_channel_high.is_some_and(|high| last.close > high) {
            self.trailing = stop_candidate;
            return Signal::Buy;
        }
        Signal::Hold
    }
}
