//! MACD histogram crossover with an RSI filter and a percentage trailing stop.
//!
//! Entry (flat): histogram flips negative to positive and RSI >= rsi_buy.
//! Exit (holding): histogram flips positive to negative, RSI >= rsi_sell, or price falls to
//! the high-water mark * (1 - trail_pct).

use serde::Serialize;

use super::{crossed_down, crossed_up, unseen, BarView, Signal};
use crate::domain::indicator::{Macd, Rsi};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacdRsiParams {
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub rsi_period: usize,
    pub rsi_buy: f64,
    pub rsi_sell: f64,
    pub trail_pct: f64,
}

impl Default for MacdRsiParams {
    fn default() -> Self {
        MacdRsiParams {
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            rsi_period: 14,
            rsi_buy: 55.0,
            rsi_sell: 70.0,
            trail_pct: 0.02,
        }
    }
}

impl MacdRsiParams {
    pub fn grid() -> Vec<Self> {
        let mut out = Vec::new();
        for macd_fast in [8, 12, 16] {
            for macd_slow in [21, 26, 32] {
                if macd_fast >= macd_slow {
                    continue;
                }
                for macd_signal in [7, 9, 12] {
                    for rsi_period in [10, 14, 21] {
                        for rsi_buy in [52.0, 55.0, 58.0] {
                            for rsi_sell in [65.0, 70.0, 75.0] {
                                if rsi_buy >= rsi_sell {
                                    continue;
                                }
                                for trail_pct in [0.01, 0.02, 0.03] {
                                    out.push(MacdRsiParams {
                                        macd_fast,
                                        macd_slow,
                                        macd_signal,
                                        rsi_period,
                                        rsi_buy,
                                        rsi_sell,
                                        trail_pct,
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct MacdRsi {
    params: MacdRsiParams,
    macd: Macd,
    rsi: Rsi,
    seen: usize,
    hist_prev: f64,
    hist_now: f64,
    rsi_now: Option<f64>,
    high_since_entry: Option<f64>,
}

impl MacdRsi {
    pub fn new(params: MacdRsiParams) -> Self {
        MacdRsi {
            macd: Macd::new(params.macd_fast, params.macd_slow, params.macd_signal),
            rsi: Rsi::new(params.rsi_period),
            params,
            seen: 0,
            hist_prev: 0.0,
            hist_now: 0.0,
            rsi_now: None,
            high_since_entry: None,
        }
    }

    pub fn params(&self) -> &MacdRsiParams {
        &self.params
    }

    pub fn high_since_entry(&self) -> Option<f64> {
        self.high_since_entry
    }

    pub fn reset(&mut self) {
        *self = MacdRsi::new(self.params.clone());
    }

    fn ingest(&mut self, closes: &[f64]) {
        for &close in unseen(closes, self.seen) {
            self.hist_prev = self.hist_now;
            self.hist_now = self.macd.update(close).histogram;
            self.rsi_now = self.rsi.update(close);
            self.seen += 1;
        }
    }

    pub fn decide(&mut self, view: &BarView<'_>) -> Signal {
        self.ingest(view.closes);
        if self.seen < 3 {
            return Signal::Hold;
        }

        let p = &self.params;
        let price = view.price;
        if view.holding {
            let mark = self.high_since_entry.map_or(price, |m| m.max(price));
            self.high_since_entry = Some(mark);
            let trail_stop = mark * (1.0 - p.trail_pct);
            let rsi_exit = self.rsi_now.is_some_and(|r| r >= p.rsi_sell);
            if crossed_down(self.hist_prev, self.hist_now) || rsi_exit || price <= trail_stop {
                self.high_since_entry = None;
                return Signal::Sell;
            }
        } else if crossed_up(self.hist_prev, self.hist_now)
            && self.rsi_now.is_some_and(|r| r >= p.rsi_buy)
        {
            self.high_since_entry = Some(price);
            return Signal::Buy;
        }
        Signal::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::{StrategyParams, StrategyRule};
    use super::*;

    /// Shallow pullback, then a steady rally, then a sell-off.
    fn pullback_rally_selloff() -> Vec<f64> {
        let mut prices: Vec<f64> = (0..=40).map(|i| 100.0 - 0.05 * i as f64).collect();
        let base = *prices.last().unwrap();
        prices.extend((1..=60).map(|i| base + (200.0 - base) * i as f64 / 60.0));
        prices.extend((1..=20).map(|i| 200.0 - 150.0 * i as f64 / 20.0));
        prices
    }

    #[test]
    fn default_params() {
        let p = MacdRsiParams::default();
        assert_eq!((p.macd_fast, p.macd_slow, p.macd_signal), (12, 26, 9));
        assert_eq!(p.rsi_period, 14);
        assert_eq!((p.rsi_buy, p.rsi_sell, p.trail_pct), (55.0, 70.0, 0.02));
    }

    #[test]
    fn grid_first_and_last() {
        let grid = MacdRsiParams::grid();
        assert_eq!(grid[0].macd_fast, 8);
        assert_eq!(grid[0].trail_pct, 0.01);
        let last = grid.last().unwrap();
        assert_eq!((last.macd_fast, last.macd_slow), (16, 32));
        assert_eq!(last.trail_pct, 0.03);
    }

    #[test]
    fn holds_before_three_bars() {
        let mut rule = MacdRsi::new(MacdRsiParams::default());
        let closes = [100.0, 90.0];
        let view = BarView {
            timestamp: minute(1),
            price: 90.0,
            closes: &closes,
            bars: None,
            holding: false,
        };
        assert_eq!(rule.decide(&view), Signal::Hold);
    }

    #[test]
    fn enters_on_first_rally_bar_and_exits_on_overbought_rsi() {
        let bars = flat_bars(&pullback_rally_selloff());
        let mut rule = StrategyRule::new(&StrategyParams::MacdRsi(MacdRsiParams::default()));
        let fills = drive(&mut rule, &bars);

        assert_eq!(fills.len(), 2, "fills: {:?}", fills);
        assert_eq!(fills[0], (41, Signal::Buy));
        assert_eq!(fills[1].1, Signal::Sell);
        assert!(fills[1].0 > 41 && fills[1].0 <= 100);
    }

    #[test]
    fn trailing_stop_exits_when_rsi_exit_is_disabled() {
        let prices = pullback_rally_selloff();
        let bars = flat_bars(&prices);
        let params = MacdRsiParams {
            rsi_sell: 101.0,
            ..MacdRsiParams::default()
        };
        let mut rule = StrategyRule::new(&StrategyParams::MacdRsi(params));
        let fills = drive(&mut rule, &bars);

        assert_eq!(fills[0], (41, Signal::Buy));
        let (exit_idx, side) = fills[1];
        assert_eq!(side, Signal::Sell);

        // The first bar at or below 98% of the running high since entry.
        let mut high = prices[41];
        let stop_idx = (42..prices.len())
            .find(|&i| {
                high = high.max(prices[i]);
                prices[i] <= high * 0.98
            })
            .unwrap();
        assert!(exit_idx <= stop_idx);
        assert!(exit_idx > 100, "exit during the rally at {}", exit_idx);
    }

    #[test]
    fn reset_clears_state() {
        let bars = flat_bars(&pullback_rally_selloff());
        let mut rule = MacdRsi::new(MacdRsiParams::default());
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let view = BarView {
            timestamp: minute(41),
            price: closes[41],
            closes: &closes[..=41],
            bars: None,
            holding: false,
        };
        assert_eq!(rule.decide(&view), Signal::Buy);
        assert!(rule.high_since_entry().is_some());

        rule.reset();
        assert!(rule.high_since_entry().is_none());
        assert_eq!(rule.seen, 0);
    }
}
