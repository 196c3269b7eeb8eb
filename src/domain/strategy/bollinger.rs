//! Bollinger band mean reversion with an RSI filter and a static ATR stop.
//!
//! Bands use the population standard deviation. The stop is fixed at entry and is not
//! recomputed while the position is open.

use serde::Serialize;

use super::{unseen, BarView, Signal};
use crate::domain::indicator::{Atr, RollingWindow, Rsi};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BollingerParams {
    pub bb_period: usize,
    pub bb_dev: f64,
    pub rsi_period: usize,
    pub rsi_buy: f64,
    pub rsi_exit: f64,
    pub atr_n: usize,
    pub atr_mult: f64,
}

impl Default for BollingerParams {
    fn default() -> Self {
        BollingerParams {
            bb_period: 20,
            bb_dev: 2.0,
            rsi_period: 14,
            rsi_buy: 35.0,
            rsi_exit: 50.0,
            atr_n: 14,
            atr_mult: 2.0,
        }
    }
}

impl BollingerParams {
    pub fn grid() -> Vec<Self> {
        let mut out = Vec::new();
        for bb_period in [14, 20, 30] {
            for bb_dev in [1.5, 2.0, 2.5] {
                for rsi_period in [10, 14] {
                    for rsi_buy in [30.0, 35.0, 40.0] {
                        for rsi_exit in [48.0, 50.0, 55.0] {
                            for atr_n in [14] {
                                for atr_mult in [1.5, 2.0] {
                                    out.push(BollingerParams {
                                        bb_period,
                                        bb_dev,
                                        rsi_period,
                                        rsi_buy,
                                        rsi_exit,
                                        atr_n,
                                        atr_mult,
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

    pub fn min_history(&self) -> usize {
        self.bb_period.max(self.rsi_period).max(self.atr_n) + 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bands {
    lower: f64,
    mid: f64,
}

#[derive(Debug, Clone)]
pub struct BollingerReversion {
    params: BollingerParams,
    window: RollingWindow,
    rsi: Rsi,
    atr: Atr,
    seen: usize,
    rsi_now: Option<f64>,
    stop: Option<f64>,
}

impl BollingerReversion {
    pub fn new(params: BollingerParams) -> Self {
        BollingerReversion {
            window: RollingWindow::new(params.bb_period),
            rsi: Rsi::new(params.rsi_period),
            atr: Atr::new(params.atr_n),
            params,
            seen: 0,
            rsi_now: None,
            stop: None,
        }
    }

    pub fn params(&self) -> &BollingerParams {
        &self.params
    }

    pub fn stop(&self) -> Option<f64> {
        self.stop
    }

    pub fn reset(&mut self) {
        *self = BollingerReversion::new(self.params.clone());
    }

    fn bands(&self) -> Option<Bands> {
        let mid = self.window.mean()?;
        let width = self.params.bb_dev * self.window.population_std()?;
        Some(Bands {
            lower: mid - width,
            mid,
        })
    }

    pub fn decide(&mut self, view: &BarView<'_>) -> Signal {
        let Some(bars) = view.bars else {
            return Signal::Hold;
        };
        for bar in unseen(bars, self.seen) {
            self.window.push(bar.close);
            self.rsi_now = self.rsi.update(bar.close);
            self.atr.update(bar);
            self.seen += 1;
        }
        if view.closes.len() < self.params.min_history() {
            return Signal::Hold;
        }
        let Some(bands) = self.bands() else {
            return Signal::Hold;
        };

        let p = &self.params;
        let price = view.price;
        if view.holding {
            if self.stop.is_some_and(|s| price <= s) {
                self.stop = None;
                return Signal::Sell;
            }
            if price >= bands.mid || self.rsi_now.is_some_and(|r| r >= p.rsi_exit) {
                self.stop = None;
                return Signal::Sell;
            }
        } else if price <= bands.lower && self.rsi_now.is_some_and(|r| r <= p.rsi_buy) {
            self.stop = self.atr.value().map(|a| price - p.atr_mult * a);
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
    use approx::assert_relative_eq;

    fn small_params() -> BollingerParams {
        BollingerParams {
            bb_period: 5,
            bb_dev: 1.0,
            rsi_period: 3,
            rsi_buy: 35.0,
            rsi_exit: 50.0,
            atr_n: 3,
            atr_mult: 2.0,
        }
    }

    fn with_tail(tail: &[f64]) -> Vec<f64> {
        let mut prices = vec![100.0; 10];
        prices.extend_from_slice(tail);
        prices
    }

    #[test]
    fn grid_size_and_min_history() {
        assert_eq!(BollingerParams::grid().len(), 324);
        assert_eq!(BollingerParams::default().min_history(), 22);
    }

    #[test]
    fn oversold_dip_enters_and_reverts_to_mid() {
        // At the dip: mid = 98, population std = 4, lower band = 94.
        let bars = flat_bars(&with_tail(&[90.0, 92.0, 97.0]));
        let mut rule = StrategyRule::new(&StrategyParams::Bollinger(small_params()));
        let fills = drive(&mut rule, &bars);
        assert_eq!(fills, vec![(10, Signal::Buy), (12, Signal::Sell)]);
    }

    #[test]
    fn static_stop_is_set_once_and_exits() {
        let bars = flat_bars(&with_tail(&[90.0, 80.0]));
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let mut rule = BollingerReversion::new(small_params());

        let at = |i: usize, holding: bool| BarView {
            timestamp: bars[i].timestamp,
            price: closes[i],
            closes: &closes[..=i],
            bars: Some(&bars[..=i]),
            holding,
        };
        for i in 0..10 {
            assert_eq!(rule.decide(&at(i, false)), Signal::Hold);
        }
        assert_eq!(rule.decide(&at(10, false)), Signal::Buy);
        // ATR over true ranges 0, 0, 10.
        assert_relative_eq!(rule.stop().unwrap(), 90.0 - 20.0 / 3.0);

        assert_eq!(rule.decide(&at(11, true)), Signal::Sell);
        assert!(rule.stop().is_none());
    }

    #[test]
    fn holds_without_full_bars() {
        let mut rule = BollingerReversion::new(small_params());
        let closes = with_tail(&[50.0]);
        let view = BarView {
            timestamp: minute(10),
            price: 50.0,
            closes: &closes,
            bars: None,
            holding: false,
        };
        assert_eq!(rule.decide(&view), Signal::Hold);
    }
}
