//! Average True Range.
//!
//! True range needs the previous close, so the first bar contributes nothing.
//! ATR is the simple (not Wilder-smoothed) mean of the last `n` true ranges and is
//! undefined for the first `n` bars.

use super::rolling::RollingWindow;
use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone, PartialEq)]
pub struct Atr {
    prev_close: Option<f64>,
    ranges: RollingWindow,
}

impl Atr {
    pub fn new(n: usize) -> Self {
        Atr {
            prev_close: None,
            ranges: RollingWindow::new(n),
        }
    }

    pub fn update(&mut self, bar: &Bar) -> Option<f64> {
        if let Some(prev_close) = self.prev_close {
            self.ranges.push(bar.true_range(prev_close));
        }
        self.prev_close = Some(bar.close);
        self.value()
    }

    pub fn value(&self) -> Option<f64> {
        self.ranges.mean()
    }
}

pub fn atr(bars: &[Bar], n: usize) -> Vec<Option<f64>> {
    let mut state = Atr::new(n);
    bars.iter().map(|b| state.update(b)).collect()
}
