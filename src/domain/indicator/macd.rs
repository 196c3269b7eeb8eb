//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! All three EMAs are unseeded, so every point is defined from the first bar on.

use super::ema::Ema;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    pub(crate) line: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    fast: Ema,
    slow: Ema,
    signal: Ema,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Macd {
            fast: Ema::new(fast),
            slow: Ema::new(slow),
            signal: Ema::new(signal),
        }
    }

    pub fn update(&mut self, x: f64) -> MacdPoint {
        let line = self.fast.update(x) - self.slow.update(x);
        let signal = self.signal.update(line);
        MacdPoint {
            line,
            signal,
            histogram: line - signal,
        }
    }
}

pub fn macd(series: &[f64], fast: usize, slow: usize, signal: usize) -> Vec<MacdPoint> {
    let mut state = Macd::new(fast, slow, signal);
    series.iter().map(|&x| state.update(x)).collect()
}
