//! RSI (Relative Strength Index).
//!
//! Average gain and average loss are simple rolling means of the positive changes and
//! of the magnitude of the negative changes over `period` changes.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! - avg_loss == 0 and avg_gain > 0: RSI = 100
//! - avg_loss == 0 and avg_gain == 0: undefined
//!
//! Warmup: first `period` bars are undefined (a change needs a previous close).

use super::rolling::RollingWindow;

#[derive(Debug, Clone, PartialEq)]
pub struct Rsi {
    prev: Option<f64>,
    gains: RollingWindow,
    losses: RollingWindow,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Rsi {
            prev: None,
            gains: RollingWindow::new(period),
            losses: RollingWindow::new(period),
        }
    }

    pub fn update(&mut self, close: f64) -> Option<f64> {
        if let Some(prev) = self.prev {
            let change = close - prev;
            self.gains.push(change.max(0.0));
            self.losses.push((-change).max(0.0));
        }
        self.prev = Some(close);
        self.value()
    }

    pub fn value(&self) -> Option<f64> {
        let avg_gain = self.gains.mean()?;
        let avg_loss = self.losses.mean()?;
        rsi_from_averages(avg_gain, avg_loss)
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        return if avg_gain > 0.0 { Some(100.0) } else { None };
    }
    Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
}

pub fn rsi(series: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut state = Rsi::new(period);
    series.iter().map(|&x| state.update(x)).collect()
}
