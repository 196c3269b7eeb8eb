//! Rolling-window accumulators: simple moving average, population standard
//! deviation, and rolling max/min.
//!
//! `RollingWindow` sums its window on demand instead of carrying a running sum, so the
//! same window always yields the same mean regardless of how many values passed through
//! it. Cost is O(period) per bar.
//!
//! `RollingExtreme` keeps a monotonic deque of candidate indices, amortised O(1) per bar.

use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub struct RollingWindow {
    period: usize,
    values: VecDeque<f64>,
}

impl RollingWindow {
    pub fn new(period: usize) -> Self {
        RollingWindow {
            period,
            values: VecDeque::with_capacity(period),
        }
    }

    pub fn push(&mut self, x: f64) {
        if self.period == 0 {
            return;
        }
        if self.values.len() == self.period {
            self.values.pop_front();
        }
        self.values.push_back(x);
    }

    pub fn is_full(&self) -> bool {
        self.period > 0 && self.values.len() == self.period
    }

    pub fn mean(&self) -> Option<f64> {
        if !self.is_full() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.period as f64)
    }

    /// Population standard deviation (divides by N, not N-1).
    pub fn population_std(&self) -> Option<f64> {
        let mean = self.mean()?;
        let variance = self
            .values
            .iter()
            .map(|v| {
                let diff = v - mean;
                diff * diff
            })
            .sum::<f64>()
            / self.period as f64;
        Some(variance.sqrt())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Max,
    Min,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RollingExtreme {
    period: usize,
    kind: Extreme,
    seen: usize,
    candidates: VecDeque<(usize, f64)>,
}

impl RollingExtreme {
    pub fn new(period: usize, kind: Extreme) -> Self {
        RollingExtreme {
            period,
            kind,
            seen: 0,
            candidates: VecDeque::new(),
        }
    }

    pub fn max(period: usize) -> Self {
        Self::new(period, Extreme::Max)
    }

    pub fn min(period: usize) -> Self {
        Self::new(period, Extreme::Min)
    }

    /// Push the next value and return the extreme of the last `period` values, or `None`
    /// until the window is full.
    pub fn update(&mut self, x: f64) -> Option<f64> {
        if self.period == 0 {
            return None;
        }
        let idx = self.seen;
        self.seen += 1;

        while let Some(&(_, back)) = self.candidates.back() {
            let dominated = match self.kind {
                Extreme::Max => back <= x,
                Extreme::Min => back >= x,
            };
            if !dominated {
                break;
            }
            self.candidates.pop_back();
        }
        self.candidates.push_back((idx, x));

        while let Some(&(front_idx, _)) = self.candidates.front() {
            if front_idx + self.period > idx {
                break;
            }
            self.candidates.pop_front();
        }

        self.value()
    }

    pub fn value(&self) -> Option<f64> {
        if self.seen < self.period || self.period == 0 {
            return None;
        }
        self.candidates.front().map(|&(_, v)| v)
    }
}

/// Simple moving average; `None` for the first `n-1` positions.
pub fn sma(series: &[f64], n: usize) -> Vec<Option<f64>> {
    let mut window = RollingWindow::new(n);
    series
        .iter()
        .map(|&x| {
            window.push(x);
            window.mean()
        })
        .collect()
}

pub fn rolling_max(series: &[f64], n: usize) -> Vec<Option<f64>> {
    let mut state = RollingExtreme::max(n);
    series.iter().map(|&x| state.update(x)).collect()
}

pub fn rolling_min(series: &[f64], n: usize) -> Vec<Option<f64>> {
    let mut state = RollingExtreme::min(n);
    series.iter().map(|&x| state.update(x)).collect()
}
