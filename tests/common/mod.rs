#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
pub use tradebot::domain::ohlcv::Bar;
use tradebot::domain::error::TradebotError;
use tradebot::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, TradebotError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TradebotError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => Ok(bars.clone()),
            _ => Err(TradebotError::NoData {
                symbol: symbol.to_string(),
            }),
        }
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradebotError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn minute(i: usize) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(i as i64)
}

/// One-minute bars whose open, high and low all equal the close.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i, c))
        .collect()
}

pub fn make_bar(i: usize, close: f64) -> Bar {
    Bar {
        timestamp: minute(i),
        open: close,
        high: close,
        low: close,
        close,
        volume: 1.0,
    }
}

pub fn constant_bars(n: usize, price: f64) -> Vec<Bar> {
    bars_from_closes(&vec![price; n])
}

/// A sine wave around 100 with a 1% per-bar band between high and low.
pub fn sine_bars(n: usize, period: f64, amplitude: f64) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let close = 100.0 + amplitude * (i as f64 * std::f64::consts::TAU / period).sin();
            Bar {
                timestamp: minute(i),
                open: close,
                high: close * 1.005,
                low: close * 0.995,
                close,
                volume: 1.0,
            }
        })
        .collect()
}

/// A sine wave riding a steady uptrend.
pub fn trending_bars(n: usize, slope: f64) -> Vec<Bar> {
    sine_bars(n, 60.0, 4.0)
        .into_iter()
        .enumerate()
        .map(|(i, mut bar)| {
            let lift = slope * i as f64;
            bar.open += lift;
            bar.high += lift;
            bar.low += lift;
            bar.close += lift;
            bar
        })
        .collect()
}
