//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod strategy;
pub mod ledger;
pub mod instance;
pub mod metrics;
pub mod backtest;
pub mod optimizer;
pub mod config_validation;
pub mod error;
