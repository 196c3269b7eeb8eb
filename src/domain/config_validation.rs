//! Configuration validation.
//!
//! Validates the `[backtest]` and `[optimizer]` sections and the parameters of every
//! strategy before anything runs.

use crate::domain::error::TradebotError;
use crate::domain::ledger::{DEFAULT_FEE, DEFAULT_START_CASH};
use crate::domain::optimizer::{DEFAULT_MAX_DD_CAP, DEFAULT_MIN_TRADES};
use crate::domain::strategy::{
    parse_kinds, BollingerParams, DonchianParams, MacdRsiParams, SmaCrossParams, StrategyParams,
};
use crate::ports::config_port::ConfigPort;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TradebotError> {
    validate_start_cash(config)?;
    validate_fee(config)?;
    validate_strategy_list(config, "backtest")?;
    Ok(())
}

pub fn validate_optimizer_config(config: &dyn ConfigPort) -> Result<(), TradebotError> {
    validate_min_trades(config)?;
    validate_max_dd_cap(config)?;
    validate_strategy_list(config, "optimizer")?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> TradebotError {
    TradebotError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_start_cash(config: &dyn ConfigPort) -> Result<(), TradebotError> {
    let value = config.get_double("backtest", "start_cash", DEFAULT_START_CASH);
    if value <= 0.0 || !value.is_finite() {
        return Err(invalid("backtest", "start_cash", "start_cash must be positive"));
    }
    Ok(())
}

fn validate_fee(config: &dyn ConfigPort) -> Result<(), TradebotError> {
    let value = config.get_double("backtest", "fee", DEFAULT_FEE);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid("backtest", "fee", "fee must be in [0, 1)"));
    }
    Ok(())
}

fn validate_min_trades(config: &dyn ConfigPort) -> Result<(), TradebotError> {
    let value = config.get_int("optimizer", "min_trades", DEFAULT_MIN_TRADES as i64);
    if value < 0 {
        return Err(invalid(
            "optimizer",
            "min_trades",
            "min_trades must be non-negative",
        ));
    }
    Ok(())
}

fn validate_max_dd_cap(config: &dyn ConfigPort) -> Result<(), TradebotError> {
    let value = config.get_double("optimizer", "max_dd_cap", DEFAULT_MAX_DD_CAP);
    if value <= 0.0 || value > 1.0 || value.is_nan() {
        return Err(invalid(
            "optimizer",
            "max_dd_cap",
            "max_dd_cap must be in (0, 1]",
        ));
    }
    Ok(())
}

fn validate_strategy_list(config: &dyn ConfigPort, section: &str) -> Result<(), TradebotError> {
    let Some(list) = config.get_string(section, "strategies") else {
        return Ok(());
    };
    let kinds = parse_kinds(&list)?;
    if kinds.is_empty() {
        return Err(invalid(section, "strategies", "at least one strategy is required"));
    }
    Ok(())
}

/// Check the cross-parameter constraints of one strategy's parameters.
pub fn validate_strategy_params(params: &StrategyParams) -> Result<(), TradebotError> {
    let section = params.kind().config_name();
    match params {
        StrategyParams::MacdRsi(p) => validate_macd_rsi(section, p),
        StrategyParams::SmaCross(p) => validate_sma_cross(section, p),
        StrategyParams::Donchian(p) => validate_donchian(section, p),
        StrategyParams::Bollinger(p) => validate_bollinger(section, p),
    }
}

fn positive_period(section: &str, key: &str, value: usize) -> Result<(), TradebotError> {
    if value == 0 {
        return Err(invalid(section, key, &format!("{} must be at least 1", key)));
    }
    Ok(())
}

fn non_negative(section: &str, key: &str, value: f64) -> Result<(), TradebotError> {
    if value < 0.0 || value.is_nan() {
        return Err(invalid(section, key, &format!("{} must be non-negative", key)));
    }
    Ok(())
}

fn validate_macd_rsi(section: &str, p: &MacdRsiParams) -> Result<(), TradebotError> {
    positive_period(section, "macd_fast", p.macd_fast)?;
    positive_period(section, "macd_slow", p.macd_slow)?;
    positive_period(section, "macd_signal", p.macd_signal)?;
    positive_period(section, "rsi_period", p.rsi_period)?;
    if p.macd_fast >= p.macd_slow {
        return Err(invalid(
            section,
            "macd_fast",
            "macd_fast must be less than macd_slow",
        ));
    }
    if p.rsi_buy >= p.rsi_sell {
        return Err(invalid(section, "rsi_buy", "rsi_buy must be less than rsi_sell"));
    }
    non_negative(section, "trail_pct", p.trail_pct)
}

fn validate_sma_cross(section: &str, p: &SmaCrossParams) -> Result<(), TradebotError> {
    positive_period(section, "fast", p.fast)?;
    positive_period(section, "slow", p.slow)?;
    positive_period(section, "rsi_period", p.rsi_period)?;
    if p.fast >= p.slow {
        return Err(invalid(section, "fast", "fast must be less than slow"));
    }
    non_negative(section, "trail_pct", p.trail_pct)
}

fn validate_donchian(section: &str, p: &DonchianParams) -> Result<(), TradebotError> {
    positive_period(section, "ch", p.ch)?;
    positive_period(section, "exit_ch", p.exit_ch)?;
    positive_period(section, "atr_n", p.atr_n)?;
    non_negative(section, "atr_mult", p.atr_mult)
}

fn validate_bollinger(section: &str, p: &BollingerParams) -> Result<(), TradebotError> {
    positive_period(section, "bb_period", p.bb_period)?;
    positive_period(section, "rsi_period", p.rsi_period)?;
    positive_period(section, "atr_n", p.atr_n)?;
    non_negative(section, "bb_dev", p.bb_dev)?;
    non_negative(section, "atr_mult", p.atr_mult)
}
