//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{run_backtest, StrategySpec};
use crate::domain::config_validation::{
    validate_backtest_config, validate_optimizer_config, validate_strategy_params,
};
use crate::domain::error::TradebotError;
use crate::domain::ledger::{LedgerConfig, DEFAULT_FEE, DEFAULT_START_CASH};
use crate::domain::metrics::Metrics;
use crate::domain::optimizer::{
    optimize_all, GridSearchOutcome, ScoreConfig, DEFAULT_MAX_DD_CAP, DEFAULT_MIN_TRADES,
};
use crate::domain::strategy::{
    parse_kinds, BollingerParams, DonchianParams, MacdRsiParams, SmaCrossParams, StrategyKind,
    StrategyParams,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

/// Kinds optimized when `[optimizer] strategies` is not set.
pub const DEFAULT_OPTIMIZER_KINDS: [StrategyKind; 3] = [
    StrategyKind::MacdRsi,
    StrategyKind::SmaCross,
    StrategyKind::Donchian,
];

#[derive(Parser, Debug)]
#[command(name = "tradebot", about = "Bar-based strategy backtester and optimizer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest the configured strategies and print their metrics as JSON lines
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Grid search each configured strategy, then backtest the winners together
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let mut stdout = std::io::stdout().lock();
    let result = match cli.command {
        Command::Backtest {
            config,
            data_dir,
            symbol,
        } => run_backtest_command(&config, data_dir, symbol, &mut stdout),
        Command::Optimize {
            config,
            data_dir,
            symbol,
        } => run_optimize_command(&config, data_dir, symbol, &mut stdout),
        Command::Validate { config } => run_validate(&config),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TradebotError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

pub fn build_ledger_config(config: &dyn ConfigPort) -> LedgerConfig {
    LedgerConfig {
        fee: config.get_double("backtest", "fee", DEFAULT_FEE),
        start_cash: config.get_double("backtest", "start_cash", DEFAULT_START_CASH),
    }
}

pub fn build_score_config(config: &dyn ConfigPort) -> ScoreConfig {
    let min_trades = config.get_int("optimizer", "min_trades", DEFAULT_MIN_TRADES as i64);
    ScoreConfig {
        min_trades: usize::try_from(min_trades).unwrap_or(0),
        max_dd_cap: config.get_double("optimizer", "max_dd_cap", DEFAULT_MAX_DD_CAP),
        parallel: config.get_bool("optimizer", "parallel", true),
    }
}

/// Strategy kinds listed under `[section] strategies`, or `default` when unset.
pub fn resolve_kinds(
    config: &dyn ConfigPort,
    section: &str,
    default: &[StrategyKind],
) -> Result<Vec<StrategyKind>, TradebotError> {
    match config.get_string(section, "strategies") {
        Some(list) => parse_kinds(&list),
        None => Ok(default.to_vec()),
    }
}

fn read_period(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, TradebotError> {
    let value = config.get_int(section, key, default as i64);
    usize::try_from(value).map_err(|_| TradebotError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: format!("{} must be a non-negative integer", key),
    })
}

/// Default parameters of `kind`, overridden by the keys of its own config section.
pub fn build_params(
    kind: StrategyKind,
    config: &dyn ConfigPort,
) -> Result<StrategyParams, TradebotError> {
    let s = kind.config_name();
    let params = match kind {
        StrategyKind::MacdRsi => {
            let d = MacdRsiParams::default();
            StrategyParams::MacdRsi(MacdRsiParams {
                macd_fast: read_period(config, s, "macd_fast", d.macd_fast)?,
                macd_slow: read_period(config, s, "macd_slow", d.macd_slow)?,
                macd_signal: read_period(config, s, "macd_signal", d.macd_signal)?,
                rsi_period: read_period(config, s, "rsi_period", d.rsi_period)?,
                rsi_buy: config.get_double(s, "rsi_buy", d.rsi_buy),
                rsi_sell: config.get_double(s, "rsi_sell", d.rsi_sell),
                trail_pct: config.get_double(s, "trail_pct", d.trail_pct),
            })
        }
        StrategyKind::SmaCross => {
            let d = SmaCrossParams::default();
            StrategyParams::SmaCross(SmaCrossParams {
                fast: read_period(config, s, "fast", d.fast)?,
                slow: read_period(config, s, "slow", d.slow)?,
                rsi_period: read_period(config, s, "rsi_period", d.rsi_period)?,
                rsi_filter: config.get_double(s, "rsi_filter", d.rsi_filter),
                trail_pct: config.get_double(s, "trail_pct", d.trail_pct),
            })
        }
        StrategyKind::Donchian => {
            let d = DonchianParams::default();
            StrategyParams::Donchian(DonchianParams {
                ch: read_period(config, s, "ch", d.ch)?,
                exit_ch: read_period(config, s, "exit_ch", d.exit_ch)?,
                atr_n: read_period(config, s, "atr_n", d.atr_n)?,
                atr_mult: config.get_double(s, "atr_mult", d.atr_mult),
            })
        }
        StrategyKind::Bollinger => {
            let d = BollingerParams::default();
            StrategyParams::Bollinger(BollingerParams {
                bb_period: read_period(config, s, "bb_period", d.bb_period)?,
                bb_dev: config.get_double(s, "bb_dev", d.bb_dev),
                rsi_period: read_period(config, s, "rsi_period", d.rsi_period)?,
                rsi_buy: config.get_double(s, "rsi_buy", d.rsi_buy),
                rsi_exit: config.get_double(s, "rsi_exit", d.rsi_exit),
                atr_n: read_period(config, s, "atr_n", d.atr_n)?,
                atr_mult: config.get_double(s, "atr_mult", d.atr_mult),
            })
        }
    };
    validate_strategy_params(&params)?;
    Ok(params)
}

/// One spec per kind listed under `[backtest] strategies` (all four by default).
pub fn build_specs(config: &dyn ConfigPort) -> Result<Vec<StrategySpec>, TradebotError> {
    let ledger = build_ledger_config(config);
    resolve_kinds(config, "backtest", &StrategyKind::ALL)?
        .into_iter()
        .map(|kind| Ok(StrategySpec::new(build_params(kind, config)?, ledger)))
        .collect()
}

/// Data directory and symbol: command-line overrides first, then `[data]`.
pub fn resolve_data_source(
    config: &dyn ConfigPort,
    dir_override: Option<PathBuf>,
    symbol_override: Option<String>,
) -> Result<(PathBuf, String), TradebotError> {
    let missing = |key: &str| TradebotError::ConfigMissing {
        section: "data".to_string(),
        key: key.to_string(),
    };
    let dir = dir_override
        .or_else(|| config.get_string("data", "dir").map(PathBuf::from))
        .ok_or_else(|| missing("dir"))?;
    let symbol = symbol_override
        .or_else(|| config.get_string("data", "symbol"))
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| missing("symbol"))?;
    Ok((dir, symbol))
}

/// One line of backtest output.
#[derive(Debug, Serialize)]
pub struct InstanceReport<'a> {
    pub params: &'a StrategyParams,
    pub metrics: Option<Metrics>,
}

fn write_json<T: Serialize>(out: &mut dyn Write, value: &T) -> Result<(), TradebotError> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Backtest `specs` over `symbol`'s bars and write one JSON report per instance.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    symbol: &str,
    specs: &[StrategySpec],
    out: &mut dyn Write,
) -> Result<Vec<Metrics>, TradebotError> {
    let bars = data_port.fetch_bars(symbol)?;
    info!(symbol, bars = bars.len(), strategies = specs.len(), "running backtest");

    let instances = run_backtest(&bars, specs);
    let mut all = Vec::with_capacity(instances.len());
    for instance in &instances {
        let metrics = instance.metrics();
        write_json(
            out,
            &InstanceReport {
                params: instance.params(),
                metrics: metrics.clone(),
            },
        )?;
        all.extend(metrics);
    }
    Ok(all)
}

/// Grid search every kind, write each outcome, then backtest the winners side by side.
pub fn run_optimize_pipeline(
    data_port: &dyn DataPort,
    symbol: &str,
    kinds: &[StrategyKind],
    ledger: LedgerConfig,
    score_config: &ScoreConfig,
    out: &mut dyn Write,
) -> Result<Vec<GridSearchOutcome>, TradebotError> {
    let bars = data_port.fetch_bars(symbol)?;
    info!(symbol, bars = bars.len(), strategies = kinds.len(), "optimizing");

    let outcomes = optimize_all(&bars, kinds, ledger, score_config)?;
    for outcome in &outcomes {
        write_json(out, outcome)?;
    }

    let winners: Vec<StrategySpec> = outcomes.iter().map(|o| o.spec(ledger)).collect();
    for instance in run_backtest(&bars, &winners) {
        write_json(
            out,
            &InstanceReport {
                params: instance.params(),
                metrics: instance.metrics(),
            },
        )?;
    }
    Ok(outcomes)
}

/// Every check the other commands would perform before touching data.
pub fn validate_all(config: &dyn ConfigPort) -> Result<(), TradebotError> {
    validate_backtest_config(config)?;
    validate_optimizer_config(config)?;
    for kind in StrategyKind::ALL {
        build_params(kind, config)?;
    }
    Ok(())
}

fn run_backtest_command(
    config_path: &Path,
    data_dir: Option<PathBuf>,
    symbol: Option<String>,
    out: &mut dyn Write,
) -> Result<(), TradebotError> {
    let config = load_config(config_path)?;
    validate_backtest_config(&config)?;
    let specs = build_specs(&config)?;
    let (dir, symbol) = resolve_data_source(&config, data_dir, symbol)?;
    run_backtest_pipeline(&CsvAdapter::new(dir), &symbol, &specs, out)?;
    Ok(())
}

fn run_optimize_command(
    config_path: &Path,
    data_dir: Option<PathBuf>,
    symbol: Option<String>,
    out: &mut dyn Write,
) -> Result<(), TradebotError> {
    let config = load_config(config_path)?;
    validate_backtest_config(&config)?;
    validate_optimizer_config(&config)?;
    let kinds = resolve_kinds(&config, "optimizer", &DEFAULT_OPTIMIZER_KINDS)?;
    let (dir, symbol) = resolve_data_source(&config, data_dir, symbol)?;
    run_optimize_pipeline(
        &CsvAdapter::new(dir),
        &symbol,
        &kinds,
        build_ledger_config(&config),
        &build_score_config(&config),
        out,
    )?;
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), TradebotError> {
    let config = load_config(config_path)?;
    validate_all(&config)?;
    eprintln!("Config validated successfully");
    Ok(())
}
