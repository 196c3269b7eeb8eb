//! Trading rules: one state machine per strategy kind.
//!
//! Each rule owns its parameters, its streaming indicator state and its small auxiliary
//! state (high-water mark, trailing stop). Rules are fed the full look-ahead-free history
//! on every bar and ingest only the part they have not seen yet.

pub mod bollinger;
pub mod donchian;
pub mod macd_rsi;
pub mod sma_cross;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::TradebotError;
use crate::domain::ohlcv::Bar;

pub use bollinger::{BollingerParams, BollingerReversion};
pub use donchian::{DonchianBreakout, DonchianParams};
pub use macd_rsi::{MacdRsi, MacdRsiParams};
pub use sma_cross::{SmaCross, SmaCrossParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Signal {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
    #[serde(rename = "NONE")]
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "NONE"),
        }
    }
}

/// What a rule sees on one bar.
///
/// `closes` and `bars` run up to and including the current bar. `bars` is `None` when
/// only closing prices are available; rules that need highs and lows then hold.
#[derive(Debug, Clone, Copy)]
pub struct BarView<'a> {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub closes: &'a [f64],
    pub bars: Option<&'a [Bar]>,
    pub holding: bool,
}

/// Values in `history` after the first `seen` ones.
pub(crate) fn unseen<T>(history: &[T], seen: usize) -> &[T] {
    history.get(seen..).unwrap_or(&[])
}

/// Sign flip from negative to positive between two consecutive readings.
pub(crate) fn crossed_up(prev: f64, now: f64) -> bool {
    prev < 0.0 && now > 0.0
}

/// Sign flip from positive to negative between two consecutive readings.
pub(crate) fn crossed_down(prev: f64, now: f64) -> bool {
    prev > 0.0 && now < 0.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    MacdRsi,
    SmaCross,
    Donchian,
    Bollinger,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::MacdRsi,
        StrategyKind::SmaCross,
        StrategyKind::Donchian,
        StrategyKind::Bollinger,
    ];

    /// Name used in configuration files.
    pub fn config_name(&self) -> &'static str {
        match self {
            StrategyKind::MacdRsi => "macd_rsi",
            StrategyKind::SmaCross => "sma_cross",
            StrategyKind::Donchian => "donchian",
            StrategyKind::Bollinger => "bollinger",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StrategyKind::MacdRsi => "MACD+RSI",
            StrategyKind::SmaCross => "SMA Cross",
            StrategyKind::Donchian => "Donchian",
            StrategyKind::Bollinger => "Bollinger MR",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for StrategyKind {
    type Err = TradebotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.config_name() == name)
            .ok_or(TradebotError::UnknownStrategy { name })
    }
}

/// Parse a comma separated list of strategy names.
pub fn parse_kinds(list: &str) -> Result<Vec<StrategyKind>, TradebotError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(StrategyKind::from_str)
        .collect()
}

/// Parameters of one strategy instance, fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StrategyParams {
    MacdRsi(MacdRsiParams),
    SmaCross(SmaCrossParams),
    Donchian(DonchianParams),
    Bollinger(BollingerParams),
}

impl StrategyParams {
    pub fn kind(&self) -> StrategyKind {
        match self {
            StrategyParams::MacdRsi(_) => StrategyKind::MacdRsi,
            StrategyParams::SmaCross(_) => StrategyKind::SmaCross,
            StrategyParams::Donchian(_) => StrategyKind::Donchian,
            StrategyParams::Bollinger(_) => StrategyKind::Bollinger,
        }
    }

    pub fn default_for(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::MacdRsi => StrategyParams::MacdRsi(MacdRsiParams::default()),
            StrategyKind::SmaCross => StrategyParams::SmaCross(SmaCrossParams::default()),
            StrategyKind::Donchian => StrategyParams::Donchian(DonchianParams::default()),
            StrategyKind::Bollinger => StrategyParams::Bollinger(BollingerParams::default()),
        }
    }

    /// The declared search grid for `kind`, in enumeration order.
    pub fn grid(kind: StrategyKind) -> Vec<StrategyParams> {
        match kind {
            StrategyKind::MacdRsi => MacdRsiParams::grid()
                .into_iter()
                .map(StrategyParams::MacdRsi)
                .collect(),
            StrategyKind::SmaCross => SmaCrossParams::grid()
                .into_iter()
                .map(StrategyParams::SmaCross)
                .collect(),
            StrategyKind::Donchian => DonchianParams::grid()
                .into_iter()
                .map(StrategyParams::Donchian)
                .collect(),
            StrategyKind::Bollinger => BollingerParams::grid()
                .into_iter()
                .map(StrategyParams::Bollinger)
                .collect(),
        }
    }
}

/// A rule with its runtime state. The variant set is closed.
#[derive(Debug, Clone)]
pub enum StrategyRule {
    MacdRsi(MacdRsi),
    SmaCross(SmaCross),
    Donchian(DonchianBreakout),
    Bollinger(BollingerReversion),
}

impl StrategyRule {
    pub fn new(params: &StrategyParams) -> Self {
        match params {
            StrategyParams::MacdRsi(p) => StrategyRule::MacdRsi(MacdRsi::new(p.clone())),
            StrategyParams::SmaCross(p) => StrategyRule::SmaCross(SmaCross::new(p.clone())),
            StrategyParams::Donchian(p) => StrategyRule::Donchian(DonchianBreakout::new(p.clone())),
            StrategyParams::Bollinger(p) => {
                StrategyRule::Bollinger(BollingerReversion::new(p.clone()))
            }
        }
    }

    pub fn decide(&mut self, view: &BarView<'_>) -> Signal {
        match self {
            StrategyRule::MacdRsi(r) => r.decide(view),
            StrategyRule::SmaCross(r) => r.decide(view),
            StrategyRule::Donchian(r) => r.decide(view),
            StrategyRule::Bollinger(r) => r.decide(view),
        }
    }

    pub fn reset(&mut self) {
        match self {
            StrategyRule::MacdRsi(r) => r.reset(),
            StrategyRule::SmaCross(r) => r.reset(),
            StrategyRule::Donchian(r) => r.reset(),
            StrategyRule::Bollinger(r) => r.reset(),
        }
    }
}
