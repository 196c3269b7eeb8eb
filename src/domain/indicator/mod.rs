//! Technical indicator implementations.
//!
//! Every indicator exists in two shapes:
//! - a streaming accumulator (`Ema`, `Macd`, `Rsi`, `Atr`, `RollingWindow`, `RollingExtreme`)
//!   that is fed one value per bar and keeps only the state its window needs;
//! - a batch function (`ema`, `macd`, `sma`, `rsi`, `atr`, `rolling_max`, `rolling_min`) that
//!   drives the accumulator over a whole series.
//!
//! Because the batch functions are built on the accumulators, both shapes produce identical
//! values. Warm-up positions are `None`.

pub mod atr;
pub mod ema;
pub mod macd;
pub mod rolling;
pub mod rsi;

pub use atr::{atr, Atr};
pub use ema::{ema, Ema};
pub use macd::{macd, Macd, MacdPoint};
pub use rolling::{rolling_max, rolling_min, sma, Extreme, RollingExtreme, RollingWindow};
pub use rsi::{rsi, Rsi};
