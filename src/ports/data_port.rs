//! Market data port trait.

use crate::domain::error::TradebotError;
use crate::domain::ohlcv::Bar;

pub trait DataPort {
    /// Bars for `symbol`, ascending by timestamp with no duplicates. A bar whose close is
    /// missing carries a non-finite close.
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, TradebotError>;

    fn list_symbols(&self) -> Result<Vec<String>, TradebotError>;
}
