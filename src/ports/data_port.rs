//! Market data port trait.

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::OhlcvBar;

pub trait DataPort {
    /// All bars for `symbol`, sorted by date ascending.
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<OhlcvBar>, SigtraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError>;
}
