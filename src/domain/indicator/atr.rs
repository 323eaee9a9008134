//! Average True Range indicator.
//!
//! ATR(n)[i] = mean(TR[i-n+1..=i]) where TR = max(H-L, |H-prevC|, |L-prevC|).
//! The first bar's true range is H-L. Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::{rolling_mean, true_range};
use crate::domain::ohlcv::{closes, highs, lows, OhlcvBar};

pub const DEFAULT_PERIOD: usize = 14;

pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<f64> {
    rolling_mean(&true_range(highs, lows, closes), period)
}

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    IndicatorSeries::from_simple(
        IndicatorType::Atr(period),
        bars,
        atr(&highs(bars), &lows(bars), &closes(bars), period),
    )
}
