//! Stochastic oscillator.
//!
//! %K = 100 * (close - lowest low) / (highest high - lowest low) over k bars
//! %D = SMA(%K, d)
//!
//! A window with no range (highest == lowest) leaves %K undefined.

use crate::domain::indicator::sma::sma;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::indicator_helpers::{rolling_max, rolling_min};
use crate::domain::ohlcv::{closes, highs, lows, OhlcvBar};

pub const DEFAULT_K_PERIOD: usize = 14;
pub const DEFAULT_D_PERIOD: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticLines {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

pub fn stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    k_period: usize,
    d_period: usize,
) -> StochasticLines {
    let highest = rolling_max(highs, k_period);
    let lowest = rolling_min(lows, k_period);

    let k: Vec<f64> = (0..closes.len())
        .map(|i| {
            let range = highest[i] - lowest[i];
            if range == 0.0 {
                f64::NAN
            } else {
                100.0 * (closes[i] - lowest[i]) / range
            }
        })
        .collect();
    let d = sma(&k, d_period);

    StochasticLines { k, d }
}

pub fn calculate_stochastic(bars: &[OhlcvBar], k_period: usize, d_period: usize) -> IndicatorSeries {
    let lines = stochastic(&highs(bars), &lows(bars), &closes(bars), k_period, d_period);
    let values = (0..bars.len()).map(|i| IndicatorValue::Stochastic {
        k: lines.k[i],
        d: lines.d[i],
    });
    IndicatorSeries::from_values(IndicatorType::Stochastic { k_period, d_period }, bars, values)
}
