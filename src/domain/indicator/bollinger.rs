//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//! - Bandwidth: (Upper - Lower) / Middle × 100
//!
//! Where StdDev is the sample standard deviation (divides by N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars are undefined.

use crate::domain::indicator::sma::sma;
use crate::domain::indicator::stddev::stddev;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::{closes, OhlcvBar};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULT_X100: u32 = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
    pub bandwidth: Vec<f64>,
}

pub fn bollinger(values: &[f64], period: usize, mult: f64) -> BollingerBands {
    let middle = sma(values, period);
    let std = stddev(values, period);

    let upper: Vec<f64> = middle.iter().zip(&std).map(|(m, s)| m + mult * s).collect();
    let lower: Vec<f64> = middle.iter().zip(&std).map(|(m, s)| m - mult * s).collect();
    let bandwidth = (0..values.len())
        .map(|i| (upper[i] - lower[i]) / middle[i] * 100.0)
        .collect();

    BollingerBands {
        upper,
        middle,
        lower,
        bandwidth,
    }
}

pub fn calculate_bollinger(
    bars: &[OhlcvBar],
    period: usize,
    stddev_mult_x100: u32,
) -> IndicatorSeries {
    let mult = stddev_mult_x100 as f64 / 100.0;
    let bands = bollinger(&closes(bars), period, mult);
    let values = (0..bars.len()).map(|i| IndicatorValue::Bollinger {
        upper: bands.upper[i],
        middle: bands.middle[i],
        lower: bands.lower[i],
        bandwidth: bands.bandwidth[i],
    });
    IndicatorSeries::from_values(
        IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        },
        bars,
        values,
    )
}
