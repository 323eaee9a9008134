//! Rolling standard deviation.
//!
//! Sample standard deviation (divides by n-1) over n closing prices.
//! Warmup: first (n-1) bars are undefined; a window of one value is undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::rolling_apply;
use crate::domain::ohlcv::{closes, OhlcvBar};

pub fn stddev(values: &[f64], period: usize) -> Vec<f64> {
    rolling_apply(values, period, |window| {
        let n = window.len();
        if n < 2 {
            return f64::NAN;
        }
        let mean = window.iter().sum::<f64>() / n as f64;
        let variance = window
            .iter()
            .map(|v| {
                let diff = v - mean;
                diff * diff
            })
            .sum::<f64>()
            / (n - 1) as f64;
        variance.sqrt()
    })
}

pub fn calculate_stddev(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    IndicatorSeries::from_simple(
        IndicatorType::Stddev(period),
        bars,
        stddev(&closes(bars), period),
    )
}
