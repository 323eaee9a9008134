//! Weighted Moving Average indicator.
//!
//! WMA(n) = (1*P[i-n+1] + 2*P[i-n+2] + ... + n*P[i]) / (n*(n+1)/2)
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::rolling_apply;
use crate::domain::ohlcv::{closes, OhlcvBar};

pub fn wma(values: &[f64], period: usize) -> Vec<f64> {
    let divisor = (period * (period + 1)) as f64 / 2.0;
    rolling_apply(values, period, |window| {
        window
            .iter()
            .enumerate()
            .map(|(j, v)| (j + 1) as f64 * v)
            .sum::<f64>()
            / divisor
    })
}

pub fn calculate_wma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    IndicatorSeries::from_simple(IndicatorType::Wma(period), bars, wma(&closes(bars), period))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wma_weights_recent_values_more() {
        let out = wma(&[10.0, 20.0, 30.0], 3);
        // (1*10 + 2*20 + 3*30) / 6
        let expected = 140.0 / 6.0;
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert!((out[2] - expected).abs() < 1e-12);
    }

    #[test]
    fn wma_sliding() {
        let out = wma(&[10.0, 20.0, 30.0, 40.0], 2);
        assert!((out[1] - 50.0 / 3.0).abs() < 1e-12);
        assert!((out[2] - 80.0 / 3.0).abs() < 1e-12);
        assert!((out[3] - 110.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn wma_equal_prices() {
        let out = wma(&[100.0; 5], 3);
        for v in &out[2..] {
            assert!((v - 100.0).abs() < 1e-12);
        }
    }
}
