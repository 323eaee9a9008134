//! Trend strength (R² of a linear fit of price against bar index) and
//! sideways-market detection.
//!
//! R² is the squared Pearson correlation between the window values and
//! 0..n. A constant window has no linear relationship and scores 0.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::{rolling_apply, rolling_max, rolling_min};
use crate::domain::ohlcv::{closes, OhlcvBar};

pub const DEFAULT_PERIOD: usize = 20;
pub const SIDEWAYS_THRESHOLD: f64 = 0.02;
pub const SIDEWAYS_MAX_TREND_STRENGTH: f64 = 0.3;

fn r_squared(window: &[f64]) -> f64 {
    let n = window.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = window.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (i, &y) in window.iter().enumerate() {
        let dx = i as f64 - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_y == 0.0 || var_x == 0.0 {
        return 0.0;
    }
    let r = cov / (var_x.sqrt() * var_y.sqrt());
    if r.is_nan() { 0.0 } else { r * r }
}

pub fn trend_strength(values: &[f64], period: usize) -> Vec<f64> {
    rolling_apply(values, period, r_squared)
}

/// 1.0 where the window's high-low range relative to close is below
/// `threshold` and the trend strength is below 0.3, 0.0 otherwise;
/// `NaN` until both inputs are defined.
pub fn sideways_market(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
    threshold: f64,
) -> Vec<f64> {
    let range_high = rolling_max(highs, period);
    let range_low = rolling_min(lows, period);
    let strength = trend_strength(closes, period);

    (0..closes.len())
        .map(|i| {
            let price_range = (range_high[i] - range_low[i]) / closes[i];
            if price_range.is_nan() || strength[i].is_nan() {
                f64::NAN
            } else if price_range < threshold && strength[i] < SIDEWAYS_MAX_TREND_STRENGTH {
                1.0
            } else {
                0.0
            }
        })
        .collect()
}

pub fn calculate_trend_strength(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    IndicatorSeries::from_simple(
        IndicatorType::TrendStrength(period),
        bars,
        trend_strength(&closes(bars), period),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfectly_linear_is_one() {
        let values: Vec<f64> = (0..25).map(|i| 10.0 + 3.0 * i as f64).collect();
        let out = trend_strength(&values, 20);
        assert!(out[18].is_nan());
        assert!((out[19] - 1.0).abs() < 1e-12);
        assert!((out[24] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn perfectly_linear_downtrend_is_one() {
        let values: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let out = trend_strength(&values, 20);
        assert!((out[19] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_is_zero() {
        let out = trend_strength(&[7.0; 20], 20);
        assert_eq!(out[19], 0.0);
    }

    #[test]
    fn symmetric_zigzag_has_no_trend() {
        // symmetric V: zero correlation with the index
        let values = [4.0, 3.0, 2.0, 1.0, 0.0, 1.0, 2.0, 3.0, 4.0];
        let out = trend_strength(&values, 9);
        assert!(out[8].abs() < 1e-12);
    }

    #[test]
    fn bounded_between_zero_and_one() {
        let values: Vec<f64> = (0..80).map(|i| 50.0 + (i as f64 * 0.37).sin() * 4.0).collect();
        for v in trend_strength(&values, 20).into_iter().filter(|v| !v.is_nan()) {
            assert!((0.0..=1.0 + 1e-12).contains(&v));
        }
    }

    #[test]
    fn sideways_detects_tight_flat_range() {
        let closes = vec![100.0; 25];
        let highs = vec![100.5; 25];
        let lows = vec![99.5; 25];
        let out = sideways_market(&highs, &lows, &closes, 20, SIDEWAYS_THRESHOLD);
        assert!(out[18].is_nan());
        assert_eq!(out[19], 1.0);
    }

    #[test]
    fn sideways_rejects_wide_range() {
        let closes = vec![100.0; 25];
        let highs = vec![105.0; 25];
        let lows = vec![95.0; 25];
        let out = sideways_market(&highs, &lows, &closes, 20, SIDEWAYS_THRESHOLD);
        assert_eq!(out[24], 0.0);
    }
}
