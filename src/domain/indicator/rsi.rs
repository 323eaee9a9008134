//! RSI (Relative Strength Index) indicator.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100, unless avg_gain is 0 too: a flat window
//! has no RSI and yields NaN.
//!
//! Warmup: first n bars are undefined (need n price changes to compute initial average).

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::{closes, OhlcvBar};

pub const DEFAULT_PERIOD: usize = 14;

fn gain(change: f64) -> f64 {
    if change.is_nan() {
        f64::NAN
    } else {
        change.max(0.0)
    }
}

fn loss(change: f64) -> f64 {
    if change.is_nan() {
        f64::NAN
    } else {
        (-change).max(0.0)
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain.is_nan() || avg_loss.is_nan() || (avg_gain == 0.0 && avg_loss == 0.0) {
        f64::NAN
    } else if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

pub fn rsi(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() <= period {
        return out;
    }

    let changes: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let n = period as f64;

    let mut avg_gain = changes[..period].iter().map(|&c| gain(c)).sum::<f64>() / n;
    let mut avg_loss = changes[..period].iter().map(|&c| loss(c)).sum::<f64>() / n;
    out[period] = rsi_from_averages(avg_gain, avg_loss);

    for (j, &change) in changes.iter().enumerate().skip(period) {
        avg_gain = (avg_gain * (n - 1.0) + gain(change)) / n;
        avg_loss = (avg_loss * (n - 1.0) + loss(change)) / n;
        out[j + 1] = rsi_from_averages(avg_gain, avg_loss);
    }
    out
}

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    IndicatorSeries::from_simple(IndicatorType::Rsi(period), bars, rsi(&closes(bars), period))
}
