//! Volume-weighted cumulative lines.
//!
//! - Accumulation/distribution: cumulative sum of
//!   ((close - low) - (high - close)) / (high - low) * volume.
//!   A bar with no range contributes 0.
//! - Price-volume trend: cumulative sum of pct_change(close) * volume.
//!   The first bar has no change and is undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::{cumulative_sum, pct_change};
use crate::domain::ohlcv::{closes, highs, lows, volumes, OhlcvBar};

pub fn accumulation_distribution(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    volumes: &[f64],
) -> Vec<f64> {
    let flow: Vec<f64> = (0..closes.len())
        .map(|i| {
            let range = highs[i] - lows[i];
            let multiplier = ((closes[i] - lows[i]) - (highs[i] - closes[i])) / range;
            let multiplier = if multiplier.is_finite() { multiplier } else { 0.0 };
            multiplier * volumes[i]
        })
        .collect();
    cumulative_sum(&flow)
}

pub fn price_volume_trend(closes: &[f64], volumes: &[f64]) -> Vec<f64> {
    let flow: Vec<f64> = pct_change(closes)
        .iter()
        .zip(volumes)
        .map(|(change, volume)| change * volume)
        .collect();
    cumulative_sum(&flow)
}

pub fn calculate_accumulation_distribution(bars: &[OhlcvBar]) -> IndicatorSeries {
    IndicatorSeries::from_simple(
        IndicatorType::AccumulationDistribution,
        bars,
        accumulation_distribution(&highs(bars), &lows(bars), &closes(bars), &volumes(bars)),
    )
}

pub fn calculate_price_volume_trend(bars: &[OhlcvBar]) -> IndicatorSeries {
    IndicatorSeries::from_simple(
        IndicatorType::PriceVolumeTrend,
        bars,
        price_volume_trend(&closes(bars), &volumes(bars)),
    )
}
