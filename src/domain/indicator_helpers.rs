//! Shared rolling-window kernels for indicator calculations.
//!
//! Every kernel returns a vector the same length as its input. Positions
//! whose window is not yet full are `NaN`; a `NaN` inside a window makes
//! that output `NaN`.

use std::collections::HashMap;

use crate::domain::indicator::{
    adx::calculate_adx, atr::calculate_atr, bollinger::calculate_bollinger,
    ema::calculate_ema, macd::calculate_macd, rsi::calculate_rsi, sma::calculate_sma,
    stddev::calculate_stddev, stochastic::calculate_stochastic,
    trend_strength::calculate_trend_strength, volume::calculate_accumulation_distribution,
    volume::calculate_price_volume_trend, wma::calculate_wma, IndicatorSeries, IndicatorType,
};
use crate::domain::ohlcv::OhlcvBar;

/// Apply `f` to every full window of `period` values.
pub fn rolling_apply<F>(values: &[f64], period: usize, f: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 {
        return out;
    }
    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        out[i] = if window.iter().any(|v| v.is_nan()) {
            f64::NAN
        } else {
            f(window)
        };
    }
    out
}

pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    rolling_apply(values, period, |w| w.iter().sum::<f64>() / w.len() as f64)
}

pub fn rolling_max(values: &[f64], period: usize) -> Vec<f64> {
    rolling_apply(values, period, |w| {
        w.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

pub fn rolling_min(values: &[f64], period: usize) -> Vec<f64> {
    rolling_apply(values, period, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

/// Value `n` bars earlier; `NaN` for the first `n` positions.
pub fn shift(values: &[f64], n: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| if i >= n { values[i - n] } else { f64::NAN })
        .collect()
}

/// Fractional change from the previous value.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            if i == 0 {
                f64::NAN
            } else {
                (values[i] - values[i - 1]) / values[i - 1]
            }
        })
        .collect()
}

/// Running sum that skips `NaN` entries: the output is `NaN` where the
/// input is, but the total carries on past it.
pub fn cumulative_sum(values: &[f64]) -> Vec<f64> {
    let mut total = 0.0;
    values
        .iter()
        .map(|&v| {
            if v.is_nan() {
                f64::NAN
            } else {
                total += v;
                total
            }
        })
        .collect()
}

/// True range per bar; the first bar has no previous close and uses high - low.
pub fn true_range(highs: &[f64], lows: &[f64], closes: &[f64]) -> Vec<f64> {
    (0..closes.len())
        .map(|i| {
            let hl = highs[i] - lows[i];
            if i == 0 {
                return hl;
            }
            let prev = closes[i - 1];
            let hc = (highs[i] - prev).abs();
            let lc = (lows[i] - prev).abs();
            if hl.is_nan() || hc.is_nan() || lc.is_nan() {
                f64::NAN
            } else {
                hl.max(hc).max(lc)
            }
        })
        .collect()
}

/// Compute a set of indicators over the same bar series.
pub fn compute_indicators(
    bars: &[OhlcvBar],
    types: &[IndicatorType],
) -> HashMap<IndicatorType, IndicatorSeries> {
    let mut result = HashMap::new();
    for indicator_type in types {
        if result.contains_key(indicator_type) {
            continue;
        }
        let series = match *indicator_type {
            IndicatorType::Sma(period) => calculate_sma(bars, period),
            IndicatorType::Ema(period) => calculate_ema(bars, period),
            IndicatorType::Wma(period) => calculate_wma(bars, period),
            IndicatorType::Rsi(period) => calculate_rsi(bars, period),
            IndicatorType::Atr(period) => calculate_atr(bars, period),
            IndicatorType::Stddev(period) => calculate_stddev(bars, period),
            IndicatorType::Adx(period) => calculate_adx(bars, period),
            IndicatorType::TrendStrength(period) => calculate_trend_strength(bars, period),
            IndicatorType::AccumulationDistribution => calculate_accumulation_distribution(bars),
            IndicatorType::PriceVolumeTrend => calculate_price_volume_trend(bars),
            IndicatorType::Macd { fast, slow, signal } => {
                calculate_macd(bars, fast, slow, signal)
            }
            IndicatorType::Stochastic { k_period, d_period } => {
                calculate_stochastic(bars, k_period, d_period)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => calculate_bollinger(bars, period, stddev_mult_x100),
        };
        result.insert(indicator_type.clone(), series);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::IndicatorValue;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<OhlcvBar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn rolling_mean_warmup_and_values() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 2);
        assert!(out[0].is_nan());
        assert_eq!(&out[1..], &[1.5, 2.5, 3.5]);
    }

    #[test]
    fn rolling_mean_nan_propagates_only_within_window() {
        let out = rolling_mean(&[1.0, f64::NAN, 3.0, 5.0, 7.0], 2);
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
        assert_eq!(out[3], 4.0);
        assert_eq!(out[4], 6.0);
    }

    #[test]
    fn rolling_period_zero_is_all_nan() {
        let out = rolling_mean(&[1.0, 2.0], 0);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rolling_max_min() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0];
        let max = rolling_max(&values, 3);
        let min = rolling_min(&values, 3);
        assert_eq!(&max[2..], &[4.0, 4.0, 5.0]);
        assert_eq!(&min[2..], &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn shift_values() {
        let out = shift(&[1.0, 2.0, 3.0], 1);
        assert!(out[0].is_nan());
        assert_eq!(&out[1..], &[1.0, 2.0]);
    }

    #[test]
    fn pct_change_values() {
        let out = pct_change(&[100.0, 110.0, 99.0]);
        assert!(out[0].is_nan());
        assert!((out[1] - 0.1).abs() < 1e-12);
        assert!((out[2] + 0.1).abs() < 1e-12);
    }

    #[test]
    fn cumulative_sum_skips_nan() {
        let out = cumulative_sum(&[1.0, f64::NAN, 2.0]);
        assert_eq!(out[0], 1.0);
        assert!(out[1].is_nan());
        assert_eq!(out[2], 3.0);
    }

    #[test]
    fn true_range_first_bar_is_high_low() {
        let tr = true_range(&[11.0, 12.0], &[9.0, 11.5], &[10.0, 12.0]);
        assert_eq!(tr[0], 2.0);
        // |12 - 10| = 2 dominates 0.5
        assert_eq!(tr[1], 2.0);
    }

    #[test]
    fn compute_indicators_builds_each_type_once() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let types = vec![
            IndicatorType::Sma(3),
            IndicatorType::Sma(3),
            IndicatorType::Atr(2),
        ];
        let result = compute_indicators(&bars, &types);
        assert_eq!(result.len(), 2);

        let sma = &result[&IndicatorType::Sma(3)];
        assert_eq!(sma.values.len(), 5);
        assert!(!sma.values[1].valid);
        match sma.values[4].value {
            IndicatorValue::Simple(v) => assert!((v - 13.0).abs() < 1e-12),
            _ => panic!("Expected Simple value"),
        }
    }
}
