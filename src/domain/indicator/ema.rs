//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with the SMA of the first n defined values, then
//! EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: leading `NaN`s plus (n-1) bars are undefined. A `NaN` after the
//! seed propagates to every later value.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::{closes, OhlcvBar};

pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 {
        return out;
    }

    let Some(start) = values.iter().position(|v| !v.is_nan()) else {
        return out;
    };
    let seed_end = start + period - 1;
    if seed_end >= values.len() {
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = values[start..=seed_end].iter().sum::<f64>() / period as f64;
    out[seed_end] = ema;

    for i in (seed_end + 1)..values.len() {
        ema = values[i] * k + ema * (1.0 - k);
        out[i] = ema;
    }
    out
}

pub fn calculate_ema(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    IndicatorSeries::from_simple(IndicatorType::Ema(period), bars, ema(&closes(bars), period))
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
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn ema_warmup() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_ema(&bars, 3);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[3].valid);
        assert!(series.values[4].valid);
    }

    #[test]
    fn ema_period_1() {
        let out = ema(&[10.0, 20.0, 30.0], 1);
        assert_eq!(out, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn ema_seed_is_sma() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&bars, 3);

        if let IndicatorValue::Simple(v) = series.values[2].value {
            let expected_sma = (10.0 + 20.0 + 30.0) / 3.0;
            assert!((v - expected_sma).abs() < f64::EPSILON);
        } else {
            panic!("Expected Simple value");
        }
    }

    #[test]
    fn ema_recursive_calculation() {
        let out = ema(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);

        let k = 2.0 / 4.0;
        let sma = (10.0 + 20.0 + 30.0) / 3.0;
        let ema_3 = 40.0 * k + sma * (1.0 - k);
        let ema_4 = 50.0 * k + ema_3 * (1.0 - k);

        assert!((out[2] - sma).abs() < f64::EPSILON);
        assert!((out[3] - ema_3).abs() < f64::EPSILON);
        assert!((out[4] - ema_4).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_skips_leading_nan() {
        let out = ema(&[f64::NAN, f64::NAN, 2.0, 4.0, 6.0], 2);
        assert!(out[2].is_nan());
        assert!((out[3] - 3.0).abs() < f64::EPSILON);
        // k = 2/3
        assert!((out[4] - (6.0 * 2.0 / 3.0 + 3.0 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn ema_nan_after_seed_propagates() {
        let out = ema(&[1.0, 1.0, f64::NAN, 1.0], 2);
        assert_eq!(out[1], 1.0);
        assert!(out[2].is_nan());
        assert!(out[3].is_nan());
    }

    #[test]
    fn ema_empty_and_period_0() {
        assert!(ema(&[], 3).is_empty());
        assert!(ema(&[1.0, 2.0], 0).iter().all(|v| v.is_nan()));
    }
}
