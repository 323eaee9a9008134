//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::rolling_mean;
use crate::domain::ohlcv::{closes, OhlcvBar};

pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    rolling_mean(values, period)
}

pub fn calculate_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    IndicatorSeries::from_simple(IndicatorType::Sma(period), bars, sma(&closes(bars), period))
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
    fn sma_basic() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0]);
        let series = calculate_sma(&bars, 3);

        assert_eq!(series.len(), 4);
        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert_eq!(series.values[2].value, IndicatorValue::Simple(20.0));
        assert_eq!(series.values[3].value, IndicatorValue::Simple(30.0));
    }

    #[test]
    fn sma_longer_than_series() {
        let out = sma(&[1.0, 2.0], 5);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn sma_indicator_type() {
        let bars = make_bars(&[1.0]);
        assert_eq!(calculate_sma(&bars, 7).indicator_type, IndicatorType::Sma(7));
    }
}
