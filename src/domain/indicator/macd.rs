//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: max(fast, slow) - 1 + signal - 1 bars (i.e., slow - 1 + signal - 1 for defaults)

use crate::domain::indicator::ema::ema;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::{closes, OhlcvBar};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdLines {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn macd(values: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdLines {
    let ema_fast = ema(values, fast);
    let ema_slow = ema(values, slow);
    let line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal = ema(&line, signal_period);
    let histogram = line.iter().zip(&signal).map(|(l, s)| l - s).collect();
    MacdLines {
        line,
        signal,
        histogram,
    }
}

pub fn calculate_macd(
    bars: &[OhlcvBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let lines = macd(&closes(bars), fast, slow, signal_period);
    let values = (0..bars.len()).map(|i| IndicatorValue::Macd {
        line: lines.line[i],
        signal: lines.signal[i],
        histogram: lines.histogram[i],
    });
    IndicatorSeries::from_values(
        IndicatorType::Macd {
            fast,
            slow,
            signal: signal_period,
        },
        bars,
        values,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<OhlcvBar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn macd_warmup_matches_slow_plus_signal() {
        let prices: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        let series = calculate_macd(&make_bars(&prices), 12, 26, 9);

        let first_valid = series.values.iter().position(|p| p.valid).unwrap();
        assert_eq!(first_valid, 26 - 1 + 9 - 1);
    }

    #[test]
    fn macd_line_is_ema_difference() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.3).sin()).collect();
        let lines = macd(&prices, 3, 6, 4);
        let fast = ema(&prices, 3);
        let slow = ema(&prices, 6);
        for i in 5..40 {
            assert!((lines.line[i] - (fast[i] - slow[i])).abs() < 1e-12);
            if !lines.signal[i].is_nan() {
                assert!((lines.histogram[i] - (lines.line[i] - lines.signal[i])).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn macd_flat_prices_zero() {
        let lines = macd(&[50.0; 40], 12, 26, 9);
        assert!(lines.line[39].abs() < 1e-12);
        assert!(lines.signal[39].abs() < 1e-12);
        assert!(lines.histogram[39].abs() < 1e-12);
    }

    #[test]
    fn macd_uptrend_positive_line() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + 2.0 * i as f64).collect();
        let lines = macd(&prices, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL);
        assert!(lines.line[59] > 0.0);
    }

    #[test]
    fn macd_short_series_all_undefined() {
        let series = calculate_macd(&make_bars(&[1.0, 2.0, 3.0]), 12, 26, 9);
        assert_eq!(series.len(), 3);
        assert!(series.values.iter().all(|p| !p.valid));
    }
}
