//! ADX (Average Directional Index) indicator.
//!
//! Steps:
//! 1. +DM = H - prevH when it exceeds prevL - L and is positive, else 0; -DM mirrors it
//! 2. +DI = 100 * SMA(+DM, n) / ATR(n), -DI = 100 * SMA(-DM, n) / ATR(n)
//! 3. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 4. ADX = SMA(DX, n)
//!
//! Warmup: the first bar has no directional movement, so +DI/-DI start at
//! bar n and ADX at bar 2n - 1.

use crate::domain::indicator::atr::atr;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::indicator_helpers::rolling_mean;
use crate::domain::ohlcv::{closes, highs, lows, OhlcvBar};

pub const DEFAULT_PERIOD: usize = 14;

#[derive(Debug, Clone, PartialEq)]
pub struct AdxLines {
    pub adx: Vec<f64>,
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
}

pub fn adx(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> AdxLines {
    let n = closes.len();
    let mut plus_dm = vec![f64::NAN; n];
    let mut minus_dm = vec![f64::NAN; n];

    for i in 1..n {
        let up_move = highs[i] - highs[i - 1];
        let down_move = lows[i - 1] - lows[i];
        if up_move.is_nan() || down_move.is_nan() {
            continue;
        }
        plus_dm[i] = if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        };
        minus_dm[i] = if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        };
    }

    let atr_values = atr(highs, lows, closes, period);
    let plus_avg = rolling_mean(&plus_dm, period);
    let minus_avg = rolling_mean(&minus_dm, period);

    let mut plus_di = vec![f64::NAN; n];
    let mut minus_di = vec![f64::NAN; n];
    let mut dx = vec![f64::NAN; n];

    for i in 0..n {
        if atr_values[i].is_nan() || atr_values[i] == 0.0 {
            continue;
        }
        plus_di[i] = 100.0 * plus_avg[i] / atr_values[i];
        minus_di[i] = 100.0 * minus_avg[i] / atr_values[i];

        let di_sum = plus_di[i] + minus_di[i];
        dx[i] = if di_sum == 0.0 {
            0.0
        } else {
            100.0 * (plus_di[i] - minus_di[i]).abs() / di_sum
        };
    }

    AdxLines {
        adx: rolling_mean(&dx, period),
        plus_di,
        minus_di,
    }
}

pub fn calculate_adx(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let lines = adx(&highs(bars), &lows(bars), &closes(bars), period);
    let values = (0..bars.len()).map(|i| IndicatorValue::Adx {
        adx: lines.adx[i],
        plus_di: lines.plus_di[i],
        minus_di: lines.minus_di[i],
    });
    IndicatorSeries::from_values(IndicatorType::Adx(period), bars, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trending_up(n: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + 2.0 * i as f64).collect();
        let highs = closes.iter().map(|c| c + 1.0).collect();
        let lows = closes.iter().map(|c| c - 1.0).collect();
        (highs, lows, closes)
    }

    #[test]
    fn adx_warmup() {
        let (h, l, c) = trending_up(40);
        let lines = adx(&h, &l, &c, 14);

        assert!(lines.plus_di[13].is_nan());
        assert!(!lines.plus_di[14].is_nan());
        assert!(lines.adx[26].is_nan());
        assert!(!lines.adx[27].is_nan());
    }

    #[test]
    fn adx_strong_uptrend() {
        let (h, l, c) = trending_up(40);
        let lines = adx(&h, &l, &c, 14);

        // Every bar moves up by 2 with no down movement: -DI is 0, DX is 100
        assert!((lines.adx[39] - 100.0).abs() < 1e-9);
        assert!(lines.plus_di[39] > lines.minus_di[39]);
        assert_eq!(lines.minus_di[39], 0.0);
    }

    #[test]
    fn adx_flat_market_undefined() {
        let flat = vec![100.0; 30];
        let lines = adx(&flat, &flat, &flat, 5);
        assert!(lines.adx.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn adx_series_length_matches() {
        let (h, l, c) = trending_up(10);
        let lines = adx(&h, &l, &c, 14);
        assert_eq!(lines.adx.len(), 10);
        assert_eq!(lines.plus_di.len(), 10);
        assert_eq!(lines.minus_di.len(), 10);
    }
}
