//! OHLCV bar representation and series contract checks.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::ContractViolation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        if hl.is_nan() || hc.is_nan() || lc.is_nan() {
            return f64::NAN;
        }
        hl.max(hc).max(lc)
    }
}

/// Check that bar dates are strictly ascending.
///
/// A descending pair reports the offending index; an equal pair reports the
/// duplicated date.
pub fn validate_series(bars: &[OhlcvBar]) -> Result<(), ContractViolation> {
    for (i, pair) in bars.windows(2).enumerate() {
        if pair[1].date == pair[0].date {
            return Err(ContractViolation::DuplicateDate { date: pair[1].date });
        }
        if pair[1].date < pair[0].date {
            return Err(ContractViolation::UnsortedSeries { index: i + 1 });
        }
    }
    Ok(())
}

pub fn closes(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

pub fn highs(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter().map(|b| b.high).collect()
}

pub fn lows(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter().map(|b| b.low).collect()
}

pub fn volumes(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter().map(|b| b.volume).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> OhlcvBar {
        OhlcvBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000.0,
        }
    }

    fn bar_on(day: u32) -> OhlcvBar {
        OhlcvBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            ..sample_bar()
        }
    }

    #[test]
    fn true_range_hl_dominates() {
        let bar = sample_bar();
        // high-low=20, |high-100|=10, |low-100|=10 → 20
        assert!((bar.true_range(100.0) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bar = sample_bar();
        // high-low=20, |110-70|=40, |90-70|=20 → 40
        assert!((bar.true_range(70.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_down() {
        let bar = sample_bar();
        // high-low=20, |110-130|=20, |90-130|=40 → 40
        assert!((bar.true_range(130.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_nan_prev_close() {
        assert!(sample_bar().true_range(f64::NAN).is_nan());
    }

    #[test]
    fn validate_sorted_series() {
        let bars = vec![bar_on(1), bar_on(2), bar_on(5)];
        assert!(validate_series(&bars).is_ok());
    }

    #[test]
    fn validate_empty_and_single() {
        assert!(validate_series(&[]).is_ok());
        assert!(validate_series(&[bar_on(3)]).is_ok());
    }

    #[test]
    fn validate_rejects_descending() {
        let bars = vec![bar_on(1), bar_on(3), bar_on(2)];
        assert_eq!(
            validate_series(&bars),
            Err(ContractViolation::UnsortedSeries { index: 2 })
        );
    }

    #[test]
    fn validate_rejects_duplicate() {
        let bars = vec![bar_on(1), bar_on(1)];
        assert_eq!(
            validate_series(&bars),
            Err(ContractViolation::DuplicateDate {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
            })
        );
    }

    #[test]
    fn column_extractors() {
        let bars = vec![bar_on(1), bar_on(2)];
        assert_eq!(closes(&bars), vec![105.0, 105.0]);
        assert_eq!(highs(&bars), vec![110.0, 110.0]);
        assert_eq!(lows(&bars), vec![90.0, 90.0]);
        assert_eq!(volumes(&bars), vec![50_000.0, 50_000.0]);
    }
}
