//! Support and resistance levels from local extremes.
//!
//! A bar's high is a resistance candidate when it equals the maximum high in
//! the window `[i - lookback, i + lookback]`; lows mirror this for support.
//! Candidates within 2% of the overall level range of an already accepted
//! level are merged into it. Resistance is returned highest first, support
//! lowest first.

pub const DEFAULT_LOOKBACK: usize = 20;
pub const CLUSTER_TOLERANCE: f64 = 0.02;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupportResistance {
    pub resistance: Vec<f64>,
    pub support: Vec<f64>,
}

impl SupportResistance {
    pub fn is_empty(&self) -> bool {
        self.resistance.is_empty() && self.support.is_empty()
    }
}

fn cluster(candidates: &[f64], tolerance: f64) -> Vec<f64> {
    let mut levels: Vec<f64> = Vec::new();
    for &level in candidates {
        if !levels.iter().any(|existing| (level - existing).abs() <= tolerance) {
            levels.push(level);
        }
    }
    levels
}

pub fn support_resistance_levels(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    lookback: usize,
) -> SupportResistance {
    let n = closes.len();
    if n <= 2 * lookback {
        return SupportResistance::default();
    }

    let mut peaks = Vec::new();
    let mut troughs = Vec::new();
    for i in lookback..n - lookback {
        let window = i - lookback..=i + lookback;
        let window_high = highs[window.clone()]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let window_low = lows[window].iter().copied().fold(f64::INFINITY, f64::min);

        if highs[i] == window_high {
            peaks.push(highs[i]);
        }
        if lows[i] == window_low {
            troughs.push(lows[i]);
        }
    }

    let all = peaks.iter().chain(&troughs).copied();
    let (min, max) = all.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min > max {
        return SupportResistance::default();
    }
    let tolerance = (max - min) * CLUSTER_TOLERANCE;

    let mut resistance = cluster(&peaks, tolerance);
    let mut support = cluster(&troughs, tolerance);
    resistance.sort_by(|a, b| b.total_cmp(a));
    support.sort_by(|a, b| a.total_cmp(b));

    SupportResistance {
        resistance,
        support,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sawtooth between 90 and 110 with a period of `cycle` bars.
    fn sawtooth(n: usize, cycle: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let half = cycle / 2;
        let closes: Vec<f64> = (0..n)
            .map(|i| {
                let pos = i % cycle;
                let step = 20.0 / half as f64;
                if pos <= half {
                    90.0 + step * pos as f64
                } else {
                    110.0 - step * (pos - half) as f64
                }
            })
            .collect();
        let highs = closes.iter().map(|c| c + 1.0).collect();
        let lows = closes.iter().map(|c| c - 1.0).collect();
        (highs, lows, closes)
    }

    #[test]
    fn too_short_is_empty() {
        let (h, l, c) = sawtooth(40, 10);
        let levels = support_resistance_levels(&h, &l, &c, 20);
        assert!(levels.is_empty());
    }

    #[test]
    fn repeated_extremes_cluster_to_one_level() {
        let (h, l, c) = sawtooth(60, 10);
        let levels = support_resistance_levels(&h, &l, &c, 5);
        assert_eq!(levels.resistance, vec![111.0]);
        assert_eq!(levels.support, vec![89.0]);
    }

    #[test]
    fn levels_sorted() {
        let mut highs = vec![100.0; 11];
        let mut lows = vec![95.0; 11];
        highs[2] = 120.0;
        highs[8] = 130.0;
        lows[3] = 80.0;
        lows[7] = 60.0;
        let closes = vec![97.0; 11];
        let levels = support_resistance_levels(&highs, &lows, &closes, 2);
        // the flat stretch around bar 5 is a plateau high of its own
        assert_eq!(levels.resistance, vec![130.0, 120.0, 100.0]);
        assert_eq!(levels.support, vec![60.0, 80.0]);
    }
}
