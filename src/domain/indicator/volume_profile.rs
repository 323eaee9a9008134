//! Volume profile: traded volume binned by closing price.
//!
//! The range `[min low, max high]` is split into `bins` equal-width bins and
//! each bar's volume lands in the bin holding its close. A close on the top
//! edge counts in the last bin. The point of control (POC) is the midpoint of
//! the bin with the most volume; ties go to the lowest price. When every
//! price is the same there is a single bin at that price.

pub const DEFAULT_BINS: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeProfile {
    /// Bin midpoints, ascending.
    pub price_levels: Vec<f64>,
    pub volume_at_price: Vec<f64>,
    pub poc_price: f64,
    /// Sum of every defined volume, including bars whose close is undefined.
    pub total_volume: f64,
}

fn price_range(highs: &[f64], lows: &[f64]) -> Option<(f64, f64)> {
    let low = lows
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::INFINITY, f64::min);
    let high = highs
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    (low <= high).then_some((low, high))
}

/// `None` when `bins` is 0 or no bar has a finite high and low.
pub fn volume_profile(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    volumes: &[f64],
    bins: usize,
) -> Option<VolumeProfile> {
    if bins == 0 {
        return None;
    }
    let (low, high) = price_range(highs, lows)?;
    let total_volume: f64 = volumes.iter().filter(|v| !v.is_nan()).sum();

    let width = (high - low) / bins as f64;
    let bins = if width > 0.0 { bins } else { 1 };
    let mut volume_at_price = vec![0.0; bins];

    for (&close, &volume) in closes.iter().zip(volumes) {
        if close.is_nan() || volume.is_nan() || close < low || close > high {
            continue;
        }
        let bin = if width > 0.0 {
            (((close - low) / width) as usize).min(bins - 1)
        } else {
            0
        };
        volume_at_price[bin] += volume;
    }

    let price_levels: Vec<f64> = if width > 0.0 {
        (0..bins).map(|i| low + width * (i as f64 + 0.5)).collect()
    } else {
        vec![low]
    };

    let mut poc = 0;
    for (i, &v) in volume_at_price.iter().enumerate() {
        if v > volume_at_price[poc] {
            poc = i;
        }
    }

    Some(VolumeProfile {
        poc_price: price_levels[poc],
        price_levels,
        volume_at_price,
        total_volume,
    })
}
