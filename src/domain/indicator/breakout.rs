//! Breakout potential flags.
//!
//! - squeeze: Bollinger bandwidth below 0.8x its own rolling mean
//! - volume spike: volume above 1.5x its rolling mean
//! - near resistance: close above 98% of the rolling high
//! - near support: close below 102% of the rolling low
//!
//! Upward potential requires squeeze, spike and near resistance; downward
//! potential mirrors it with near support. Undefined inputs yield `false`.

use crate::domain::indicator::bollinger::bollinger;
use crate::domain::indicator_helpers::{rolling_max, rolling_mean, rolling_min};

pub const DEFAULT_PERIOD: usize = 20;
pub const SQUEEZE_RATIO: f64 = 0.8;
pub const VOLUME_SPIKE_RATIO: f64 = 1.5;

#[derive(Debug, Clone, PartialEq)]
pub struct BreakoutPotential {
    pub breakout_up: Vec<bool>,
    pub breakout_down: Vec<bool>,
    pub bb_squeeze: Vec<bool>,
    pub volume_spike: Vec<bool>,
}

/// Bandwidth below `SQUEEZE_RATIO` of its `period`-bar mean.
pub fn bandwidth_squeeze(bandwidth: &[f64], period: usize) -> Vec<bool> {
    let avg = rolling_mean(bandwidth, period);
    bandwidth
        .iter()
        .zip(&avg)
        .map(|(bw, avg)| *bw < avg * SQUEEZE_RATIO)
        .collect()
}

/// Volume above `VOLUME_SPIKE_RATIO` of its `period`-bar mean.
pub fn volume_spike(volumes: &[f64], period: usize) -> Vec<bool> {
    let avg = rolling_mean(volumes, period);
    volumes
        .iter()
        .zip(&avg)
        .map(|(v, avg)| *v > avg * VOLUME_SPIKE_RATIO)
        .collect()
}

pub fn breakout_potential(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    volumes: &[f64],
    period: usize,
) -> BreakoutPotential {
    let bands = bollinger(closes, period, 2.0);
    let bb_squeeze = bandwidth_squeeze(&bands.bandwidth, period);
    let volume_spike = volume_spike(volumes, period);
    let range_high = rolling_max(highs, period);
    let range_low = rolling_min(lows, period);

    let mut breakout_up = vec![false; closes.len()];
    let mut breakout_down = vec![false; closes.len()];
    for i in 0..closes.len() {
        if !(bb_squeeze[i] && volume_spike[i]) {
            continue;
        }
        breakout_up[i] = closes[i] > range_high[i] * 0.98;
        breakout_down[i] = closes[i] < range_low[i] * 1.02;
    }

    BreakoutPotential {
        breakout_up,
        breakout_down,
        bb_squeeze,
        volume_spike,
    }
}
