//! Weighted combination of detector outputs.
//!
//! Per bar: score = sum(signal * weight) / sum(weight) over ready detectors
//! only (0 when none is ready), discretized against the buy/strong-buy
//! thresholds, then dampened by regime and volatility and rounded half away
//! from zero.

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::detectors::{DetectorKind, DetectorOutput, PriceColumns};
use super::regime::{market_regimes, MarketRegime};
use super::{EnsembleConfig, Signal, SignalWeights};
use crate::domain::indicator::atr::atr;
use crate::domain::indicator_helpers::rolling_mean;
use crate::domain::ohlcv::OhlcvBar;

const VOLATILITY_BASELINE_PERIOD: usize = 20;

/// Counts over a signal series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalStats {
    pub total_signals: usize,
    pub buy_signals: usize,
    pub sell_signals: usize,
    pub strong_buy: usize,
    pub strong_sell: usize,
}

impl SignalStats {
    pub fn from_signals(signals: &[Signal]) -> Self {
        let mut stats = SignalStats::default();
        for &s in signals {
            match s {
                Signal::StrongBuy => {
                    stats.buy_signals += 1;
                    stats.strong_buy += 1;
                }
                Signal::Buy => stats.buy_signals += 1,
                Signal::Sell => stats.sell_signals += 1,
                Signal::StrongSell => {
                    stats.sell_signals += 1;
                    stats.strong_sell += 1;
                }
                Signal::Hold => {}
            }
        }
        stats.total_signals = stats.buy_signals + stats.sell_signals;
        stats
    }
}

/// Everything the ensemble derived from one bar series.
#[derive(Debug, Clone)]
pub struct EnsembleResult {
    pub detectors: Vec<(DetectorKind, DetectorOutput)>,
    /// Weighted score before discretization.
    pub scores: Vec<f64>,
    /// Score clamped to [-1, 1].
    pub strength: Vec<f64>,
    /// Discretized score before risk adjustment.
    pub raw_signals: Vec<Signal>,
    /// Final per-bar signal fed to the engine.
    pub signals: Vec<Signal>,
    pub regimes: Vec<MarketRegime>,
    pub atr: Vec<f64>,
    pub stats: SignalStats,
}

/// Run every detector over the series. Detectors are independent and run in
/// parallel; the result keeps [`DetectorKind::ALL`] order.
pub fn run_detectors(
    cols: &PriceColumns,
    config: &EnsembleConfig,
) -> Vec<(DetectorKind, DetectorOutput)> {
    DetectorKind::ALL
        .par_iter()
        .map(|&kind| (kind, kind.detect(cols, config)))
        .collect()
}

pub fn weighted_scores(
    outputs: &[(DetectorKind, DetectorOutput)],
    weights: &SignalWeights,
    len: usize,
) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let mut weighted = 0.0;
            let mut total_weight = 0.0;
            for (kind, output) in outputs {
                if !output.ready[i] {
                    continue;
                }
                let w = weights.weight(*kind);
                weighted += output.signals[i] as f64 * w;
                total_weight += w;
            }
            if total_weight > 0.0 {
                weighted / total_weight
            } else {
                0.0
            }
        })
        .collect()
}

pub fn discretize(score: f64, config: &EnsembleConfig) -> Signal {
    if score > config.strong_buy_threshold {
        Signal::StrongBuy
    } else if score > config.buy_threshold {
        Signal::Buy
    } else if score < -config.strong_buy_threshold {
        Signal::StrongSell
    } else if score < -config.buy_threshold {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

/// ATR above `ratio` times its 20-bar mean.
pub fn high_volatility(atr: &[f64], ratio: f64) -> Vec<bool> {
    let baseline = rolling_mean(atr, VOLATILITY_BASELINE_PERIOD);
    atr.iter()
        .zip(&baseline)
        .map(|(a, b)| *a > b * ratio)
        .collect()
}

/// Dampen a signal for sideways markets and high volatility, rounding half
/// away from zero (a dampened +1 of exactly 0.5 stays a buy).
pub fn risk_adjust(
    signal: Signal,
    regime: MarketRegime,
    high_volatility: bool,
    config: &EnsembleConfig,
) -> Signal {
    let mut value = signal.value() as f64;
    if regime == MarketRegime::Sideways {
        value *= config.sideways_dampening;
    }
    if high_volatility {
        value *= config.volatility_dampening;
    }
    Signal::from_value(value.round() as i8)
}

/// Full ensemble over a bar series.
pub fn generate_signals(bars: &[OhlcvBar], config: &EnsembleConfig) -> EnsembleResult {
    let cols = PriceColumns::from_bars(bars);
    let detectors = run_detectors(&cols, config);
    for (kind, output) in &detectors {
        let active = output.signals.iter().filter(|&&s| s != 0).count();
        debug!("detector {}: {} active bars", kind.name(), active);
    }

    let scores = weighted_scores(&detectors, &config.weights, cols.len());
    let strength: Vec<f64> = scores.iter().map(|s| s.clamp(-1.0, 1.0)).collect();
    let raw_signals: Vec<Signal> = scores.iter().map(|&s| discretize(s, config)).collect();

    let atr = atr(&cols.highs, &cols.lows, &cols.closes, config.atr_period);
    let regimes = market_regimes(&cols);
    let signals = if config.apply_risk_adjustment {
        let volatile = high_volatility(&atr, config.high_volatility_ratio);
        (0..cols.len())
            .map(|i| risk_adjust(raw_signals[i], regimes[i], volatile[i], config))
            .collect()
    } else {
        raw_signals.clone()
    };

    let stats = SignalStats::from_signals(&raw_signals);
    info!(
        "Ensemble over {} bars: {} buy, {} sell ({} strong buy, {} strong sell)",
        cols.len(),
        stats.buy_signals,
        stats.sell_signals,
        stats.strong_buy,
        stats.strong_sell
    );

    EnsembleResult {
        detectors,
        scores,
        strength,
        raw_signals,
        signals,
        regimes,
        atr,
        stats,
    }
}
