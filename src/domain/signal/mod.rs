//! Signal ensemble: eight per-bar detectors combined into one weighted,
//! discretized and regime-dampened trading signal.
//!
//! - [`detectors`]: the individual buy/sell detectors
//! - [`ensemble`]: weighted combination, discretization and risk adjustment
//! - [`regime`]: market regime classification
//! - [`recommendation`]: latest-bar trading recommendation

pub mod detectors;
pub mod ensemble;
pub mod recommendation;
pub mod regime;

use serde::{Deserialize, Serialize};
use std::fmt;

use detectors::DetectorKind;

/// Five-level trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    StrongSell,
    Sell,
    Hold,
    Buy,
    StrongBuy,
}

impl Signal {
    pub fn value(self) -> i8 {
        match self {
            Signal::StrongSell => -2,
            Signal::Sell => -1,
            Signal::Hold => 0,
            Signal::Buy => 1,
            Signal::StrongBuy => 2,
        }
    }

    /// Values outside -2..=2 saturate to the strong variants.
    pub fn from_value(value: i8) -> Self {
        match value {
            i8::MIN..=-2 => Signal::StrongSell,
            -1 => Signal::Sell,
            0 => Signal::Hold,
            1 => Signal::Buy,
            _ => Signal::StrongBuy,
        }
    }

    pub fn is_buy(self) -> bool {
        self.value() > 0
    }

    pub fn is_sell(self) -> bool {
        self.value() < 0
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Signal::StrongSell => "STRONG_SELL",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
            Signal::Buy => "BUY",
            Signal::StrongBuy => "STRONG_BUY",
        };
        write!(f, "{}", s)
    }
}

/// Moving average used by the crossover detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaKind {
    #[default]
    Sma,
    Ema,
}

impl std::str::FromStr for MaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sma" => Ok(MaKind::Sma),
            "ema" => Ok(MaKind::Ema),
            other => Err(format!("unknown moving average type '{}', expected sma or ema", other)),
        }
    }
}

/// Per-detector weights in the ensemble score.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalWeights {
    pub ma_crossover: f64,
    pub macd: f64,
    pub rsi: f64,
    pub bollinger: f64,
    pub wyckoff: f64,
    pub support_resistance: f64,
    pub trend_following: f64,
    pub breakout: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        SignalWeights {
            ma_crossover: 1.0,
            macd: 1.2,
            rsi: 0.8,
            bollinger: 1.0,
            wyckoff: 1.5,
            support_resistance: 1.1,
            trend_following: 1.3,
            breakout: 1.4,
        }
    }
}

impl SignalWeights {
    pub fn weight(&self, kind: DetectorKind) -> f64 {
        match kind {
            DetectorKind::MaCrossover => self.ma_crossover,
            DetectorKind::Macd => self.macd,
            DetectorKind::Rsi => self.rsi,
            DetectorKind::Bollinger => self.bollinger,
            DetectorKind::Wyckoff => self.wyckoff,
            DetectorKind::SupportResistance => self.support_resistance,
            DetectorKind::TrendFollowing => self.trend_following,
            DetectorKind::Breakout => self.breakout,
        }
    }

    pub fn set(&mut self, kind: DetectorKind, weight: f64) {
        let slot = match kind {
            DetectorKind::MaCrossover => &mut self.ma_crossover,
            DetectorKind::Macd => &mut self.macd,
            DetectorKind::Rsi => &mut self.rsi,
            DetectorKind::Bollinger => &mut self.bollinger,
            DetectorKind::Wyckoff => &mut self.wyckoff,
            DetectorKind::SupportResistance => &mut self.support_resistance,
            DetectorKind::TrendFollowing => &mut self.trend_following,
            DetectorKind::Breakout => &mut self.breakout,
        };
        *slot = weight;
    }

    pub fn total(&self) -> f64 {
        DetectorKind::ALL.iter().map(|&k| self.weight(k)).sum()
    }
}

/// Ensemble parameters: weights, discretization thresholds and the
/// regime/volatility dampening applied by risk adjustment.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleConfig {
    pub weights: SignalWeights,
    pub ma_kind: MaKind,
    pub buy_threshold: f64,
    pub strong_buy_threshold: f64,
    pub sideways_dampening: f64,
    pub volatility_dampening: f64,
    pub high_volatility_ratio: f64,
    pub atr_period: usize,
    pub apply_risk_adjustment: bool,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        EnsembleConfig {
            weights: SignalWeights::default(),
            ma_kind: MaKind::Sma,
            buy_threshold: 0.3,
            strong_buy_threshold: 0.6,
            sideways_dampening: 0.5,
            volatility_dampening: 0.7,
            high_volatility_ratio: 1.5,
            atr_period: 14,
            apply_risk_adjustment: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_values_round_trip() {
        for v in -2..=2 {
            assert_eq!(Signal::from_value(v).value(), v);
        }
    }

    #[test]
    fn signal_saturates() {
        assert_eq!(Signal::from_value(5), Signal::StrongBuy);
        assert_eq!(Signal::from_value(-7), Signal::StrongSell);
    }

    #[test]
    fn signal_direction() {
        assert!(Signal::Buy.is_buy());
        assert!(Signal::StrongSell.is_sell());
        assert!(!Signal::Hold.is_buy());
        assert!(!Signal::Hold.is_sell());
    }

    #[test]
    fn signal_display() {
        assert_eq!(Signal::StrongBuy.to_string(), "STRONG_BUY");
        assert_eq!(Signal::Hold.to_string(), "HOLD");
    }

    #[test]
    fn default_weights() {
        let w = SignalWeights::default();
        assert!((w.weight(DetectorKind::Wyckoff) - 1.5).abs() < f64::EPSILON);
        assert!((w.weight(DetectorKind::Rsi) - 0.8).abs() < f64::EPSILON);
        assert!((w.total() - 9.3).abs() < 1e-12);
    }

    #[test]
    fn ma_kind_parses() {
        assert_eq!("EMA".parse::<MaKind>(), Ok(MaKind::Ema));
        assert_eq!(" sma ".parse::<MaKind>(), Ok(MaKind::Sma));
        assert!("wma".parse::<MaKind>().is_err());
    }

    #[test]
    fn set_weight() {
        let mut w = SignalWeights::default();
        w.set(DetectorKind::Breakout, 0.0);
        assert_eq!(w.breakout, 0.0);
        assert!((w.total() - 7.9).abs() < 1e-12);
    }
}
