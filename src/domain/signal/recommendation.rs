//! Latest-bar trading recommendation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::ensemble::generate_signals;
use super::regime::MarketRegime;
use super::{EnsembleConfig, Signal};
use crate::domain::indicator::support_resistance::{support_resistance_levels, DEFAULT_LOOKBACK};
use crate::domain::indicator::volume_profile::{volume_profile, DEFAULT_BINS};
use crate::domain::indicator::{IndicatorType, IndicatorValue};
use crate::domain::indicator_helpers::compute_indicators;
use crate::domain::ohlcv::{closes, highs, lows, volumes, OhlcvBar};

const TOP_LEVELS: usize = 3;

const SNAPSHOT_INDICATORS: [IndicatorType; 9] = [
    IndicatorType::Sma(20),
    IndicatorType::Ema(12),
    IndicatorType::Rsi(14),
    IndicatorType::Atr(14),
    IndicatorType::TrendStrength(20),
    IndicatorType::Adx(14),
    IndicatorType::Macd {
        fast: 12,
        slow: 26,
        signal: 9,
    },
    IndicatorType::Bollinger {
        period: 20,
        stddev_mult_x100: 200,
    },
    IndicatorType::Stochastic {
        k_period: 14,
        d_period: 3,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl Recommendation {
    pub fn action(self) -> &'static str {
        match self {
            Recommendation::StrongBuy => "open or add to a long position",
            Recommendation::Buy => "open a small long position",
            Recommendation::Hold => "keep current positions",
            Recommendation::Sell => "open a small short position",
            Recommendation::StrongSell => "open or add to a short position",
        }
    }
}

impl From<Signal> for Recommendation {
    fn from(signal: Signal) -> Self {
        match signal {
            Signal::StrongBuy => Recommendation::StrongBuy,
            Signal::Buy => Recommendation::Buy,
            Signal::Hold => Recommendation::Hold,
            Signal::Sell => Recommendation::Sell,
            Signal::StrongSell => Recommendation::StrongSell,
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Recommendation::StrongBuy => "STRONG BUY",
            Recommendation::Buy => "BUY",
            Recommendation::Hold => "HOLD",
            Recommendation::Sell => "SELL",
            Recommendation::StrongSell => "STRONG SELL",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingRecommendation {
    pub recommendation: Recommendation,
    pub signal_strength: f64,
    pub current_price: f64,
    pub support_levels: Vec<f64>,
    pub resistance_levels: Vec<f64>,
    pub market_regime: MarketRegime,
    /// Price with the most traded volume over the whole series.
    pub point_of_control: Option<f64>,
    /// Defined indicator values on the last bar, keyed by indicator name.
    pub indicators: BTreeMap<String, f64>,
}

fn indicator_snapshot(bars: &[OhlcvBar]) -> BTreeMap<String, f64> {
    let series = compute_indicators(bars, &SNAPSHOT_INDICATORS);
    let mut snapshot = BTreeMap::new();
    for indicator_type in &SNAPSHOT_INDICATORS {
        let Some(point) = series.get(indicator_type).and_then(|s| s.values.last()) else {
            continue;
        };
        if let IndicatorValue::Simple(v) = point.value {
            if !v.is_nan() {
                snapshot.insert(indicator_type.to_string(), v);
            }
            continue;
        }
        for (name, v) in point.value.components() {
            if !v.is_nan() {
                snapshot.insert(format!("{}.{}", indicator_type, name), v);
            }
        }
    }
    snapshot
}

/// Recommendation for the last bar of the series, or `None` when empty.
pub fn recommend(bars: &[OhlcvBar], config: &EnsembleConfig) -> Option<TradingRecommendation> {
    let last = bars.last()?;
    let result = generate_signals(bars, config);
    let (h, l, c) = (highs(bars), lows(bars), closes(bars));
    let levels = support_resistance_levels(&h, &l, &c, DEFAULT_LOOKBACK);
    let profile = volume_profile(&h, &l, &c, &volumes(bars), DEFAULT_BINS);

    let i = bars.len() - 1;
    Some(TradingRecommendation {
        recommendation: result.signals[i].into(),
        signal_strength: result.strength[i],
        current_price: last.close,
        support_levels: levels.support.into_iter().take(TOP_LEVELS).collect(),
        resistance_levels: levels.resistance.into_iter().take(TOP_LEVELS).collect(),
        market_regime: result.regimes[i],
        point_of_control: profile.map(|p| p.poc_price),
        indicators: indicator_snapshot(bars),
    })
}
