//! Market regime classification.
//!
//! - sideways: tight 20-bar range relative to close and trend strength < 0.3
//! - trending: ADX > 25 and trend strength > 0.6
//! - weak trend: 15 < ADX <= 25 and trend strength > 0.3
//! - unknown: anything else, including bars still in warm-up

use serde::{Deserialize, Serialize};
use std::fmt;

use super::detectors::PriceColumns;
use crate::domain::indicator::{adx, trend_strength};

const TRENDING_ADX: f64 = 25.0;
const TRENDING_STRENGTH: f64 = 0.6;
const WEAK_TREND_ADX: f64 = 15.0;
const WEAK_TREND_STRENGTH: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRegime {
    Sideways,
    Trending,
    WeakTrend,
    Unknown,
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MarketRegime::Sideways => "sideways",
            MarketRegime::Trending => "trending",
            MarketRegime::WeakTrend => "weak_trend",
            MarketRegime::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Classify one bar. `sideways` is the 0/1 flag from
/// [`trend_strength::sideways_market`]; `NaN` inputs never match.
pub fn classify(adx: f64, strength: f64, sideways: f64) -> MarketRegime {
    if adx > TRENDING_ADX && strength > TRENDING_STRENGTH {
        MarketRegime::Trending
    } else if adx > WEAK_TREND_ADX && adx <= TRENDING_ADX && strength > WEAK_TREND_STRENGTH {
        MarketRegime::WeakTrend
    } else if sideways == 1.0 {
        MarketRegime::Sideways
    } else {
        MarketRegime::Unknown
    }
}

pub fn market_regimes(cols: &PriceColumns) -> Vec<MarketRegime> {
    let lines = adx::adx(&cols.highs, &cols.lows, &cols.closes, adx::DEFAULT_PERIOD);
    let strength = trend_strength::trend_strength(&cols.closes, trend_strength::DEFAULT_PERIOD);
    let sideways = trend_strength::sideways_market(
        &cols.highs,
        &cols.lows,
        &cols.closes,
        trend_strength::DEFAULT_PERIOD,
        trend_strength::SIDEWAYS_THRESHOLD,
    );

    (0..cols.len())
        .map(|i| classify(lines.adx[i], strength[i], sideways[i]))
        .collect()
}
