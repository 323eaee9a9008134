//! Technical indicator implementations.
//!
//! Each indicator module exposes a raw kernel over `&[f64]` columns (used by
//! the signal ensemble) and a `calculate_*` wrapper that produces an
//! [`IndicatorSeries`] aligned with the bar series.
//!
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: A time series of indicator values
//!
//! Undefined values (warm-up or `NaN` input) are carried as `NaN` and the
//! point is marked invalid.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod breakout;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod stochastic;
pub mod support_resistance;
pub mod trend_strength;
pub mod volume;
pub mod volume_profile;
pub mod wma;

pub use volume_profile::{volume_profile, VolumeProfile};

use chrono::NaiveDate;
use std::fmt;

use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Stochastic {
        k: f64,
        d: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
        bandwidth: f64,
    },
    Adx {
        adx: f64,
        plus_di: f64,
        minus_di: f64,
    },
}

impl IndicatorValue {
    /// Named components, in display order.
    pub fn components(&self) -> Vec<(&'static str, f64)> {
        match *self {
            IndicatorValue::Simple(v) => vec![("value", v)],
            IndicatorValue::Macd {
                line,
                signal,
                histogram,
            } => vec![("line", line), ("signal", signal), ("histogram", histogram)],
            IndicatorValue::Stochastic { k, d } => vec![("k", k), ("d", d)],
            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
                bandwidth,
            } => vec![
                ("upper", upper),
                ("middle", middle),
                ("lower", lower),
                ("bandwidth", bandwidth),
            ],
            IndicatorValue::Adx {
                adx,
                plus_di,
                minus_di,
            } => vec![("adx", adx), ("plus_di", plus_di), ("minus_di", minus_di)],
        }
    }

    /// True when no component is `NaN`.
    pub fn is_defined(&self) -> bool {
        match *self {
            IndicatorValue::Simple(v) => !v.is_nan(),
            IndicatorValue::Macd {
                line,
                signal,
                histogram,
            } => !(line.is_nan() || signal.is_nan() || histogram.is_nan()),
            IndicatorValue::Stochastic { k, d } => !(k.is_nan() || d.is_nan()),
            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
                bandwidth,
            } => !(upper.is_nan() || middle.is_nan() || lower.is_nan() || bandwidth.is_nan()),
            IndicatorValue::Adx {
                adx,
                plus_di,
                minus_di,
            } => !(adx.is_nan() || plus_di.is_nan() || minus_di.is_nan()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Wma(usize),
    Rsi(usize),
    Atr(usize),
    Stddev(usize),
    Adx(usize),
    TrendStrength(usize),
    AccumulationDistribution,
    PriceVolumeTrend,
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Stochastic {
        k_period: usize,
        d_period: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Build a series from per-bar values; validity follows [`IndicatorValue::is_defined`].
    pub fn from_values<I>(indicator_type: IndicatorType, bars: &[OhlcvBar], values: I) -> Self
    where
        I: IntoIterator<Item = IndicatorValue>,
    {
        let values = bars
            .iter()
            .zip(values)
            .map(|(bar, value)| IndicatorPoint {
                date: bar.date,
                valid: value.is_defined(),
                value,
            })
            .collect();
        IndicatorSeries {
            indicator_type,
            values,
        }
    }

    pub fn from_simple(indicator_type: IndicatorType, bars: &[OhlcvBar], values: Vec<f64>) -> Self {
        Self::from_values(
            indicator_type,
            bars,
            values.into_iter().map(IndicatorValue::Simple),
        )
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Wma(period) => write!(f, "WMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorType::Adx(period) => write!(f, "ADX({})", period),
            IndicatorType::TrendStrength(period) => write!(f, "TREND_STRENGTH({})", period),
            IndicatorType::AccumulationDistribution => write!(f, "AD_LINE"),
            IndicatorType::PriceVolumeTrend => write!(f, "PVT"),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Stochastic { k_period, d_period } => {
                write!(f, "STOCHASTIC({},{})", k_period, d_period)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}
