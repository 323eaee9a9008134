//! Per-bar buy/sell detectors.
//!
//! Each detector maps the price columns to one signal in -2..=2 per bar plus
//! a readiness flag. Rules inside a detector are applied in order and a
//! later matching rule overwrites an earlier one on the same bar. A bar
//! whose detector is not ready carries 0 and is left out of the ensemble
//! weight sum.

use crate::domain::indicator::breakout::{bandwidth_squeeze, breakout_potential, volume_spike};
use crate::domain::indicator::ema::ema;
use crate::domain::indicator::sma::sma;
use crate::domain::indicator::support_resistance::{support_resistance_levels, SupportResistance};
use crate::domain::indicator::volume::{accumulation_distribution, price_volume_trend};
use crate::domain::indicator::{
    adx, bollinger, breakout, macd, rsi, support_resistance, trend_strength,
};
use crate::domain::indicator_helpers::{rolling_max, rolling_mean, rolling_min, shift};
use crate::domain::ohlcv::OhlcvBar;

use super::{EnsembleConfig, MaKind};

const MA_FAST: usize = 5;
const MA_SLOW: usize = 20;
const MACD_DIVERGENCE_LOOKBACK: usize = 5;
const RSI_OVERSOLD: f64 = 30.0;
const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_DIVERGENCE_LOOKBACK: usize = 10;
const WYCKOFF_DIVERGENCE_LOOKBACK: usize = 5;
const PVT_CONFIRM_LOOKBACK: usize = 3;
const VOLUME_BREAKOUT_PERIOD: usize = 20;
const LEVEL_PROXIMITY: f64 = 0.02;
const STRONG_TREND_ADX: f64 = 25.0;
const STRONG_TREND_STRENGTH: f64 = 0.5;
const REVERSAL_MIN_ADX: f64 = 20.0;

/// Column view of a bar series shared by all detectors.
#[derive(Debug, Clone, Default)]
pub struct PriceColumns {
    pub closes: Vec<f64>,
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
    pub volumes: Vec<f64>,
}

impl PriceColumns {
    pub fn from_bars(bars: &[OhlcvBar]) -> Self {
        PriceColumns {
            closes: bars.iter().map(|b| b.close).collect(),
            highs: bars.iter().map(|b| b.high).collect(),
            lows: bars.iter().map(|b| b.low).collect(),
            volumes: bars.iter().map(|b| b.volume).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectorKind {
    MaCrossover,
    Macd,
    Rsi,
    Bollinger,
    Wyckoff,
    SupportResistance,
    TrendFollowing,
    Breakout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectorOutput {
    pub signals: Vec<i8>,
    pub ready: Vec<bool>,
}

impl DetectorOutput {
    fn idle(len: usize) -> Self {
        DetectorOutput {
            signals: vec![0; len],
            ready: vec![false; len],
        }
    }
}

impl DetectorKind {
    /// Fixed evaluation order; ensemble output follows it.
    pub const ALL: [DetectorKind; 8] = [
        DetectorKind::MaCrossover,
        DetectorKind::Macd,
        DetectorKind::Rsi,
        DetectorKind::Bollinger,
        DetectorKind::Wyckoff,
        DetectorKind::SupportResistance,
        DetectorKind::TrendFollowing,
        DetectorKind::Breakout,
    ];

    /// Config key and display name.
    pub fn name(self) -> &'static str {
        match self {
            DetectorKind::MaCrossover => "ma_crossover",
            DetectorKind::Macd => "macd",
            DetectorKind::Rsi => "rsi",
            DetectorKind::Bollinger => "bollinger",
            DetectorKind::Wyckoff => "wyckoff",
            DetectorKind::SupportResistance => "support_resistance",
            DetectorKind::TrendFollowing => "trend_following",
            DetectorKind::Breakout => "breakout",
        }
    }

    pub fn detect(self, cols: &PriceColumns, config: &EnsembleConfig) -> DetectorOutput {
        match self {
            DetectorKind::MaCrossover => ma_crossover(cols, config.ma_kind),
            DetectorKind::Macd => macd_detector(cols),
            DetectorKind::Rsi => rsi_detector(cols),
            DetectorKind::Bollinger => bollinger_detector(cols),
            DetectorKind::Wyckoff => wyckoff(cols),
            DetectorKind::SupportResistance => support_resistance_detector(cols),
            DetectorKind::TrendFollowing => trend_following(cols),
            DetectorKind::Breakout => breakout_detector(cols),
        }
    }
}

fn crossed_above(a: &[f64], b: &[f64], i: usize) -> bool {
    i > 0 && a[i] > b[i] && a[i - 1] <= b[i - 1]
}

fn crossed_below(a: &[f64], b: &[f64], i: usize) -> bool {
    i > 0 && a[i] < b[i] && a[i - 1] >= b[i - 1]
}

fn defined(values: &[f64], i: usize) -> bool {
    !values[i].is_nan()
}

fn ma_crossover(cols: &PriceColumns, kind: MaKind) -> DetectorOutput {
    let (fast, slow) = match kind {
        MaKind::Sma => (sma(&cols.closes, MA_FAST), sma(&cols.closes, MA_SLOW)),
        MaKind::Ema => (ema(&cols.closes, MA_FAST), ema(&cols.closes, MA_SLOW)),
    };

    let mut out = DetectorOutput::idle(cols.len());
    for i in 0..cols.len() {
        out.ready[i] = defined(&fast, i) && defined(&slow, i);
        if crossed_above(&fast, &slow, i) {
            out.signals[i] = 1;
        }
        if crossed_below(&fast, &slow, i) {
            out.signals[i] = -1;
        }
    }
    out
}

fn macd_detector(cols: &PriceColumns) -> DetectorOutput {
    let c = &cols.closes;
    let lines = macd::macd(c, macd::DEFAULT_FAST, macd::DEFAULT_SLOW, macd::DEFAULT_SIGNAL);
    let hist = &lines.histogram;
    let lb = MACD_DIVERGENCE_LOOKBACK;

    let mut out = DetectorOutput::idle(cols.len());
    for i in 0..cols.len() {
        out.ready[i] = defined(&lines.signal, i);
        let s = &mut out.signals[i];

        if crossed_above(&lines.line, &lines.signal, i) && lines.line[i] > 0.0 {
            *s = 1;
        }
        if crossed_below(&lines.line, &lines.signal, i) && lines.line[i] < 0.0 {
            *s = -1;
        }
        if i >= lb {
            if c[i] > c[i - lb] && hist[i] < hist[i - lb] && hist[i] > 0.0 {
                *s = -1;
            }
            if c[i] < c[i - lb] && hist[i] > hist[i - lb] && hist[i] < 0.0 {
                *s = 1;
            }
        }
    }
    out
}

fn rsi_detector(cols: &PriceColumns) -> DetectorOutput {
    let c = &cols.closes;
    let r = rsi::rsi(c, rsi::DEFAULT_PERIOD);
    let oversold = vec![RSI_OVERSOLD; c.len()];
    let overbought = vec![RSI_OVERBOUGHT; c.len()];
    let lb = RSI_DIVERGENCE_LOOKBACK;

    let mut out = DetectorOutput::idle(cols.len());
    for i in 0..cols.len() {
        out.ready[i] = defined(&r, i);
        let s = &mut out.signals[i];

        if crossed_above(&r, &oversold, i) {
            *s = 1;
        }
        if crossed_below(&r, &overbought, i) {
            *s = -1;
        }
        if i >= lb {
            if c[i] > c[i - lb] && r[i] < r[i - lb] && r[i] > 50.0 {
                *s = -1;
            }
            if c[i] < c[i - lb] && r[i] > r[i - lb] && r[i] < 50.0 {
                *s = 1;
            }
        }
    }
    out
}

fn bollinger_detector(cols: &PriceColumns) -> DetectorOutput {
    let c = &cols.closes;
    let mult = bollinger::DEFAULT_MULT_X100 as f64 / 100.0;
    let bands = bollinger::bollinger(c, bollinger::DEFAULT_PERIOD, mult);
    let squeeze = bandwidth_squeeze(&bands.bandwidth, bollinger::DEFAULT_PERIOD);

    let mut out = DetectorOutput::idle(cols.len());
    for i in 0..cols.len() {
        out.ready[i] = defined(&bands.upper, i);
        let s = &mut out.signals[i];

        if crossed_above(c, &bands.lower, i) {
            *s = 1;
        }
        if crossed_below(c, &bands.upper, i) {
            *s = -1;
        }
        if squeeze[i] && c[i] > bands.upper[i] {
            *s = 1;
        }
        if squeeze[i] && c[i] < bands.lower[i] {
            *s = -1;
        }
    }
    out
}

fn wyckoff(cols: &PriceColumns) -> DetectorOutput {
    let c = &cols.closes;
    let ad = accumulation_distribution(&cols.highs, &cols.lows, c, &cols.volumes);
    let pvt = price_volume_trend(c, &cols.volumes);
    let avg_volume = rolling_mean(&cols.volumes, VOLUME_BREAKOUT_PERIOD);
    let prior_high = shift(&rolling_max(&cols.highs, VOLUME_BREAKOUT_PERIOD), 1);
    let prior_low = shift(&rolling_min(&cols.lows, VOLUME_BREAKOUT_PERIOD), 1);
    let lb = WYCKOFF_DIVERGENCE_LOOKBACK;
    let pc = PVT_CONFIRM_LOOKBACK;

    let mut out = DetectorOutput::idle(cols.len());
    for i in lb..cols.len() {
        out.ready[i] = true;
        let s = &mut out.signals[i];

        let bearish = c[i] > c[i - lb] && ad[i] < ad[i - lb];
        let bullish = c[i] < c[i - lb] && ad[i] > ad[i - lb];
        if bearish {
            *s = -1;
        }
        if bullish {
            *s = 1;
        }

        let pvt_rising = pvt[i] > pvt[i - pc];
        let pvt_falling = pvt[i] < pvt[i - pc];
        if bullish && pvt_rising {
            *s = 2;
        }
        if bearish && pvt_falling {
            *s = -2;
        }

        let high_volume = cols.volumes[i] > avg_volume[i] * breakout::VOLUME_SPIKE_RATIO;
        if high_volume && c[i] > prior_high[i] {
            *s = 2;
        }
        if high_volume && c[i] < prior_low[i] {
            *s = -2;
        }
    }
    out
}

/// +1 when price sits within 2% of a support level it approached from
/// below, -1 when near a resistance level approached from above. Only the
/// first level within range on each side is considered; resistance wins.
pub fn level_proximity_signal(price: f64, prev_close: f64, levels: &SupportResistance) -> i8 {
    let near = |level: f64| (price - level).abs() / level < LEVEL_PROXIMITY;
    let mut signal = 0;
    if price.is_nan() {
        return signal;
    }
    if let Some(&support) = levels.support.iter().find(|&&s| near(s)) {
        if prev_close < support {
            signal = 1;
        }
    }
    if let Some(&resistance) = levels.resistance.iter().find(|&&r| near(r)) {
        if prev_close > resistance {
            signal = -1;
        }
    }
    signal
}

fn support_resistance_detector(cols: &PriceColumns) -> DetectorOutput {
    let levels = support_resistance_levels(
        &cols.highs,
        &cols.lows,
        &cols.closes,
        support_resistance::DEFAULT_LOOKBACK,
    );

    let mut out = DetectorOutput::idle(cols.len());
    if levels.support.is_empty() || levels.resistance.is_empty() {
        return out;
    }
    for i in 1..cols.len() {
        out.ready[i] = true;
        out.signals[i] = level_proximity_signal(cols.closes[i], cols.closes[i - 1], &levels);
    }
    out
}

fn trend_following(cols: &PriceColumns) -> DetectorOutput {
    let lines = adx::adx(&cols.highs, &cols.lows, &cols.closes, adx::DEFAULT_PERIOD);
    let strength = trend_strength::trend_strength(&cols.closes, trend_strength::DEFAULT_PERIOD);
    let (a, pdi, mdi) = (&lines.adx, &lines.plus_di, &lines.minus_di);

    let mut out = DetectorOutput::idle(cols.len());
    for i in 0..cols.len() {
        out.ready[i] = defined(a, i) && defined(&strength, i);
        let s = &mut out.signals[i];

        let strong_trend = a[i] > STRONG_TREND_ADX && strength[i] > STRONG_TREND_STRENGTH;
        if strong_trend && pdi[i] > mdi[i] {
            *s = 1;
        }
        if strong_trend && mdi[i] > pdi[i] {
            *s = -1;
        }

        if i > 0 && a[i] > REVERSAL_MIN_ADX {
            if pdi[i] > mdi[i] && pdi[i - 1] <= mdi[i - 1] {
                *s = 1;
            }
            if mdi[i] > pdi[i] && mdi[i - 1] <= pdi[i - 1] {
                *s = -1;
            }
        }
    }
    out
}

fn breakout_detector(cols: &PriceColumns) -> DetectorOutput {
    let period = breakout::DEFAULT_PERIOD;
    let c = &cols.closes;
    let potential = breakout_potential(&cols.highs, &cols.lows, c, &cols.volumes, period);
    let spikes = volume_spike(&cols.volumes, period);
    let prior_high = shift(&rolling_max(&cols.highs, period), 1);
    let prior_low = shift(&rolling_min(&cols.lows, period), 1);

    let mut out = DetectorOutput::idle(cols.len());
    for i in period..cols.len() {
        out.ready[i] = true;
        let s = &mut out.signals[i];

        if spikes[i] && c[i] > prior_high[i] {
            *s = 2;
        }
        if spikes[i] && c[i] < prior_low[i] {
            *s = -2;
        }
        if potential.breakout_up[i] {
            *s = 1;
        }
        if potential.breakout_down[i] {
            *s = -1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(closes: Vec<f64>) -> PriceColumns {
        PriceColumns {
            highs: closes.iter().map(|c| c + 1.0).collect(),
            lows: closes.iter().map(|c| c - 1.0).collect(),
            volumes: vec![1000.0; closes.len()],
            closes,
        }
    }

    fn v_shape(down: usize, up: usize) -> Vec<f64> {
        let mut closes: Vec<f64> = (0..down).map(|i| 200.0 - 2.0 * i as f64).collect();
        let bottom = closes[down - 1];
        closes.extend((1..=up).map(|i| bottom + 2.0 * i as f64));
        closes
    }

    fn flat_then_jump() -> PriceColumns {
        let mut closes = vec![100.0; 25];
        closes.push(105.0);
        let mut cols = columns(closes);
        cols.volumes[25] = 5000.0;
        cols
    }

    #[test]
    fn all_detectors_preserve_length() {
        let cols = columns(v_shape(40, 40));
        let config = EnsembleConfig::default();
        for kind in DetectorKind::ALL {
            let out = kind.detect(&cols, &config);
            assert_eq!(out.signals.len(), 80, "{}", kind.name());
            assert_eq!(out.ready.len(), 80, "{}", kind.name());
            assert!(out.signals.iter().all(|s| (-2..=2).contains(s)));
        }
    }

    #[test]
    fn empty_input() {
        let cols = PriceColumns::default();
        let config = EnsembleConfig::default();
        for kind in DetectorKind::ALL {
            assert!(kind.detect(&cols, &config).signals.is_empty());
        }
    }

    #[test]
    fn ma_crossover_single_golden_cross_on_v_shape() {
        let cols = columns(v_shape(30, 30));
        let out = ma_crossover(&cols, MaKind::Sma);

        assert!(!out.ready[18]);
        assert!(out.ready[19]);
        assert_eq!(out.signals.iter().filter(|&&s| s == 1).count(), 1);
        assert_eq!(out.signals.iter().filter(|&&s| s == -1).count(), 0);
    }

    #[test]
    fn ma_crossover_ema_variant_crosses_too() {
        let cols = columns(v_shape(30, 30));
        let out = ma_crossover(&cols, MaKind::Ema);
        assert!(out.signals.contains(&1));
    }

    #[test]
    fn macd_ready_after_signal_warmup() {
        let cols = columns(v_shape(30, 30));
        let out = macd_detector(&cols);
        assert!(!out.ready[32]);
        assert!(out.ready[33]);
    }

    #[test]
    fn rsi_first_signal_after_bottom_is_buy() {
        let cols = columns(v_shape(25, 25));
        let out = rsi_detector(&cols);
        let first = out.signals.iter().find(|&&s| s != 0);
        assert_eq!(first, Some(&1));
    }

    #[test]
    fn rsi_flat_tape_then_downtick_is_quiet() {
        let mut closes = vec![100.0; 30];
        closes.extend((1..=10).map(|i| 100.0 - 0.1 * i as f64));
        let out = rsi_detector(&columns(closes));
        assert!(!out.ready[29]);
        assert!(out.ready[30]);
        assert!(out.signals[..=30].iter().all(|&s| s >= 0));
    }

    #[test]
    fn wyckoff_volume_breakout_is_strong_buy() {
        let cols = flat_then_jump();
        let out = wyckoff(&cols);
        assert!(!out.ready[4]);
        assert!(out.ready[5]);
        assert_eq!(out.signals[25], 2);
        assert!(out.signals[..25].iter().all(|&s| s == 0));
    }

    #[test]
    fn breakout_on_volume_is_strong_buy() {
        let cols = flat_then_jump();
        let out = breakout_detector(&cols);
        assert!(!out.ready[19]);
        assert!(out.ready[20]);
        assert_eq!(out.signals[25], 2);
    }

    #[test]
    fn trend_following_buys_strong_uptrend() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + 2.0 * i as f64).collect();
        let out = trend_following(&columns(closes));
        assert!(out.ready[59]);
        assert_eq!(out.signals[59], 1);
    }

    #[test]
    fn support_resistance_without_levels_is_idle() {
        let cols = columns(vec![100.0; 30]);
        let out = support_resistance_detector(&cols);
        assert!(out.signals.iter().all(|&s| s == 0));
        assert!(out.ready.iter().all(|&r| !r));
    }

    #[test]
    fn level_proximity_from_below_support() {
        let levels = SupportResistance {
            resistance: vec![120.0],
            support: vec![100.0],
        };
        assert_eq!(level_proximity_signal(101.0, 99.0, &levels), 1);
        // approached from above: no signal
        assert_eq!(level_proximity_signal(101.0, 103.0, &levels), 0);
        // too far from any level
        assert_eq!(level_proximity_signal(110.0, 99.0, &levels), 0);
    }

    #[test]
    fn level_proximity_from_above_resistance() {
        let levels = SupportResistance {
            resistance: vec![120.0],
            support: vec![100.0],
        };
        assert_eq!(level_proximity_signal(119.0, 121.0, &levels), -1);
        assert_eq!(level_proximity_signal(119.0, 118.0, &levels), 0);
    }

    #[test]
    fn level_proximity_only_first_level_counts() {
        let levels = SupportResistance {
            resistance: vec![],
            support: vec![100.0, 101.0],
        };
        // 100.5 is near 100 first; prev close 100.8 is not below 100
        assert_eq!(level_proximity_signal(100.5, 100.8, &levels), 0);
    }
}
