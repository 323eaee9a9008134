#![allow(dead_code)]

use chrono::NaiveDate;
use sigtrader::domain::backtest::BacktestConfig;
use sigtrader::domain::error::SigtraderError;
use sigtrader::domain::execution::ExecutionConfig;
pub use sigtrader::domain::ohlcv::OhlcvBar;
use sigtrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<OhlcvBar>, SigtraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SigtraderError::DataLoad {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => Ok(bars.clone()),
            _ => Err(SigtraderError::NoData {
                symbol: symbol.to_string(),
            }),
        }
    }

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000.0,
    }
}

/// Bars on consecutive days with the given closes.
pub fn bars_from_closes(start_date: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Steadily rising bars, one point per day.
pub fn generate_bars(start_date: &str, count: usize, start_price: f64) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..count).map(|i| start_price + i as f64).collect();
    bars_from_closes(start_date, &closes)
}

/// A trending sine wave with varying ranges and volume, enough to make
/// every detector fire somewhere.
pub fn wave_bars(count: usize) -> Vec<OhlcvBar> {
    let start = date(2023, 1, 2);
    (0..count)
        .map(|i| {
            let t = i as f64;
            let close = 100.0 + 0.05 * t + 12.0 * (t / 9.0).sin() + 3.0 * (t / 2.3).cos();
            let range = 1.0 + 0.8 * (t / 5.0).sin().abs();
            OhlcvBar {
                date: start + chrono::Duration::days(i as i64),
                open: close - 0.3 * (t / 3.0).sin(),
                high: close + range,
                low: close - range,
                close,
                volume: 1000.0 + 900.0 * (t / 7.0).cos().abs() + if i % 17 == 0 { 3000.0 } else { 0.0 },
            }
        })
        .collect()
}

/// Default config with commission and slippage switched off.
pub fn frictionless_config() -> BacktestConfig {
    BacktestConfig {
        symbol: "TEST".to_string(),
        initial_capital: 100_000.0,
        execution: ExecutionConfig {
            commission: 0.0,
            slippage: 0.0,
            ..ExecutionConfig::default()
        },
        max_holding_bars: None,
    }
}

pub fn write_csv(dir: &std::path::Path, symbol: &str, bars: &[OhlcvBar]) -> std::path::PathBuf {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for bar in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume
        ));
    }
    let path = dir.join(format!("{}.csv", symbol));
    std::fs::write(&path, content).unwrap();
    path
}
