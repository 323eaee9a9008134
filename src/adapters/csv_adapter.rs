//! CSV file data adapter.
//!
//! One file per symbol, `{base_path}/{SYMBOL}.csv`, with the header
//! `date,open,high,low,close,volume` and dates as `%Y-%m-%d`.

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use csv::StringRecord;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    /// Read every bar in `path`, sorted by date. Rows with a non-finite
    /// price are skipped.
    pub fn read_file(path: &Path) -> Result<Vec<OhlcvBar>, SigtraderError> {
        let content = fs::read_to_string(path).map_err(|e| SigtraderError::DataLoad {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        let mut bars = parse_bars(&content)?;
        bars.sort_by_key(|b| b.date);
        debug!("Read {} bars from {}", bars.len(), path.display());
        Ok(bars)
    }
}

fn parse_bars(content: &str) -> Result<Vec<OhlcvBar>, SigtraderError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut bars = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| SigtraderError::DataLoad {
            reason: format!("CSV parse error: {}", e),
        })?;

        let date_str = column(&record, 0, "date")?;
        let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
            SigtraderError::DataLoad {
                reason: format!("invalid date '{}' on line {}: {}", date_str, line(&record), e),
            }
        })?;

        let bar = OhlcvBar {
            date,
            open: number(&record, 1, "open")?,
            high: number(&record, 2, "high")?,
            low: number(&record, 3, "low")?,
            close: number(&record, 4, "close")?,
            volume: number(&record, 5, "volume")?,
        };
        if [bar.open, bar.high, bar.low, bar.close].iter().any(|v| !v.is_finite()) {
            warn!("Skipping {} on line {}: non-finite price", bar.date, line(&record));
            continue;
        }
        bars.push(bar);
    }
    Ok(bars)
}

/// 1-based file line of `record`; the header is line 1.
fn line(record: &StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

fn column<'r>(record: &'r StringRecord, index: usize, name: &str) -> Result<&'r str, SigtraderError> {
    record.get(index).ok_or_else(|| SigtraderError::DataLoad {
        reason: format!("missing {} column on line {}", name, line(record)),
    })
}

fn number(record: &StringRecord, index: usize, name: &str) -> Result<f64, SigtraderError> {
    let raw = column(record, index, name)?;
    raw.trim().parse().map_err(|e| SigtraderError::DataLoad {
        reason: format!("invalid {} value '{}' on line {}: {}", name, raw, line(record), e),
    })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<OhlcvBar>, SigtraderError> {
        let bars = Self::read_file(&self.csv_path(symbol))?;
        if bars.is_empty() {
            return Err(SigtraderError::NoData {
                symbol: symbol.to_string(),
            });
        }
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SigtraderError::DataLoad {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SigtraderError::DataLoad {
                reason: format!("directory entry error: {}", e),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
