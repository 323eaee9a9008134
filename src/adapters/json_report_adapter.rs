//! JSON report adapter implementing ReportPort.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;

use crate::domain::error::SigtraderError;
use crate::domain::metrics::BacktestReport;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReportAdapter {
    pretty: bool,
}

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        JsonReportAdapter { pretty: true }
    }

    /// Serialize `report` to `out`.
    pub fn write_to<W: Write>(&self, report: &BacktestReport, out: W) -> Result<(), SigtraderError> {
        if self.pretty {
            serde_json::to_writer_pretty(out, report)?;
        } else {
            serde_json::to_writer(out, report)?;
        }
        Ok(())
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, report: &BacktestReport, output_path: &Path) -> Result<(), SigtraderError> {
        let mut out = BufWriter::new(File::create(output_path)?);
        self.write_to(report, &mut out)?;
        out.flush()?;
        info!("Report written to {}", output_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::{BacktestConfig, BacktestEngine};
    use crate::domain::ohlcv::OhlcvBar;
    use crate::domain::signal::Signal;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample_report() -> BacktestReport {
        let bars: Vec<OhlcvBar> = [100.0, 102.0, 104.0]
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: NaiveDate::from_ymd_opt(2024, 3, (i + 1) as u32).unwrap(),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000.0,
            })
            .collect();
        let signals = [Signal::Buy, Signal::Hold, Signal::Hold];
        let mut engine = BacktestEngine::new(BacktestConfig {
            symbol: "BHP".to_string(),
            ..BacktestConfig::default()
        });
        engine.run(&bars, &signals, &[f64::NAN; 3]).unwrap()
    }

    #[test]
    fn writes_readable_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let report = sample_report();

        JsonReportAdapter::pretty().write(&report, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["symbol"], "BHP");
        assert_eq!(value["trades"][0]["action"], "OPEN_LONG");
        assert_eq!(value["trades"][1]["reason"], "backtest_end");
        assert_eq!(value["equity_curve"].as_array().unwrap().len(), 3);
        // a single winning trade: no losses, infinite profit factor
        assert!(value["summary"]["profit_factor"].is_null());

        let back: BacktestReport = serde_json::from_str(&text).unwrap();
        assert!(back.summary.profit_factor.is_infinite());
        assert_eq!(back.trades, report.trades);
        assert_eq!(back.equity_curve, report.equity_curve);
        assert_eq!(back.daily_returns, report.daily_returns);
    }

    #[test]
    fn awkward_floats_read_back_bit_identical() {
        let mut report = sample_report();
        report.trades[1].pnl = Some(397.959999999999);
        report.trades[1].capital_after = 100_397.95999999999;
        report.daily_returns = vec![0.0, 0.1 + 0.2, 1.0 / 3.0];

        let mut buf = Vec::new();
        JsonReportAdapter::new().write_to(&report, &mut buf).unwrap();
        let back: BacktestReport = serde_json::from_slice(&buf).unwrap();

        assert_eq!(back.trades, report.trades);
        for (a, b) in back.daily_returns.iter().zip(&report.daily_returns) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn compact_output_is_single_line() {
        let mut buf = Vec::new();
        JsonReportAdapter::new()
            .write_to(&sample_report(), &mut buf)
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(!text.contains('\n'));
    }

    #[test]
    fn unwritable_path_is_io_error() {
        let err = JsonReportAdapter::new()
            .write(&sample_report(), Path::new("/nonexistent/dir/report.json"))
            .unwrap_err();
        assert!(matches!(err, SigtraderError::Io(_)));
    }
}
