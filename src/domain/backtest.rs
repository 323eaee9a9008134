//! Backtest engine and event loop.
//!
//! Each run owns its engine: capital, open positions and the trade log
//! live in the engine's [`Portfolio`] and nothing is shared between runs.
//! The loop is sequential; signals and ATR are precomputed by the caller.

use chrono::NaiveDate;
use log::{debug, info, warn};
use std::ops::ControlFlow;

use super::error::ContractViolation;
use super::execution::{enter_position, exit_position, EntryResult, ExecutionConfig, ExitResult};
use super::metrics::BacktestReport;
use super::ohlcv::{validate_series, OhlcvBar};
use super::portfolio::Portfolio;
use super::position::{CloseReason, Direction};
use super::signal::ensemble::generate_signals;
use super::signal::{EnsembleConfig, Signal};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub symbol: String,
    pub initial_capital: f64,
    pub execution: ExecutionConfig,
    pub max_holding_bars: Option<usize>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            symbol: "unknown".to_string(),
            initial_capital: 100_000.0,
            execution: ExecutionConfig::default(),
            max_holding_bars: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BacktestEngine {
    config: BacktestConfig,
    portfolio: Portfolio,
    last_bar: Option<(NaiveDate, f64)>,
    bars_processed: usize,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Self {
        let portfolio = Portfolio::new(config.initial_capital);
        BacktestEngine {
            config,
            portfolio,
            last_bar: None,
            bars_processed: 0,
        }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn bars_processed(&self) -> usize {
        self.bars_processed
    }

    pub fn open_position(
        &mut self,
        direction: Direction,
        price: f64,
        date: NaiveDate,
        atr: Option<f64>,
    ) -> EntryResult {
        enter_position(
            &mut self.portfolio,
            &self.config.symbol,
            direction,
            price,
            date,
            atr,
            &self.config.execution,
        )
    }

    /// Close position `id`; `Ok(None)` when it is already closed.
    pub fn close_position(
        &mut self,
        id: usize,
        price: f64,
        date: NaiveDate,
        reason: CloseReason,
    ) -> Result<Option<ExitResult>, ContractViolation> {
        exit_position(
            &mut self.portfolio,
            id,
            price,
            date,
            reason,
            &self.config.execution,
        )
    }

    fn close_side(
        &mut self,
        direction: Direction,
        price: f64,
        date: NaiveDate,
        reason: CloseReason,
    ) -> Result<(), ContractViolation> {
        for id in self.portfolio.position_ids(direction) {
            self.close_position(id, price, date, reason)?;
        }
        Ok(())
    }

    /// Mark every open position to `price`, then close those that trip an
    /// exit rule. Survivors ratchet their trailing stops.
    pub fn update_positions(
        &mut self,
        price: f64,
        date: NaiveDate,
    ) -> Result<Vec<ExitResult>, ContractViolation> {
        let max_holding = self.config.max_holding_bars;
        let mut triggered = Vec::new();
        for position in &mut self.portfolio.open_positions {
            position.mark(price);
            if let Some(reason) = position.exit_trigger(price, max_holding) {
                triggered.push((position.id, reason));
            }
        }

        let mut exits = Vec::with_capacity(triggered.len());
        for (id, reason) in triggered {
            if let Some(exit) = self.close_position(id, price, date, reason)? {
                exits.push(exit);
            }
        }

        for position in &mut self.portfolio.open_positions {
            position.ratchet_trailing_stop(price);
        }
        Ok(exits)
    }

    /// Advance one bar: exits, then the signal, then the equity point.
    pub fn step(
        &mut self,
        bar: &OhlcvBar,
        signal: Signal,
        atr: Option<f64>,
    ) -> Result<(), ContractViolation> {
        if let Some((last_date, _)) = self.last_bar {
            if bar.date == last_date {
                return Err(ContractViolation::DuplicateDate { date: bar.date });
            }
            if bar.date < last_date {
                return Err(ContractViolation::UnsortedSeries {
                    index: self.bars_processed,
                });
            }
        }

        let price = bar.close;
        self.update_positions(price, bar.date)?;

        let entry = if signal.is_buy() {
            Some(Direction::Long)
        } else if signal.is_sell() {
            Some(Direction::Short)
        } else {
            None
        };
        if let Some(direction) = entry {
            self.close_side(direction.opposite(), price, bar.date, CloseReason::SignalReversal)?;
            if !self.portfolio.has_position(direction) {
                self.open_position(direction, price, bar.date, atr);
            }
        }

        self.portfolio.record_equity(bar.date);
        debug!(
            "{} close {:.4} signal {} value {:.2}",
            bar.date,
            price,
            signal,
            self.portfolio.portfolio_value()
        );

        self.last_bar = Some((bar.date, price));
        self.bars_processed += 1;
        Ok(())
    }

    /// Close everything still open at the last processed bar's close.
    pub fn finish(&mut self) -> Result<(), ContractViolation> {
        let Some((date, price)) = self.last_bar else {
            return Ok(());
        };
        let ids: Vec<usize> = self.portfolio.open_positions.iter().map(|p| p.id).collect();
        for id in ids {
            self.close_position(id, price, date, CloseReason::BacktestEnd)?;
        }
        Ok(())
    }

    pub fn run(
        &mut self,
        bars: &[OhlcvBar],
        signals: &[Signal],
        atr: &[f64],
    ) -> Result<BacktestReport, ContractViolation> {
        self.run_with(bars, signals, atr, |_, _| ControlFlow::Continue(()))
    }

    /// Run the loop, asking `on_bar` before each bar whether to continue.
    /// Breaking stops the loop; open positions are closed at the last
    /// processed bar.
    pub fn run_with<F>(
        &mut self,
        bars: &[OhlcvBar],
        signals: &[Signal],
        atr: &[f64],
        mut on_bar: F,
    ) -> Result<BacktestReport, ContractViolation>
    where
        F: FnMut(usize, &OhlcvBar) -> ControlFlow<()>,
    {
        validate_series(bars)?;
        for len in [signals.len(), atr.len()] {
            if len != bars.len() {
                return Err(ContractViolation::LengthMismatch {
                    expected: bars.len(),
                    actual: len,
                });
            }
        }

        info!(
            "Starting backtest {}: {} bars, capital {:.2}",
            self.config.symbol,
            bars.len(),
            self.portfolio.cash
        );

        for (i, bar) in bars.iter().enumerate() {
            if on_bar(i, bar).is_break() {
                info!("Backtest stopped by caller before bar {}", i);
                break;
            }
            self.step(bar, signals[i], Some(atr[i]))?;
        }
        self.finish()?;

        let report = self.report();
        info!(
            "Backtest finished {}: return {:.2}%, sharpe {:.2}, max drawdown {:.2}%, win rate {:.2}%",
            self.config.symbol,
            report.summary.total_return * 100.0,
            report.summary.sharpe_ratio,
            report.summary.max_drawdown * 100.0,
            report.summary.win_rate * 100.0
        );
        Ok(report)
    }

    pub fn report(&self) -> BacktestReport {
        BacktestReport::from_portfolio(&self.config.symbol, &self.portfolio)
    }
}

/// Generate ensemble signals for `bars` and run a fresh engine over them.
pub fn run_backtest(
    bars: &[OhlcvBar],
    config: &BacktestConfig,
    ensemble: &EnsembleConfig,
) -> Result<BacktestReport, ContractViolation> {
    let mut engine = BacktestEngine::new(config.clone());
    if bars.is_empty() {
        warn!("No bars for {}: returning an empty report", config.symbol);
        return Ok(engine.report());
    }
    validate_series(bars)?;

    let result = generate_signals(bars, ensemble);
    engine.run(bars, &result.signals, &result.atr)
}
