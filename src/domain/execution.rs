//! Trade execution and fill simulation.
//!
//! Entry and exit fills with slippage, commission, position sizing and
//! protective stop placement. Capital is margin-style: opening a position
//! only deducts its commission, closing credits realized P&L minus the
//! exit commission.

use chrono::NaiveDate;
use log::{info, warn};

use super::error::ContractViolation;
use super::portfolio::{Portfolio, TradeAction, TradeRecord};
use super::position::{CloseReason, Direction, Position};

/// Fill and sizing parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    pub commission: f64,
    pub slippage: f64,
    pub position_size_pct: f64,
    pub risk_per_trade: f64,
    pub stop_atr_multiple: f64,
    pub target_atr_multiple: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub trailing_atr_multiple: Option<f64>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission: 0.0003,
            slippage: 0.0001,
            position_size_pct: 0.1,
            risk_per_trade: 0.02,
            stop_atr_multiple: 2.0,
            target_atr_multiple: 3.0,
            stop_loss_pct: 0.03,
            take_profit_pct: 0.06,
            trailing_atr_multiple: None,
        }
    }
}

/// Commission as a fixed rate on notional value.
pub fn calculate_commission(notional: f64, rate: f64) -> f64 {
    notional * rate
}

/// Buys fill above the market, sells below.
pub fn apply_slippage_buy(market_price: f64, slippage: f64) -> f64 {
    market_price * (1.0 + slippage)
}

pub fn apply_slippage_sell(market_price: f64, slippage: f64) -> f64 {
    market_price * (1.0 - slippage)
}

pub fn entry_fill(direction: Direction, market_price: f64, slippage: f64) -> f64 {
    match direction {
        Direction::Long => apply_slippage_buy(market_price, slippage),
        Direction::Short => apply_slippage_sell(market_price, slippage),
    }
}

pub fn exit_fill(direction: Direction, market_price: f64, slippage: f64) -> f64 {
    match direction {
        Direction::Long => apply_slippage_sell(market_price, slippage),
        Direction::Short => apply_slippage_buy(market_price, slippage),
    }
}

/// ATR usable for sizing and stops.
pub fn usable_atr(atr: Option<f64>) -> Option<f64> {
    atr.filter(|a| a.is_finite() && *a > 0.0)
}

/// Size from a fixed fraction of capital, capped by the ATR risk budget
/// `capital * risk_per_trade / (stop_atr_multiple * ATR)` when ATR is known.
pub fn position_size(capital: f64, price: f64, atr: Option<f64>, config: &ExecutionConfig) -> f64 {
    let by_capital = capital * config.position_size_pct / price;
    match usable_atr(atr) {
        Some(atr) => {
            let by_risk = capital * config.risk_per_trade / (config.stop_atr_multiple * atr);
            by_capital.min(by_risk)
        }
        None => by_capital,
    }
}

/// Stop-loss and take-profit around `entry_price`: ATR multiples when ATR
/// is known, fixed percentages otherwise.
pub fn protective_levels(
    direction: Direction,
    entry_price: f64,
    atr: Option<f64>,
    config: &ExecutionConfig,
) -> (f64, f64) {
    let sign = direction.sign();
    match usable_atr(atr) {
        Some(atr) => (
            entry_price - sign * config.stop_atr_multiple * atr,
            entry_price + sign * config.target_atr_multiple * atr,
        ),
        None => (
            entry_price * (1.0 - sign * config.stop_loss_pct),
            entry_price * (1.0 + sign * config.take_profit_pct),
        ),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InsufficientCapital,
    ZeroSize,
    SideAlreadyOpen,
}

/// Result of an entry attempt. A rejection leaves the portfolio untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        id: usize,
        size: f64,
        execution_price: f64,
        commission: f64,
    },
    Rejected(RejectReason),
}

impl EntryResult {
    pub fn is_entered(&self) -> bool {
        matches!(self, EntryResult::Entered { .. })
    }
}

/// Open a position at `market_price`.
///
/// 1. Reject if a position on the same side is already open
/// 2. Size from cash (and ATR) at the market price
/// 3. Fill with slippage; reject if notional + commission exceeds cash
/// 4. Deduct commission, place stops, record OPEN_* trade
#[allow(clippy::too_many_arguments)]
pub fn enter_position(
    portfolio: &mut Portfolio,
    symbol: &str,
    direction: Direction,
    market_price: f64,
    date: NaiveDate,
    atr: Option<f64>,
    config: &ExecutionConfig,
) -> EntryResult {
    if portfolio.has_position(direction) {
        return EntryResult::Rejected(RejectReason::SideAlreadyOpen);
    }

    let size = position_size(portfolio.cash, market_price, atr, config);
    if !(size.is_finite() && size > 0.0) {
        warn!("Entry rejected on {}: {} size is zero", date, direction);
        return EntryResult::Rejected(RejectReason::ZeroSize);
    }

    let execution_price = entry_fill(direction, market_price, config.slippage);
    let notional = size * execution_price;
    let commission = calculate_commission(notional, config.commission);
    let required = notional + commission;
    if required > portfolio.cash {
        warn!(
            "Entry rejected on {}: {} needs {:.2}, cash {:.2}",
            date, direction, required, portfolio.cash
        );
        return EntryResult::Rejected(RejectReason::InsufficientCapital);
    }

    portfolio.cash -= commission;

    let (stop_loss, take_profit) = protective_levels(direction, execution_price, atr, config);
    let id = portfolio.next_position_id();
    let mut position = Position::open(
        id,
        symbol,
        direction,
        size,
        execution_price,
        date,
        stop_loss,
        take_profit,
        commission,
    );
    if let (Some(multiple), Some(atr)) = (config.trailing_atr_multiple, usable_atr(atr)) {
        position = position.with_trailing_stop(multiple * atr);
    }
    portfolio.add_position(position);

    portfolio.record_trade(TradeRecord {
        date,
        symbol: symbol.to_string(),
        position_id: id,
        action: TradeAction::open(direction),
        price: execution_price,
        size,
        commission,
        pnl: None,
        capital_after: portfolio.cash,
        reason: None,
    });

    info!(
        "Opened {} #{} {} {:.4} @ {:.4} (stop {:.4}, target {:.4})",
        direction, id, symbol, size, execution_price, stop_loss, take_profit
    );

    EntryResult::Entered {
        id,
        size,
        execution_price,
        commission,
    }
}

/// Result of an exit.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitResult {
    pub id: usize,
    pub direction: Direction,
    pub size: f64,
    pub exit_price: f64,
    pub commission: f64,
    pub pnl: f64,
}

/// Close open position `id` at `market_price`.
///
/// Returns `Ok(None)` when the position was already closed, and a contract
/// violation when the id was never issued.
pub fn exit_position(
    portfolio: &mut Portfolio,
    id: usize,
    market_price: f64,
    date: NaiveDate,
    reason: CloseReason,
    config: &ExecutionConfig,
) -> Result<Option<ExitResult>, ContractViolation> {
    if !portfolio.knows_position(id) {
        return Err(ContractViolation::UnknownPosition { id });
    }
    let Some(mut position) = portfolio.remove_position(id) else {
        warn!("Position #{} is already closed", id);
        return Ok(None);
    };

    let exit_price = exit_fill(position.direction, market_price, config.slippage);
    let commission = calculate_commission(position.notional(exit_price), config.commission);
    let pnl = position.close(exit_price, date, reason)?;

    portfolio.cash += pnl - commission;

    portfolio.record_trade(TradeRecord {
        date,
        symbol: position.symbol.clone(),
        position_id: id,
        action: TradeAction::close(position.direction),
        price: exit_price,
        size: position.size,
        commission,
        pnl: Some(pnl),
        capital_after: portfolio.cash,
        reason: Some(reason),
    });

    info!(
        "Closed {} #{} {} @ {:.4}: pnl {:.2} ({})",
        position.direction, id, position.symbol, exit_price, pnl, reason
    );

    let result = ExitResult {
        id,
        direction: position.direction,
        size: position.size,
        exit_price,
        commission,
        pnl,
    };
    portfolio.record_closed(position);
    Ok(Some(result))
}
