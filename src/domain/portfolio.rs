//! Portfolio state: cash, positions, trade log and equity tracking.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::position::{CloseReason, Direction, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeAction {
    OpenLong,
    OpenShort,
    CloseLong,
    CloseShort,
}

impl TradeAction {
    pub fn open(direction: Direction) -> Self {
        match direction {
            Direction::Long => TradeAction::OpenLong,
            Direction::Short => TradeAction::OpenShort,
        }
    }

    pub fn close(direction: Direction) -> Self {
        match direction {
            Direction::Long => TradeAction::CloseLong,
            Direction::Short => TradeAction::CloseShort,
        }
    }

    pub fn is_close(self) -> bool {
        matches!(self, TradeAction::CloseLong | TradeAction::CloseShort)
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradeAction::OpenLong => "OPEN_LONG",
            TradeAction::OpenShort => "OPEN_SHORT",
            TradeAction::CloseLong => "CLOSE_LONG",
            TradeAction::CloseShort => "CLOSE_SHORT",
        };
        write!(f, "{}", s)
    }
}

/// One append-only trade log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub symbol: String,
    pub position_id: usize,
    pub action: TradeAction,
    pub price: f64,
    pub size: f64,
    pub commission: f64,
    pub pnl: Option<f64>,
    /// Cash after this trade. Positions are carried on margin: an open pays
    /// only its commission and a close settles `pnl - commission`, so the
    /// notional never leaves cash.
    pub capital_after: f64,
    pub reason: Option<CloseReason>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub portfolio_value: f64,
    pub cash_capital: f64,
    pub unrealized_pnl: f64,
    pub open_positions: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub open_positions: Vec<Position>,
    pub closed_positions: Vec<Position>,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
    pub daily_returns: Vec<f64>,
    next_id: usize,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            open_positions: Vec::new(),
            closed_positions: Vec::new(),
            trades: Vec::new(),
            equity_curve: Vec::new(),
            daily_returns: Vec::new(),
            next_id: 0,
        }
    }

    /// Reserve the id for the next position.
    pub fn next_position_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// True when `id` was handed out by this portfolio.
    pub fn knows_position(&self, id: usize) -> bool {
        id < self.next_id
    }

    pub fn add_position(&mut self, position: Position) {
        self.open_positions.push(position);
    }

    pub fn open_position_on(&self, direction: Direction) -> Option<&Position> {
        self.open_positions.iter().find(|p| p.direction == direction)
    }

    pub fn has_position(&self, direction: Direction) -> bool {
        self.open_position_on(direction).is_some()
    }

    /// Ids of open positions on `direction`, in opening order.
    pub fn position_ids(&self, direction: Direction) -> Vec<usize> {
        self.open_positions
            .iter()
            .filter(|p| p.direction == direction)
            .map(|p| p.id)
            .collect()
    }

    pub fn remove_position(&mut self, id: usize) -> Option<Position> {
        let index = self.open_positions.iter().position(|p| p.id == id)?;
        Some(self.open_positions.remove(index))
    }

    pub fn position_count(&self) -> usize {
        self.open_positions.len()
    }

    pub fn record_trade(&mut self, trade: TradeRecord) {
        self.trades.push(trade);
    }

    pub fn record_closed(&mut self, position: Position) {
        self.closed_positions.push(position);
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.open_positions.iter().map(|p| p.unrealized_pnl).sum()
    }

    /// cash + unrealized P&L of open positions.
    pub fn portfolio_value(&self) -> f64 {
        self.cash + self.unrealized_pnl()
    }

    /// Append the equity point for `date` and the return against the
    /// previous point (0 for the first point or a non-positive previous
    /// value).
    pub fn record_equity(&mut self, date: NaiveDate) {
        let portfolio_value = self.portfolio_value();
        let daily_return = match self.equity_curve.last() {
            Some(prev) if prev.portfolio_value > 0.0 => {
                (portfolio_value - prev.portfolio_value) / prev.portfolio_value
            }
            _ => 0.0,
        };
        self.equity_curve.push(EquityPoint {
            date,
            portfolio_value,
            cash_capital: self.cash,
            unrealized_pnl: self.unrealized_pnl(),
            open_positions: self.open_positions.len(),
        });
        self.daily_returns.push(daily_return);
    }
}
