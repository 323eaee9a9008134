//! Position lifecycle: open → closed.
//!
//! A position is mutated every bar while open (unrealized P&L, trailing
//! stop, bars held) and frozen once closed. Closing twice is a caller bug.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ContractViolation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    StopLossTakeProfit,
    TrailingStop,
    MaxHoldingPeriod,
    SignalReversal,
    BacktestEnd,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CloseReason::StopLossTakeProfit => "stop_loss_take_profit",
            CloseReason::TrailingStop => "trailing_stop",
            CloseReason::MaxHoldingPeriod => "max_holding_period",
            CloseReason::SignalReversal => "signal_reversal",
            CloseReason::BacktestEnd => "backtest_end",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: usize,
    pub symbol: String,
    pub direction: Direction,
    pub size: f64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Current trailing stop level, when enabled.
    pub trailing_stop: Option<f64>,
    /// Fixed distance the trailing stop keeps from the best close.
    pub trailing_distance: Option<f64>,
    pub entry_commission: f64,
    pub bars_held: usize,
    pub unrealized_pnl: f64,
    pub realized_pnl: f64,
    pub exit_price: Option<f64>,
    pub exit_date: Option<NaiveDate>,
    pub close_reason: Option<CloseReason>,
    pub is_closed: bool,
}

impl Position {
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        id: usize,
        symbol: &str,
        direction: Direction,
        size: f64,
        entry_price: f64,
        entry_date: NaiveDate,
        stop_loss: f64,
        take_profit: f64,
        entry_commission: f64,
    ) -> Self {
        Position {
            id,
            symbol: symbol.to_string(),
            direction,
            size,
            entry_price,
            entry_date,
            stop_loss,
            take_profit,
            trailing_stop: None,
            trailing_distance: None,
            entry_commission,
            bars_held: 0,
            unrealized_pnl: 0.0,
            realized_pnl: 0.0,
            exit_price: None,
            exit_date: None,
            close_reason: None,
            is_closed: false,
        }
    }

    /// Enable a trailing stop `distance` away from the entry price.
    pub fn with_trailing_stop(mut self, distance: f64) -> Self {
        self.trailing_distance = Some(distance);
        self.trailing_stop = Some(self.entry_price - self.direction.sign() * distance);
        self
    }

    pub fn notional(&self, price: f64) -> f64 {
        self.size * price
    }

    /// P&L of the whole position if it were closed at `price`.
    pub fn pnl_at(&self, price: f64) -> f64 {
        self.direction.sign() * (price - self.entry_price) * self.size
    }

    /// Mark to `price` and count one more bar held.
    pub fn mark(&mut self, price: f64) {
        if self.is_closed {
            return;
        }
        self.unrealized_pnl = self.pnl_at(price);
        self.bars_held += 1;
    }

    /// Move the trailing stop toward `price`; it never loosens.
    pub fn ratchet_trailing_stop(&mut self, price: f64) {
        let (Some(stop), Some(distance)) = (self.trailing_stop, self.trailing_distance) else {
            return;
        };
        let candidate = price - self.direction.sign() * distance;
        self.trailing_stop = Some(match self.direction {
            Direction::Long => stop.max(candidate),
            Direction::Short => stop.min(candidate),
        });
    }

    pub fn should_stop_loss(&self, price: f64) -> bool {
        match self.direction {
            Direction::Long => price <= self.stop_loss,
            Direction::Short => price >= self.stop_loss,
        }
    }

    pub fn should_take_profit(&self, price: f64) -> bool {
        match self.direction {
            Direction::Long => price >= self.take_profit,
            Direction::Short => price <= self.take_profit,
        }
    }

    pub fn should_trail_out(&self, price: f64) -> bool {
        match (self.trailing_stop, self.direction) {
            (Some(stop), Direction::Long) => price <= stop,
            (Some(stop), Direction::Short) => price >= stop,
            (None, _) => false,
        }
    }

    /// First exit rule tripped at `price`, checked as stop-loss,
    /// take-profit, trailing stop, then holding period.
    pub fn exit_trigger(&self, price: f64, max_holding_bars: Option<usize>) -> Option<CloseReason> {
        if self.should_stop_loss(price) || self.should_take_profit(price) {
            return Some(CloseReason::StopLossTakeProfit);
        }
        if self.should_trail_out(price) {
            return Some(CloseReason::TrailingStop);
        }
        match max_holding_bars {
            Some(max) if self.bars_held >= max => Some(CloseReason::MaxHoldingPeriod),
            _ => None,
        }
    }

    /// Freeze the position at `exit_price` and return its realized P&L.
    pub fn close(
        &mut self,
        exit_price: f64,
        exit_date: NaiveDate,
        reason: CloseReason,
    ) -> Result<f64, ContractViolation> {
        if self.is_closed {
            return Err(ContractViolation::PositionAlreadyClosed { id: self.id });
        }
        self.realized_pnl = self.pnl_at(exit_price);
        self.unrealized_pnl = 0.0;
        self.exit_price = Some(exit_price);
        self.exit_date = Some(exit_date);
        self.close_reason = Some(reason);
        self.is_closed = true;
        Ok(self.realized_pnl)
    }
}
