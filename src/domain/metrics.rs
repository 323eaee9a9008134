//! Performance summary and the serializable backtest report.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::portfolio::{EquityPoint, Portfolio, TradeRecord};
use super::position::Position;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub initial_capital: f64,
    pub final_capital: f64,
    pub total_return: f64,
    pub annual_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    /// Mean win over mean loss; +inf (JSON `null`) when nothing lost.
    #[serde(with = "non_finite_as_null")]
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub total_commission: f64,
}

impl Summary {
    pub fn compute(
        initial_capital: f64,
        final_capital: f64,
        trades: &[TradeRecord],
        equity_curve: &[EquityPoint],
        daily_returns: &[f64],
    ) -> Self {
        let closed_pnls: Vec<f64> = trades
            .iter()
            .filter(|t| t.action.is_close())
            .map(|t| t.pnl.unwrap_or(0.0))
            .collect();

        let total_trades = closed_pnls.len();
        let wins: Vec<f64> = closed_pnls.iter().copied().filter(|&p| p > 0.0).collect();
        let losses: Vec<f64> = closed_pnls
            .iter()
            .copied()
            .filter(|&p| p < 0.0)
            .map(f64::abs)
            .collect();
        let winning_trades = wins.len();
        let losing_trades = total_trades - winning_trades;

        let win_rate = if total_trades > 0 {
            winning_trades as f64 / total_trades as f64
        } else {
            0.0
        };

        let total_return = if initial_capital > 0.0 {
            final_capital / initial_capital - 1.0
        } else {
            0.0
        };

        let (annual_return, volatility) = annualize(daily_returns);
        let sharpe_ratio = if volatility > 0.0 {
            annual_return / volatility
        } else {
            0.0
        };

        let avg_win = mean(&wins);
        let avg_loss = mean(&losses);
        let profit_factor = profit_factor(&wins, &losses);

        Summary {
            initial_capital,
            final_capital,
            total_return,
            annual_return,
            volatility,
            sharpe_ratio,
            max_drawdown: max_drawdown(equity_curve),
            total_trades,
            winning_trades,
            losing_trades,
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            largest_win: wins.iter().copied().fold(0.0, f64::max),
            largest_loss: losses.iter().copied().fold(0.0, f64::max),
            total_commission: trades.iter().map(|t| t.commission).sum(),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Mean daily return and population standard deviation, both annualized.
fn annualize(daily_returns: &[f64]) -> (f64, f64) {
    if daily_returns.is_empty() {
        return (0.0, 0.0);
    }
    let n = daily_returns.len() as f64;
    let avg = daily_returns.iter().sum::<f64>() / n;
    let variance = daily_returns.iter().map(|r| (r - avg).powi(2)).sum::<f64>() / n;
    (
        avg * TRADING_DAYS_PER_YEAR,
        variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt(),
    )
}

/// `wins` and `losses` hold absolute P&L values.
pub fn profit_factor(wins: &[f64], losses: &[f64]) -> f64 {
    match (wins.is_empty(), losses.is_empty()) {
        (true, _) => 0.0,
        (false, true) => f64::INFINITY,
        (false, false) => mean(wins) / mean(losses),
    }
}

/// Largest fractional decline from a running peak of portfolio value.
pub fn max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let Some(first) = equity_curve.first() else {
        return 0.0;
    };

    let mut peak = first.portfolio_value;
    let mut max_dd = 0.0_f64;
    for point in equity_curve {
        if point.portfolio_value > peak {
            peak = point.portfolio_value;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.portfolio_value) / peak);
        }
    }
    max_dd
}

mod non_finite_as_null {
    use super::*;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

/// Everything a run produced. Owns plain data only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub symbol: String,
    pub summary: Summary,
    pub equity_curve: Vec<EquityPoint>,
    pub daily_returns: Vec<f64>,
    pub trades: Vec<TradeRecord>,
    pub positions: Vec<Position>,
}

impl BacktestReport {
    /// Snapshot of `portfolio`: closed positions first, then any still open.
    pub fn from_portfolio(symbol: &str, portfolio: &Portfolio) -> Self {
        let summary = Summary::compute(
            portfolio.initial_capital,
            portfolio.cash,
            &portfolio.trades,
            &portfolio.equity_curve,
            &portfolio.daily_returns,
        );
        let positions = portfolio
            .closed_positions
            .iter()
            .chain(&portfolio.open_positions)
            .cloned()
            .collect();

        BacktestReport {
            symbol: symbol.to_string(),
            summary,
            equity_curve: portfolio.equity_curve.clone(),
            daily_returns: portfolio.daily_returns.clone(),
            trades: portfolio.trades.clone(),
            positions,
        }
    }
}
