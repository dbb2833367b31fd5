//! Backtest statistics.

use chrono::NaiveDate;
use fundwatch_indicators::{max_drawdown, TRADING_DAYS};
use serde::{Deserialize, Serialize};

/// A completed round trip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub entry_date: NaiveDate,
    pub entry_value: f64,
    pub exit_date: NaiveDate,
    pub exit_value: f64,
}

impl TradeRecord {
    /// Fractional return of the trade.
    pub fn return_pct(&self) -> f64 {
        self.exit_value / self.entry_value - 1.0
    }

    pub fn is_win(&self) -> bool {
        self.return_pct() > 0.0
    }
}

/// A position still held when the series ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub entry_date: NaiveDate,
    pub entry_value: f64,
    /// Mark-to-market return at the last point
    pub unrealized_return: f64,
}

/// Backtest statistics for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestStats {
    /// Completed trades, oldest first
    pub trades: Vec<TradeRecord>,
    /// Position held at the end, not counted as a trade
    pub open_position: Option<OpenPosition>,
    /// Daily equity, starting at 1.0, open positions marked to market
    pub equity_curve: Vec<(NaiveDate, f64)>,
    /// Product of (1 + trade return) minus one
    pub compound_return: f64,
    /// Largest peak-to-trough decline of the equity curve
    pub max_drawdown: f64,
    /// Share of winning trades; `None` without trades
    pub win_rate: Option<f64>,
    /// mean / std × √252 over trade returns; `None` with fewer than two trades or zero variance
    pub sharpe: Option<f64>,
    /// Points replayed
    pub points_processed: usize,
}

impl BacktestStats {
    /// Aggregate trades and the equity curve.
    pub fn from_replay(
        trades: Vec<TradeRecord>,
        open_position: Option<OpenPosition>,
        equity_curve: Vec<(NaiveDate, f64)>,
    ) -> Self {
        let returns: Vec<f64> = trades.iter().map(TradeRecord::return_pct).collect();
        let compound_return = returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0;

        let equity: Vec<f64> = equity_curve.iter().map(|(_, e)| *e).collect();
        let max_drawdown = max_drawdown(&equity).unwrap_or(0.0);

        let win_rate = if trades.is_empty() {
            None
        } else {
            Some(trades.iter().filter(|t| t.is_win()).count() as f64 / trades.len() as f64)
        };

        Self {
            points_processed: equity_curve.len(),
            sharpe: trade_sharpe(&returns),
            trades,
            open_position,
            equity_curve,
            compound_return,
            max_drawdown,
            win_rate,
        }
    }

    pub fn total_trades(&self) -> usize {
        self.trades.len()
    }
}

/// Annualized mean/std of per-trade returns, sample standard deviation.
fn trade_sharpe(returns: &[f64]) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();

    if std_dev > 0.0 && std_dev.is_finite() {
        Some(mean / std_dev * TRADING_DAYS.sqrt())
    } else {
        None
    }
}
