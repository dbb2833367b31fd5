//! Backtesting over locally stored fund history.
//!
//! Replays the signal rules point by point with a single long position,
//! entering on buy-class actions and exiting on sell-class actions.

mod engine;
mod report;
mod statistics;

pub use engine::{BacktestConfig, BacktestEngine};
pub use report::{BacktestReport, InstrumentBacktest};
pub use statistics::{BacktestStats, OpenPosition, TradeRecord};
