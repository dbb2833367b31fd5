//! Technical indicators over fund value series.
//!
//! This crate provides the indicator engine used by the monitor and the backtester:
//! - Moving averages (SMA, EMA)
//! - Momentum indicators (RSI, MACD)
//! - Bollinger Bands
//! - Snapshot assembly with explicit "not available" results
//! - Annualized return, Sharpe ratio and drawdown of a series

pub mod momentum;
pub mod moving_average;
pub mod risk;
pub mod snapshot;
pub mod volatility;

pub use momentum::{Macd, MacdOutput, Rsi};
pub use moving_average::{Ema, EmaSeed, Sma};
pub use risk::{daily_returns, max_drawdown, RiskProfile, TRADING_DAYS};
pub use snapshot::{IndicatorConfig, IndicatorEngine};
pub use volatility::{BollingerBands, BollingerOutput};
