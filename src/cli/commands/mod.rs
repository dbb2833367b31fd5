//! CLI command implementations.

pub mod backtest;
pub mod monitor;
pub mod validate;
