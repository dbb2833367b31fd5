//! Core types and traits for the fund monitoring system.
//!
//! This crate provides the foundational building blocks including:
//! - Series types (SeriesPoint, InstrumentSeries, InstrumentId)
//! - Indicator snapshots and signal labels
//! - Sync outcomes and fetch windows
//! - Core traits for indicators and remote series sources

pub mod types;
pub mod traits;
pub mod error;

pub use error::{FundwatchError, FundwatchResult};
pub use types::*;
pub use traits::*;
