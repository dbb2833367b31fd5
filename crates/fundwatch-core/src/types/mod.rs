//! Core data types for the fund monitoring system.

mod instrument;
mod series;
mod signal;
mod sync;

pub use instrument::InstrumentId;
pub use series::{InstrumentSeries, MergeSummary, SeriesPoint};
pub use signal::{ActionLabel, AdvisoryLabel, IndicatorSnapshot, SignalResult};
pub use sync::{FetchWindow, SyncOutcome, SyncSource};
