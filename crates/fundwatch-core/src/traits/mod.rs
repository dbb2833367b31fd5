//! Core traits for the fund monitoring system.

mod indicator;
mod series_source;

pub use indicator::{Indicator, MultiOutputIndicator};
pub use series_source::{PageOrder, PagedSource, SeriesPage, SeriesSource};
