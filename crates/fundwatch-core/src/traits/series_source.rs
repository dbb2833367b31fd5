//! Remote series source trait definitions.

use crate::error::FetchError;
use crate::types::{InstrumentId, SeriesPoint};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Native ordering of an adapter's pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOrder {
    /// Page 0 holds the most recent rows.
    NewestFirst,
    /// Page 0 holds the oldest rows.
    OldestFirst,
}

/// One page returned by an adapter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesPage {
    /// Rows in the adapter's native order
    pub points: Vec<SeriesPoint>,
    /// Whether the adapter reports more pages
    pub has_more: bool,
}

impl SeriesPage {
    pub fn new(points: Vec<SeriesPoint>, has_more: bool) -> Self {
        Self { points, has_more }
    }

    pub fn last_page(points: Vec<SeriesPoint>) -> Self {
        Self { points, has_more: false }
    }
}

/// A vendor adapter that serves history one page at a time.
///
/// Implementations perform a single request per call; retry and pagination
/// policy live in the caller.
#[async_trait]
pub trait PagedSource: Send + Sync {
    /// Fetch one page of history.
    ///
    /// # Arguments
    /// * `instrument` - The fund code
    /// * `page_index` - Zero-based page number
    async fn fetch_page(
        &self,
        instrument: &InstrumentId,
        page_index: usize,
    ) -> Result<SeriesPage, FetchError>;

    /// Nominal number of rows per page.
    fn page_size(&self) -> usize;

    /// Native page ordering.
    fn order(&self) -> PageOrder;

    /// Get the adapter name.
    fn name(&self) -> &str;
}

/// Source of incremental history, as consumed by the sync coordinator.
#[async_trait]
pub trait SeriesSource: Send + Sync {
    /// Fetch every row strictly newer than `since` (or the full history when `None`).
    ///
    /// # Returns
    /// Rows in any order; the caller merges by date
    async fn fetch_since(
        &self,
        instrument: &InstrumentId,
        since: Option<NaiveDate>,
    ) -> Result<Vec<SeriesPoint>, FetchError>;

    /// Get the source name.
    fn name(&self) -> &str;
}
