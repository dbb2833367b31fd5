//! Sync windows and outcomes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::InstrumentId;

/// What a single sync attempt asks the remote for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchWindow {
    pub instrument_id: InstrumentId,
    /// Exclusive lower bound; `None` requests the full history.
    pub since: Option<NaiveDate>,
}

impl FetchWindow {
    pub fn full_history(instrument_id: InstrumentId) -> Self {
        Self { instrument_id, since: None }
    }

    pub fn since(instrument_id: InstrumentId, date: NaiveDate) -> Self {
        Self { instrument_id, since: Some(date) }
    }

    pub fn is_full_history(&self) -> bool {
        self.since.is_none()
    }
}

/// Where the post-sync series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncSource {
    /// Local history was current; no network access.
    Cache,
    /// The remote was queried successfully.
    Remote,
    /// The remote failed and existing local history was used.
    CacheFallback,
}

/// Successful synchronization of one instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub instrument_id: InstrumentId,
    pub rows_added: usize,
    pub final_series_length: usize,
    pub source: SyncSource,
}

impl SyncOutcome {
    /// Whether any rows are available for indicators.
    pub fn has_data(&self) -> bool {
        self.final_series_length > 0
    }
}
