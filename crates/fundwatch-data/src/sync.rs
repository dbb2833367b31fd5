//! Incremental synchronization of one instrument.
//!
//! Reconciles the local store against the remote:
//! 1. Local history that is current and long enough skips the network
//! 2. Short history triggers a full backfill, merged idempotently
//! 3. Otherwise only rows newer than the local tail are fetched and appended
//! 4. A failed fetch falls back to local history when there is any

use fundwatch_core::error::{StoreError, SyncError};
use fundwatch_core::traits::SeriesSource;
use fundwatch_core::types::{FetchWindow, InstrumentId, SyncOutcome, SyncSource};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::clock::PolicyClock;
use crate::store::LocalSeriesStore;

/// Sync tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Local rows required before the network may be skipped
    pub min_history: usize,
    /// Random delay range applied before each remote fetch
    pub jitter_min: Duration,
    pub jitter_max: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            min_history: 50,
            jitter_min: Duration::from_millis(200),
            jitter_max: Duration::from_millis(800),
        }
    }
}

impl SyncConfig {
    /// No jitter; for tests and offline runs.
    pub fn without_jitter(mut self) -> Self {
        self.jitter_min = Duration::ZERO;
        self.jitter_max = Duration::ZERO;
        self
    }
}

/// Coordinates the store, the remote source and the publication clock.
#[derive(Clone)]
pub struct SyncCoordinator {
    store: LocalSeriesStore,
    source: Arc<dyn SeriesSource>,
    clock: PolicyClock,
    config: SyncConfig,
}

impl SyncCoordinator {
    pub fn new(
        store: LocalSeriesStore,
        source: Arc<dyn SeriesSource>,
        clock: PolicyClock,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            source,
            clock,
            config,
        }
    }

    pub fn store(&self) -> &LocalSeriesStore {
        &self.store
    }

    /// Bring the local history of `id` up to date.
    pub async fn sync(&self, id: &InstrumentId) -> Result<SyncOutcome, SyncError> {
        let store_err = |source: StoreError| SyncError::Store {
            code: id.to_string(),
            source,
        };

        let existing = self.store.read(id).map_err(store_err)?;
        let latest = existing.latest_date();
        let local_len = existing.len();
        let expected = self.clock.expected_latest_available_date();
        let enough_history = local_len >= self.config.min_history;

        if enough_history && latest.is_some_and(|d| d >= expected) {
            debug!(code = %id, ?latest, %expected, "Local history is current");
            return Ok(SyncOutcome {
                instrument_id: id.clone(),
                rows_added: 0,
                final_series_length: local_len,
                source: SyncSource::Cache,
            });
        }

        let window = match latest {
            Some(date) if enough_history => FetchWindow::since(id.clone(), date),
            _ => FetchWindow::full_history(id.clone()),
        };

        self.jitter().await;
        let fetched = match self.source.fetch_since(id, window.since).await {
            Ok(points) => points,
            Err(cause) if local_len > 0 => {
                warn!(
                    code = %id,
                    source = self.source.name(),
                    error = %cause,
                    local_rows = local_len,
                    "Fetch failed, using local history"
                );
                return Ok(SyncOutcome {
                    instrument_id: id.clone(),
                    rows_added: 0,
                    final_series_length: local_len,
                    source: SyncSource::CacheFallback,
                });
            }
            Err(cause) => {
                return Err(SyncError::FetchFailed {
                    code: id.to_string(),
                    cause,
                });
            }
        };

        let incoming: Vec<_> = match window.since {
            Some(since) => fetched.into_iter().filter(|p| p.date > since).collect(),
            None => fetched,
        };
        let fetched_rows = incoming.len();
        let summary = self.store.merge_append(id, incoming).map_err(store_err)?;

        info!(
            code = %id,
            backfill = window.is_full_history(),
            fetched = fetched_rows,
            added = summary.added,
            total = summary.total,
            "Synced"
        );
        Ok(SyncOutcome {
            instrument_id: id.clone(),
            rows_added: summary.added,
            final_series_length: summary.total,
            source: SyncSource::Remote,
        })
    }

    async fn jitter(&self) {
        let (min, max) = (self.config.jitter_min, self.config.jitter_max);
        if max.is_zero() || max < min {
            return;
        }
        let delay = {
            let mut rng = rand::thread_rng();
            Duration::from_millis(rng.gen_range(min.as_millis() as u64..=max.as_millis() as u64))
        };
        tokio::time::sleep(delay).await;
    }
}
