//! Per-instrument pipeline: sync, read, indicators, signal, risk.

use async_trait::async_trait;
use fundwatch_core::error::SyncError;
use fundwatch_core::types::{InstrumentId, SyncSource};
use fundwatch_data::SyncCoordinator;
use fundwatch_indicators::{IndicatorEngine, RiskProfile};
use fundwatch_signals::SignalEngine;
use tracing::{debug, warn};

use crate::report::{InstrumentReport, InstrumentStatus};

/// Unit of work the scheduler runs once per instrument.
///
/// Implementations convert their own failures into a report; the scheduler
/// only handles panics and timeouts.
#[async_trait]
pub trait InstrumentProcessor: Send + Sync + 'static {
    async fn process(&self, id: &InstrumentId) -> InstrumentReport;
}

/// Sync followed by analysis of the trailing window.
pub struct InstrumentPipeline {
    sync: SyncCoordinator,
    indicators: IndicatorEngine,
    signals: SignalEngine,
    risk_free_rate: f64,
}

impl InstrumentPipeline {
    pub fn new(
        sync: SyncCoordinator,
        indicators: IndicatorEngine,
        signals: SignalEngine,
        risk_free_rate: f64,
    ) -> Self {
        Self {
            sync,
            indicators,
            signals,
            risk_free_rate,
        }
    }
}

#[async_trait]
impl InstrumentProcessor for InstrumentPipeline {
    async fn process(&self, id: &InstrumentId) -> InstrumentReport {
        let outcome = match self.sync.sync(id).await {
            Ok(outcome) => outcome,
            Err(SyncError::FetchFailed { cause, .. }) => {
                warn!(code = %id, error = %cause, "Fetch failed and no local history");
                return InstrumentReport::failed(id.clone(), cause.to_string());
            }
            Err(e) => {
                warn!(code = %id, error = %e, "Sync failed");
                return InstrumentReport::failed(id.clone(), e.to_string());
            }
        };

        let series = match self.sync.store().read(id) {
            Ok(series) => series,
            Err(e) => {
                warn!(code = %id, error = %e, "Reading synced series failed");
                return InstrumentReport::failed(id.clone(), e.to_string());
            }
        };

        if series.is_empty() {
            let mut report = InstrumentReport::unanalyzed(
                id.clone(),
                InstrumentStatus::NoData,
                "remote returned no history",
            );
            report.sync = Some(outcome);
            return report;
        }

        let window = series.trailing(self.indicators.config().trailing_window);
        let snapshot = self.indicators.snapshot(window);
        let signal = self.signals.evaluate(id.clone(), snapshot);
        let values: Vec<f64> = window.iter().map(|p| p.value).collect();
        let risk = RiskProfile::from_values(&values, self.risk_free_rate);

        let (status, detail) = match outcome.source {
            SyncSource::CacheFallback => (
                InstrumentStatus::Stale,
                Some("remote unavailable, analyzed local history".to_string()),
            ),
            SyncSource::Cache | SyncSource::Remote => (InstrumentStatus::Ok, None),
        };

        debug!(
            code = %id,
            rows = series.len(),
            action = %signal.action,
            advisory = %signal.advisory,
            "Analyzed"
        );

        InstrumentReport {
            status,
            latest_date: series.latest_date(),
            sync: Some(outcome),
            signal,
            risk,
            detail,
        }
    }
}
