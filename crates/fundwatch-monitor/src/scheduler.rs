//! Bounded concurrent scheduler.
//!
//! Runs one task per instrument with at most `pool_size` in flight. Each
//! task's panic, timeout or error becomes that instrument's record and never
//! affects its siblings. Every requested id appears in the final report.

use fundwatch_core::types::InstrumentId;
use std::any::Any;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::pipeline::InstrumentProcessor;
use crate::report::{InstrumentReport, InstrumentStatus, RunReport};

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Maximum instruments processed at once
    pub pool_size: usize,
    /// Wall-clock limit for one instrument
    pub instrument_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pool_size: 5,
            instrument_timeout: Duration::from_secs(120),
        }
    }
}

/// Stops submission of further instruments. In-flight work completes.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Fan-out over instruments with a fixed-size permit pool.
pub struct ConcurrentScheduler {
    config: SchedulerConfig,
    cancel: CancelHandle,
}

impl ConcurrentScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            cancel: CancelHandle::default(),
        }
    }

    /// Handle that cancels this scheduler's runs.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Process every id and collect one record per distinct id.
    pub async fn run<P: InstrumentProcessor>(
        &self,
        processor: Arc<P>,
        ids: Vec<InstrumentId>,
    ) -> RunReport {
        let semaphore = Arc::new(Semaphore::new(self.config.pool_size.max(1)));
        let timeout = self.config.instrument_timeout;
        let mut seen = HashSet::new();
        let mut handles: Vec<(InstrumentId, JoinHandle<InstrumentReport>)> = Vec::new();
        let mut reports = BTreeMap::new();

        info!(
            instruments = ids.len(),
            pool_size = self.config.pool_size,
            "Starting run"
        );

        for id in ids {
            if !seen.insert(id.clone()) {
                continue;
            }
            if self.cancel.is_cancelled() {
                reports.insert(id.clone(), InstrumentReport::cancelled(id));
                continue;
            }

            // Waiting for a permit throttles submission
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    reports.insert(id.clone(), InstrumentReport::cancelled(id));
                    continue;
                }
            };
            if self.cancel.is_cancelled() {
                drop(permit);
                reports.insert(id.clone(), InstrumentReport::cancelled(id));
                continue;
            }

            let processor = Arc::clone(&processor);
            let task_id = id.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                match tokio::time::timeout(timeout, processor.process(&task_id)).await {
                    Ok(report) => report,
                    Err(_) => {
                        warn!(code = %task_id, timeout_secs = timeout.as_secs_f64(), "Instrument timed out");
                        InstrumentReport::unanalyzed(
                            task_id,
                            InstrumentStatus::TimedOut,
                            format!("timed out after {:.1}s", timeout.as_secs_f64()),
                        )
                    }
                }
            });
            handles.push((id, handle));
        }

        for (id, handle) in handles {
            let report = match handle.await {
                Ok(report) => report,
                Err(e) if e.is_panic() => {
                    let message = panic_message(e.into_panic());
                    error!(code = %id, panic = %message, "Instrument task panicked");
                    InstrumentReport::failed(id.clone(), format!("panic: {message}"))
                }
                Err(e) => InstrumentReport::failed(id.clone(), e.to_string()),
            };
            reports.insert(id, report);
        }

        let run = RunReport::new(reports);
        info!(
            instruments = run.len(),
            ok = run.count(InstrumentStatus::Ok),
            failed = run.count(InstrumentStatus::Failed),
            cancelled = run.count(InstrumentStatus::Cancelled),
            "Run complete"
        );
        run
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    /// Records peak concurrency; misbehaves for selected ids.
    #[derive(Default)]
    struct Recorder {
        active: AtomicUsize,
        peak: AtomicUsize,
        processed: AtomicUsize,
        cancel_after_first: Option<CancelHandle>,
    }

    #[async_trait]
    impl InstrumentProcessor for Recorder {
        async fn process(&self, id: &InstrumentId) -> InstrumentReport {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.processed.fetch_add(1, Ordering::SeqCst);
            if let Some(cancel) = &self.cancel_after_first {
                cancel.cancel();
            }

            match id.as_str() {
                "000013" => panic!("corrupt state for 000013"),
                "000014" => tokio::time::sleep(Duration::from_secs(60)).await,
                _ => tokio::time::sleep(Duration::from_millis(5)).await,
            }

            self.active.fetch_sub(1, Ordering::SeqCst);
            InstrumentReport::unanalyzed(id.clone(), InstrumentStatus::Ok, "recorded")
        }
    }

    fn ids(range: std::ops::RangeInclusive<u32>) -> Vec<InstrumentId> {
        range
            .map(|i| InstrumentId::parse(&i.to_string()).unwrap())
            .collect()
    }

    fn scheduler(pool_size: usize) -> ConcurrentScheduler {
        ConcurrentScheduler::new(SchedulerConfig {
            pool_size,
            instrument_timeout: Duration::from_millis(200),
        })
    }

    #[tokio::test]
    async fn test_every_id_reported_with_bounded_concurrency() {
        let recorder = Arc::new(Recorder::default());
        let run = scheduler(3).run(recorder.clone(), ids(1..=10)).await;

        assert_eq!(run.len(), 10);
        assert_eq!(run.count(InstrumentStatus::Ok), 10);
        assert!(recorder.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_panic_and_timeout_are_isolated() {
        let recorder = Arc::new(Recorder::default());
        let run = scheduler(4).run(recorder, ids(10..=16)).await;

        assert_eq!(run.len(), 7);
        let panicked = run.get(&InstrumentId::parse("13").unwrap()).unwrap();
        assert_eq!(panicked.status, InstrumentStatus::Failed);
        assert!(panicked.detail.as_deref().unwrap().contains("corrupt state"));

        let slow = run.get(&InstrumentId::parse("14").unwrap()).unwrap();
        assert_eq!(slow.status, InstrumentStatus::TimedOut);

        assert_eq!(run.count(InstrumentStatus::Ok), 5);
    }

    #[tokio::test]
    async fn test_duplicate_ids_processed_once() {
        let recorder = Arc::new(Recorder::default());
        let mut input = ids(1..=3);
        input.extend(ids(1..=3));
        let run = scheduler(2).run(recorder.clone(), input).await;

        assert_eq!(run.len(), 3);
        assert_eq!(recorder.processed.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cancel_stops_submission() {
        let sched = scheduler(1);
        let recorder = Arc::new(Recorder {
            cancel_after_first: Some(sched.cancel_handle()),
            ..Default::default()
        });
        let run = sched.run(recorder.clone(), ids(1..=5)).await;

        assert_eq!(run.len(), 5);
        assert_eq!(run.count(InstrumentStatus::Ok), 1);
        assert_eq!(run.count(InstrumentStatus::Cancelled), 4);
        assert_eq!(recorder.processed.load(Ordering::SeqCst), 1);
    }
}
