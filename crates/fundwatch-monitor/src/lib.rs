//! Monitoring runs: logging, per-instrument pipeline, market sentiment,
//! scheduling and reports.

mod logging;
mod pipeline;
mod report;
mod scheduler;
mod sentiment;

pub use logging::{setup_logging, LogGuard};
pub use pipeline::{InstrumentPipeline, InstrumentProcessor};
pub use report::{InstrumentReport, InstrumentStatus, RunReport};
pub use scheduler::{CancelHandle, ConcurrentScheduler, SchedulerConfig};
pub use sentiment::{assess_market, MarketSentiment, SentimentConfig, SentimentLabel};
