//! Error types for the fund monitoring system.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum FundwatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Remote fetch errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited: retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("HTTP status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No history found: {0}")]
    NotFound(String),

    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<FetchError> },

    #[error("All sources failed: {}", .0.join("; "))]
    AllSourcesFailed(Vec<String>),
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_)
            | FetchError::RateLimited { .. }
            | FetchError::MalformedResponse(_) => true,
            FetchError::Http { status, .. } => *status >= 500 || *status == 408,
            FetchError::Parse(_)
            | FetchError::NotFound(_)
            | FetchError::RetriesExhausted { .. }
            | FetchError::AllSourcesFailed(_) => false,
        }
    }
}

/// Local series store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt series file {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Failed to write {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}

/// Per-instrument synchronization errors.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Every fetch attempt failed and there is no local history to fall back on.
    #[error("Fetch failed for {code} with no local history: {cause}")]
    FetchFailed { code: String, cause: FetchError },

    #[error("Store failure for {code}: {source}")]
    Store {
        code: String,
        #[source]
        source: StoreError,
    },
}

/// Indicator calculation errors.
#[derive(Error, Debug)]
pub enum IndicatorError {
    #[error("Insufficient data: need {required} points, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for fund monitoring operations.
pub type FundwatchResult<T> = Result<T, FundwatchError>;
