//! Logging setup.

use fundwatch_core::error::FundwatchError;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Keeps the background log writer alive; drop it last.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Setup logging with the given level.
///
/// `RUST_LOG` overrides `level`. When `log_file` is set, events are also
/// appended to that file without ANSI colors.
pub fn setup_logging(
    level: &str,
    json: bool,
    log_file: Option<&Path>,
) -> Result<LogGuard, FundwatchError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(path)?);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    let result = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().pretty()).try_init()
    };
    result.map_err(|e| FundwatchError::Internal(format!("logging already initialized: {e}")))?;

    Ok(LogGuard { _file: guard })
}

fn file_appender(path: &Path) -> Result<RollingFileAppender, FundwatchError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| FundwatchError::Config(format!("invalid log file: {}", path.display())))?;

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
        .map_err(|e| FundwatchError::Config(format!("cannot open log file {}: {e}", path.display())))
}
