//! Configuration management.

mod settings;

pub use settings::{
    AppConfig, AppSettings, DataSettings, FetchSettings, LoggingConfig, RiskSettings,
    SchedulerSettings, SyncSettings,
};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;

/// Environment variable prefix, e.g. `FUNDWATCH__SCHEDULER__POOL_SIZE=8`.
pub const ENV_PREFIX: &str = "FUNDWATCH";

/// Load configuration from file and environment.
///
/// A missing file is only an error when `required` is set; every section
/// falls back to its defaults.
pub fn load_config(path: &Path, required: bool) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    config.try_deserialize()
}
