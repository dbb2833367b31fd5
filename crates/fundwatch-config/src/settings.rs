//! Configuration structures.

use fundwatch_backtest::BacktestConfig;
use fundwatch_core::error::FundwatchError;
use fundwatch_data::{
    parse_cutoff, Backoff, EastmoneyConfig, PublicationPolicy, RetryPolicy, SyncConfig, ValueField,
};
use fundwatch_indicators::IndicatorConfig;
use fundwatch_monitor::{SchedulerConfig, SentimentConfig};
use fundwatch_signals::SignalConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub fetch: FetchSettings,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    #[serde(default)]
    pub indicators: IndicatorConfig,
    #[serde(default)]
    pub signals: SignalConfig,
    #[serde(default)]
    pub backtest: BacktestConfig,
    #[serde(default)]
    pub risk: RiskSettings,
    #[serde(default)]
    pub market: SentimentConfig,
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "fundwatch".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// Local storage settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataSettings {
    /// Directory holding one `{code}.csv` per instrument
    pub data_dir: PathBuf,
    pub value_field: ValueField,
    /// Directory of exported NAV files used when the remote fails
    pub offline_dir: Option<PathBuf>,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            value_field: ValueField::Cumulative,
            offline_dir: None,
        }
    }
}

/// Publication schedule and backfill threshold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncSettings {
    /// Local time after which today's value is expected, `HH:MM`
    pub cutoff: String,
    pub utc_offset_hours: i32,
    pub skip_weekends: bool,
    pub min_history: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            cutoff: "21:00".to_string(),
            utc_offset_hours: 8,
            skip_weekends: true,
            min_history: 50,
        }
    }
}

/// Remote fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchSettings {
    pub base_url: String,
    pub max_attempts: u32,
    pub backoff: Backoff,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub page_size: usize,
    pub max_pages: usize,
    pub request_timeout_secs: u64,
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: EastmoneyConfig::default().base_url,
            max_attempts: 3,
            backoff: Backoff::Exponential,
            base_delay_ms: 1000,
            max_delay_ms: 8000,
            page_size: 20,
            max_pages: 100,
            request_timeout_secs: 15,
            jitter_min_ms: 200,
            jitter_max_ms: 800,
        }
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerSettings {
    pub pool_size: usize,
    pub instrument_timeout_secs: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            pool_size: 5,
            instrument_timeout_secs: 120,
        }
    }
}

/// Risk metric settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiskSettings {
    /// Annual rate subtracted in the Sharpe ratio
    pub risk_free_rate: f64,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.02,
        }
    }
}

impl AppConfig {
    /// Check every section; the first problem found is returned.
    pub fn validate(&self) -> Result<(), FundwatchError> {
        if self.scheduler.pool_size == 0 {
            return Err(config_err("scheduler.pool_size must be at least 1"));
        }
        if self.scheduler.instrument_timeout_secs == 0 {
            return Err(config_err("scheduler.instrument_timeout_secs must be positive"));
        }
        if self.fetch.max_attempts == 0 {
            return Err(config_err("fetch.max_attempts must be at least 1"));
        }
        if self.fetch.page_size == 0 || self.fetch.max_pages == 0 {
            return Err(config_err("fetch.page_size and fetch.max_pages must be positive"));
        }
        if self.fetch.base_delay_ms > self.fetch.max_delay_ms {
            return Err(config_err("fetch.base_delay_ms must not exceed fetch.max_delay_ms"));
        }
        if self.fetch.jitter_min_ms > self.fetch.jitter_max_ms {
            return Err(config_err("fetch.jitter_min_ms must not exceed fetch.jitter_max_ms"));
        }
        if self.fetch.request_timeout_secs == 0 {
            return Err(config_err("fetch.request_timeout_secs must be positive"));
        }
        if !(-12..=14).contains(&self.sync.utc_offset_hours) {
            return Err(config_err("sync.utc_offset_hours must be between -12 and 14"));
        }
        parse_cutoff(&self.sync.cutoff)?;
        if self.sync.min_history == 0 {
            return Err(config_err("sync.min_history must be positive"));
        }
        if !self.risk.risk_free_rate.is_finite() {
            return Err(config_err("risk.risk_free_rate must be finite"));
        }
        if !["pretty", "json"]
            .iter()
            .any(|f| self.logging.format.eq_ignore_ascii_case(f))
        {
            return Err(config_err("logging.format must be `pretty` or `json`"));
        }
        self.indicators.validate()?;
        self.signals.validate()?;
        self.market.validate()?;
        Ok(())
    }

    pub fn publication_policy(&self) -> Result<PublicationPolicy, FundwatchError> {
        PublicationPolicy::new(
            &self.sync.cutoff,
            self.sync.utc_offset_hours,
            self.sync.skip_weekends,
        )
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            min_history: self.sync.min_history,
            jitter_min: Duration::from_millis(self.fetch.jitter_min_ms),
            jitter_max: Duration::from_millis(self.fetch.jitter_max_ms),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.fetch.max_attempts,
            base_delay: Duration::from_millis(self.fetch.base_delay_ms),
            max_delay: Duration::from_millis(self.fetch.max_delay_ms),
            backoff: self.fetch.backoff,
        }
    }

    pub fn eastmoney_config(&self) -> EastmoneyConfig {
        EastmoneyConfig {
            base_url: self.fetch.base_url.clone(),
            page_size: self.fetch.page_size,
            request_timeout: Duration::from_secs(self.fetch.request_timeout_secs),
            value_field: self.data.value_field,
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            pool_size: self.scheduler.pool_size,
            instrument_timeout: Duration::from_secs(self.scheduler.instrument_timeout_secs),
        }
    }

    /// Effective configuration rendered as TOML.
    pub fn to_toml(&self) -> Result<String, FundwatchError> {
        toml::to_string_pretty(self).map_err(|e| FundwatchError::Config(e.to_string()))
    }
}

fn config_err(message: &str) -> FundwatchError {
    FundwatchError::Config(message.to_string())
}
