//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use fundwatch_data::DEFAULT_CODE_COLUMN;
use std::path::PathBuf;

/// Used when `--config` is not given; may be absent.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Parser)]
#[command(name = "fundwatch")]
#[command(author, version, about = "Fund NAV monitor with incremental sync, indicators and signals")]
pub struct Cli {
    /// Configuration file path [default: config/default.toml]
    #[arg(short, long, env = "FUNDWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level, overrides logging.level
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Config path and whether it must exist.
    pub fn config_source(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sync, analyze and report a set of funds
    Monitor(MonitorArgs),
    /// Replay the signal rules over locally stored history
    Backtest(BacktestArgs),
    /// Validate configuration
    ValidateConfig,
}

#[derive(clap::Args)]
pub struct MonitorArgs {
    /// Fund codes (comma-separated)
    #[arg(short = 'C', long)]
    pub codes: Option<String>,

    /// CSV file listing fund codes
    #[arg(long)]
    pub codes_file: Option<PathBuf>,

    /// Code column of --codes-file
    #[arg(long, default_value = DEFAULT_CODE_COLUMN)]
    pub code_column: String,

    /// Process at most this many funds
    #[arg(long)]
    pub max_funds: Option<usize>,

    /// Write the run report CSV here
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory of exported NAV files used when the remote fails
    #[arg(long)]
    pub offline_dir: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct BacktestArgs {
    /// Fund codes (comma-separated); defaults to every stored fund
    #[arg(short = 'C', long)]
    pub codes: Option<String>,

    /// Write backtest statistics CSV here
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
