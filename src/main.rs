//! Fund monitor CLI application.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use fundwatch_config::{load_config, AppConfig};
use fundwatch_monitor::{setup_logging, LogGuard};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config_path, required) = cli.config_source();

    if let Commands::ValidateConfig = cli.command {
        return cli::commands::validate::run(&config_path, required);
    }

    let config = load_config(&config_path, required)
        .with_context(|| format!("loading configuration from {}", config_path.display()))?;
    config.validate().context("invalid configuration")?;
    let _guard = init_logging(&cli, &config)?;

    match cli.command {
        Commands::Monitor(args) => cli::commands::monitor::run(args, &config).await,
        Commands::Backtest(args) => cli::commands::backtest::run(args, &config),
        Commands::ValidateConfig => Ok(()),
    }
}

fn init_logging(cli: &Cli, config: &AppConfig) -> Result<LogGuard> {
    let level = cli
        .log_level
        .map_or(config.logging.level.as_str(), |l| l.as_str());
    let json = cli.json_logs || config.logging.is_json();
    setup_logging(level, json, config.logging.file.as_deref()).context("setting up logging")
}
