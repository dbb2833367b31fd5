//! Backtest command implementation.

use anyhow::{Context, Result};
use fundwatch_backtest::BacktestEngine;
use fundwatch_config::AppConfig;
use fundwatch_data::{parse_code_list, LocalSeriesStore};
use fundwatch_indicators::IndicatorEngine;
use fundwatch_signals::SignalEngine;
use tracing::info;

use crate::cli::BacktestArgs;

pub fn run(args: BacktestArgs, config: &AppConfig) -> Result<()> {
    let store = LocalSeriesStore::new(&config.data.data_dir);
    let ids = match &args.codes {
        Some(list) => parse_code_list(list, None),
        None => store
            .instruments()
            .with_context(|| format!("Failed to list {}", store.data_dir().display()))?,
    };
    if ids.is_empty() {
        anyhow::bail!(
            "No funds to backtest in '{}'. Run `fundwatch monitor` first or pass --codes",
            store.data_dir().display()
        );
    }

    info!(funds = ids.len(), "Starting backtest");
    let engine = BacktestEngine::new(
        config.backtest.clone(),
        IndicatorEngine::new(config.indicators.clone()),
        SignalEngine::new(config.signals.clone()),
    );
    let report = engine.run_store(&store, &ids);

    println!("{}", report.summary());

    if let Some(path) = &args.output {
        report
            .write_csv_file(path)
            .with_context(|| format!("Failed to write results to {}", path.display()))?;
        info!(path = %path.display(), "Results saved");
    }

    Ok(())
}
