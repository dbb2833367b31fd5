//! Monitor command implementation.

use anyhow::{Context, Result};
use fundwatch_config::AppConfig;
use fundwatch_core::types::InstrumentId;
use fundwatch_data::{
    load_codes_from_csv, normalize_codes, CsvDirectorySource, EastmoneySource, FallbackSource,
    LocalSeriesStore, PolicyClock, RetryPolicy, RetryingSource, SyncCoordinator,
};
use fundwatch_indicators::IndicatorEngine;
use fundwatch_monitor::{assess_market, ConcurrentScheduler, InstrumentPipeline};
use fundwatch_signals::SignalEngine;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cli::MonitorArgs;

pub async fn run(args: MonitorArgs, config: &AppConfig) -> Result<()> {
    let ids = resolve_codes(&args)?;
    if ids.is_empty() {
        anyhow::bail!("No fund codes given; use --codes 110011,161725 or --codes-file funds.csv");
    }

    let remote = EastmoneySource::new(config.eastmoney_config())
        .context("Failed to build HTTP client")?;
    let mut source = FallbackSource::new().with_source(RetryingSource::new(
        remote,
        config.retry_policy(),
        config.fetch.max_pages,
    ));
    if let Some(dir) = args.offline_dir.as_ref().or(config.data.offline_dir.as_ref()) {
        info!(dir = %dir.display(), "Offline exports enabled as fallback source");
        source = source.with_source(RetryingSource::new(
            CsvDirectorySource::new(dir, config.data.value_field),
            RetryPolicy::none(),
            1,
        ));
    }

    let source = Arc::new(source);
    let clock = PolicyClock::system(config.publication_policy()?);

    // One benchmark reading shared by the whole run
    let market = assess_market(
        source.as_ref(),
        &config.market,
        clock.expected_latest_available_date(),
    )
    .await;

    let sync = SyncCoordinator::new(
        LocalSeriesStore::new(&config.data.data_dir),
        source,
        clock,
        config.sync_config(),
    );
    let pipeline = Arc::new(InstrumentPipeline::new(
        sync,
        IndicatorEngine::new(config.indicators.clone()),
        SignalEngine::new(config.signals.clone()),
        config.risk.risk_free_rate,
    ));

    let scheduler = ConcurrentScheduler::new(config.scheduler_config());
    let cancel = scheduler.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight funds");
            cancel.cancel();
        }
    });

    info!(funds = ids.len(), data_dir = %config.data.data_dir.display(), "Starting monitor run");
    let report = scheduler.run(pipeline, ids).await.with_market(market);

    println!("{}", report.summary());

    if let Some(path) = &args.output {
        report
            .write_csv_file(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "Report saved");
    }

    Ok(())
}

/// Codes from `--codes-file` followed by `--codes`, de-duplicated and limited.
fn resolve_codes(args: &MonitorArgs) -> Result<Vec<InstrumentId>> {
    let mut raw: Vec<String> = Vec::new();

    if let Some(path) = &args.codes_file {
        let from_file = load_codes_from_csv(path, &args.code_column, None)
            .with_context(|| format!("Failed to read codes from {}", path.display()))?;
        raw.extend(from_file.into_iter().map(|id| id.as_str().to_string()));
    }
    if let Some(list) = &args.codes {
        raw.extend(list.split(',').map(str::to_string));
    }

    Ok(normalize_codes(raw, args.max_funds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundwatch_data::DEFAULT_CODE_COLUMN;
    use std::path::PathBuf;

    fn args(codes: Option<&str>, codes_file: Option<PathBuf>, max: Option<usize>) -> MonitorArgs {
        MonitorArgs {
            codes: codes.map(str::to_string),
            codes_file,
            code_column: DEFAULT_CODE_COLUMN.to_string(),
            max_funds: max,
            output: None,
            offline_dir: None,
        }
    }

    #[test]
    fn test_resolve_codes_merges_file_and_list() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("funds.csv");
        std::fs::write(&file, "代码,名称\n110011,易方达\n161725,招商\n").unwrap();

        let ids = resolve_codes(&args(Some("1,110011"), Some(file), None)).unwrap();
        let codes: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(codes, vec!["110011", "161725", "000001"]);
    }

    #[test]
    fn test_resolve_codes_respects_max() {
        let ids = resolve_codes(&args(Some("1,2,3,4"), None, Some(2))).unwrap();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_missing_codes_file_is_an_error() {
        let missing = PathBuf::from("/nonexistent/funds.csv");
        assert!(resolve_codes(&args(None, Some(missing), None)).is_err());
    }
}
