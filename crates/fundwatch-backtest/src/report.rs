//! Backtest report generation.

use fundwatch_core::error::FundwatchError;
use fundwatch_core::types::InstrumentId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use crate::{BacktestConfig, BacktestStats};

/// Result for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentBacktest {
    Completed(BacktestStats),
    /// Not replayed, with the reason
    Skipped(String),
}

/// Complete backtest report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Configuration used
    pub config: BacktestConfig,
    /// Per-instrument results keyed by id
    pub results: BTreeMap<InstrumentId, InstrumentBacktest>,
}

#[derive(Debug, Serialize)]
struct BacktestRow<'a> {
    code: &'a str,
    trades: Option<usize>,
    compound_return: Option<f64>,
    max_drawdown: Option<f64>,
    win_rate: Option<f64>,
    sharpe: Option<f64>,
    open_position: Option<String>,
    detail: Option<&'a str>,
}

impl BacktestReport {
    pub fn new(config: BacktestConfig, results: BTreeMap<InstrumentId, InstrumentBacktest>) -> Self {
        Self { config, results }
    }

    pub fn get(&self, id: &InstrumentId) -> Option<&InstrumentBacktest> {
        self.results.get(id)
    }

    /// Completed backtests in id order.
    pub fn completed(&self) -> impl Iterator<Item = (&InstrumentId, &BacktestStats)> {
        self.results.iter().filter_map(|(id, r)| match r {
            InstrumentBacktest::Completed(stats) => Some((id, stats)),
            InstrumentBacktest::Skipped(_) => None,
        })
    }

    /// Write one CSV row per instrument.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), FundwatchError> {
        let mut csv = csv::Writer::from_writer(writer);
        for (id, result) in &self.results {
            let row = match result {
                InstrumentBacktest::Completed(stats) => BacktestRow {
                    code: id.as_str(),
                    trades: Some(stats.total_trades()),
                    compound_return: Some(round4(stats.compound_return)),
                    max_drawdown: Some(round4(stats.max_drawdown)),
                    win_rate: stats.win_rate.map(round4),
                    sharpe: stats.sharpe.map(round4),
                    open_position: stats
                        .open_position
                        .map(|p| format!("{}@{:.4}", p.entry_date, p.entry_value)),
                    detail: None,
                },
                InstrumentBacktest::Skipped(reason) => BacktestRow {
                    code: id.as_str(),
                    trades: None,
                    compound_return: None,
                    max_drawdown: None,
                    win_rate: None,
                    sharpe: None,
                    open_position: None,
                    detail: Some(reason),
                },
            };
            csv.serialize(row).map_err(std::io::Error::from)?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Write the CSV to a file, creating parent directories.
    pub fn write_csv_file(&self, path: &Path) -> Result<(), FundwatchError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.write_csv(std::fs::File::create(path)?)
    }

    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str("                     BACKTEST REPORT                        \n");
        s.push_str("═══════════════════════════════════════════════════════════\n\n");

        s.push_str("INSTRUMENTS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!(
            "  {:<8} {:>7} {:>10} {:>10} {:>9} {:>8}\n",
            "Code", "Trades", "Return", "Max DD", "Win Rate", "Sharpe"
        ));
        for (id, stats) in self.completed() {
            s.push_str(&format!(
                "  {:<8} {:>7} {:>9.2}% {:>9.2}% {:>9} {:>8}{}\n",
                id.as_str(),
                stats.total_trades(),
                stats.compound_return * 100.0,
                stats.max_drawdown * 100.0,
                stats
                    .win_rate
                    .map_or_else(|| "-".to_string(), |w| format!("{:.1}%", w * 100.0)),
                stats
                    .sharpe
                    .map_or_else(|| "-".to_string(), |v| format!("{v:.2}")),
                if stats.open_position.is_some() { "  (open)" } else { "" },
            ));
        }
        s.push('\n');

        let skipped: Vec<_> = self
            .results
            .iter()
            .filter_map(|(id, r)| match r {
                InstrumentBacktest::Skipped(reason) => Some((id, reason)),
                InstrumentBacktest::Completed(_) => None,
            })
            .collect();
        if !skipped.is_empty() {
            s.push_str("SKIPPED\n");
            s.push_str("───────────────────────────────────────────────────────────\n");
            for (id, reason) in skipped {
                s.push_str(&format!("  {:<8} {}\n", id.as_str(), reason));
            }
            s.push('\n');
        }

        let total_trades: usize = self.completed().map(|(_, st)| st.total_trades()).sum();
        s.push_str(&format!(
            "  Instruments: {}   Trades: {}   Warmup: {} points\n",
            self.results.len(),
            total_trades,
            self.config.warmup
        ));
        s.push_str("═══════════════════════════════════════════════════════════\n");

        s
    }
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}
