//! Run report: per-instrument records, deterministic ordering, CSV output.

use chrono::NaiveDate;
use fundwatch_core::error::FundwatchError;
use fundwatch_core::types::{InstrumentId, SignalResult, SyncOutcome};
use fundwatch_indicators::RiskProfile;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::io::Write;
use std::path::Path;

use crate::sentiment::MarketSentiment;

/// Final state of one instrument in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentStatus {
    /// Synced and analyzed
    Ok,
    /// Analyzed from local history after the remote failed
    Stale,
    /// No history locally or remotely
    NoData,
    /// Pipeline error or panic
    Failed,
    /// Exceeded the per-instrument time limit
    TimedOut,
    /// Never started because the run was cancelled
    Cancelled,
}

impl InstrumentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InstrumentStatus::Ok => "ok",
            InstrumentStatus::Stale => "stale",
            InstrumentStatus::NoData => "no_data",
            InstrumentStatus::Failed => "failed",
            InstrumentStatus::TimedOut => "timed_out",
            InstrumentStatus::Cancelled => "cancelled",
        }
    }

    /// Whether indicators were computed.
    pub fn is_analyzed(self) -> bool {
        matches!(self, InstrumentStatus::Ok | InstrumentStatus::Stale)
    }
}

impl fmt::Display for InstrumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentReport {
    pub status: InstrumentStatus,
    pub sync: Option<SyncOutcome>,
    pub latest_date: Option<NaiveDate>,
    pub signal: SignalResult,
    pub risk: RiskProfile,
    /// Failure cause or other context
    pub detail: Option<String>,
}

impl InstrumentReport {
    /// Record without analysis results.
    pub fn unanalyzed(id: InstrumentId, status: InstrumentStatus, detail: impl Into<String>) -> Self {
        Self {
            status,
            sync: None,
            latest_date: None,
            signal: SignalResult::unavailable(id),
            risk: RiskProfile::default(),
            detail: Some(detail.into()),
        }
    }

    pub fn failed(id: InstrumentId, detail: impl Into<String>) -> Self {
        Self::unanalyzed(id, InstrumentStatus::Failed, detail)
    }

    pub fn cancelled(id: InstrumentId) -> Self {
        Self::unanalyzed(id, InstrumentStatus::Cancelled, "run cancelled before start")
    }

    pub fn instrument_id(&self) -> &InstrumentId {
        &self.signal.instrument_id
    }

    fn bollinger_position(&self) -> Option<&'static str> {
        let snap = &self.signal.snapshot;
        if snap.bollinger_upper.is_none() || snap.bollinger_lower.is_none() {
            return None;
        }
        Some(if snap.above_upper_band() {
            "above_upper"
        } else if snap.below_lower_band() {
            "below_lower"
        } else {
            "inside"
        })
    }

    fn to_row(&self) -> ReportRow<'_> {
        let snap = &self.signal.snapshot;
        ReportRow {
            code: self.instrument_id().as_str(),
            status: self.status.as_str(),
            latest_date: self.latest_date,
            latest_value: snap.latest_value.map(round4),
            rsi: snap.rsi.map(round2),
            ma_ratio: snap.ma_ratio.map(round4),
            macd_histogram: snap.macd_histogram.map(round6),
            bollinger_position: self.bollinger_position(),
            advisory: self.signal.advisory.as_str(),
            action: self.signal.action.as_str(),
            sharpe_ratio: self.risk.sharpe_ratio.map(round4),
            max_drawdown: self.risk.max_drawdown.map(round4),
            detail: self.detail.as_deref(),
        }
    }
}

/// One CSV line.
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    code: &'a str,
    status: &'a str,
    latest_date: Option<NaiveDate>,
    latest_value: Option<f64>,
    rsi: Option<f64>,
    ma_ratio: Option<f64>,
    macd_histogram: Option<f64>,
    bollinger_position: Option<&'static str>,
    advisory: &'a str,
    action: &'a str,
    sharpe_ratio: Option<f64>,
    max_drawdown: Option<f64>,
    detail: Option<&'a str>,
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

fn round2(v: f64) -> f64 {
    round_to(v, 2)
}

fn round4(v: f64) -> f64 {
    round_to(v, 4)
}

fn round6(v: f64) -> f64 {
    round_to(v, 6)
}

/// All instrument records of one run, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    reports: BTreeMap<InstrumentId, InstrumentReport>,
    /// Market reading assessed once for the whole run
    #[serde(default)]
    market: Option<MarketSentiment>,
}

impl RunReport {
    pub fn new(reports: BTreeMap<InstrumentId, InstrumentReport>) -> Self {
        Self {
            reports,
            market: None,
        }
    }

    pub fn with_market(mut self, market: Option<MarketSentiment>) -> Self {
        self.market = market;
        self
    }

    pub fn market(&self) -> Option<&MarketSentiment> {
        self.market.as_ref()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn get(&self, id: &InstrumentId) -> Option<&InstrumentReport> {
        self.reports.get(id)
    }

    /// Number of records with `status`.
    pub fn count(&self, status: InstrumentStatus) -> usize {
        self.reports.values().filter(|r| r.status == status).count()
    }

    /// Records ordered by action priority, then RSI ascending (missing last), then id.
    pub fn sorted(&self) -> Vec<&InstrumentReport> {
        let mut rows: Vec<&InstrumentReport> = self.reports.values().collect();
        rows.sort_by(|a, b| compare_reports(a, b));
        rows
    }

    /// Write the sorted report as CSV.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), FundwatchError> {
        let mut csv = csv::Writer::from_writer(writer);
        for report in self.sorted() {
            csv.serialize(report.to_row()).map_err(std::io::Error::from)?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Write the sorted report to a CSV file, creating parent directories.
    pub fn write_csv_file(&self, path: &Path) -> Result<(), FundwatchError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.write_csv(std::fs::File::create(path)?)
    }

    /// Plain-text table for the terminal.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        match &self.market {
            Some(market) => {
                let _ = writeln!(out, "{}\n", market.describe());
            }
            None => out.push_str("market sentiment unavailable\n\n"),
        }
        let _ = writeln!(
            out,
            "{:<8} {:<10} {:<12} {:>10} {:>7} {:>8} {:<12} {:<20}",
            "code", "status", "date", "value", "rsi", "ma", "action", "advisory"
        );
        for r in self.sorted() {
            let snap = &r.signal.snapshot;
            let _ = writeln!(
                out,
                "{:<8} {:<10} {:<12} {:>10} {:>7} {:>8} {:<12} {:<20}",
                r.instrument_id(),
                r.status,
                r.latest_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
                fmt_opt(snap.latest_value, 4),
                fmt_opt(snap.rsi, 1),
                fmt_opt(snap.ma_ratio, 3),
                r.signal.action,
                r.signal.advisory,
            );
        }
        let _ = writeln!(
            out,
            "\n{} instruments: {} ok, {} stale, {} no data, {} failed, {} timed out, {} cancelled",
            self.len(),
            self.count(InstrumentStatus::Ok),
            self.count(InstrumentStatus::Stale),
            self.count(InstrumentStatus::NoData),
            self.count(InstrumentStatus::Failed),
            self.count(InstrumentStatus::TimedOut),
            self.count(InstrumentStatus::Cancelled),
        );
        out
    }
}

fn fmt_opt(value: Option<f64>, places: usize) -> String {
    value.map_or_else(|| "-".into(), |v| format!("{v:.places$}"))
}

fn compare_reports(a: &InstrumentReport, b: &InstrumentReport) -> Ordering {
    a.signal
        .action
        .priority()
        .cmp(&b.signal.action.priority())
        .then_with(|| match (a.signal.snapshot.rsi, b.signal.snapshot.rsi) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.instrument_id().cmp(b.instrument_id()))
}
