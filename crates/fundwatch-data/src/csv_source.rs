//! CSV directory source.
//!
//! Serves vendor exports laid out as `{dir}/{id}.csv` as a single page.
//! Used as the offline fallback behind the HTTP adapter.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use fundwatch_core::error::FetchError;
use fundwatch_core::traits::{PageOrder, PagedSource, SeriesPage};
use fundwatch_core::types::{InstrumentId, SeriesPoint};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

use crate::ValueField;

/// CSV record format.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(
        alias = "Date",
        alias = "净值日期",
        alias = "FSRQ",
        alias = "timestamp",
        alias = "Timestamp"
    )]
    date: String,
    #[serde(alias = "累计净值", alias = "LJJZ", alias = "cumulative_nav", default)]
    cumulative: Option<f64>,
    #[serde(alias = "单位净值", alias = "DWJZ", alias = "nav", alias = "unit_nav", default)]
    unit: Option<f64>,
    #[serde(alias = "Value", alias = "close", alias = "Close", default)]
    value: Option<f64>,
}

impl CsvRecord {
    /// Pick the preferred column, falling back to whatever the export has.
    fn pick(&self, field: ValueField) -> Option<f64> {
        let preferred = match field {
            ValueField::Cumulative => self.cumulative.or(self.unit),
            ValueField::Unit => self.unit.or(self.cumulative),
        };
        preferred.or(self.value)
    }
}

/// Directory of per-instrument CSV exports.
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    dir: PathBuf,
    value_field: ValueField,
}

impl CsvDirectorySource {
    /// Create a new CSV directory source.
    pub fn new(dir: impl Into<PathBuf>, value_field: ValueField) -> Self {
        Self {
            dir: dir.into(),
            value_field,
        }
    }

    fn path_for(&self, id: &InstrumentId) -> PathBuf {
        self.dir.join(format!("{id}.csv"))
    }

    fn parse(&self, content: &[u8]) -> Result<Vec<SeriesPoint>, FetchError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content);

        let mut points = Vec::new();
        for result in reader.deserialize() {
            let record: CsvRecord = result.map_err(|e| FetchError::Parse(e.to_string()))?;
            let date = parse_date(&record.date)?;
            match record.pick(self.value_field) {
                Some(value) => points.push(SeriesPoint::new(date, value)),
                None => debug!(%date, "Skipping row without a value"),
            }
        }

        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}

#[async_trait]
impl PagedSource for CsvDirectorySource {
    async fn fetch_page(
        &self,
        instrument: &InstrumentId,
        _page_index: usize,
    ) -> Result<SeriesPage, FetchError> {
        let path = self.path_for(instrument);
        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FetchError::NotFound(path.display().to_string()));
            }
            Err(e) => return Err(FetchError::Network(format!("{}: {e}", path.display()))),
        };

        let points = self.parse(&content)?;
        Ok(SeriesPage::last_page(points))
    }

    /// The whole file is one page.
    fn page_size(&self) -> usize {
        usize::MAX
    }

    fn order(&self) -> PageOrder {
        PageOrder::OldestFirst
    }

    fn name(&self) -> &str {
        "csv_directory"
    }
}

/// Parse various date formats.
pub(crate) fn parse_date(date_str: &str) -> Result<NaiveDate, FetchError> {
    let formats = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d", "%m/%d/%Y", "%d-%m-%Y"];
    for format in formats {
        if let Ok(d) = NaiveDate::parse_from_str(date_str, format) {
            return Ok(d);
        }
    }

    let datetime_formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    for format in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(dt.date());
        }
    }

    // Unix timestamp, milliseconds if > 10 digits
    if let Ok(ts) = date_str.parse::<i64>() {
        let millis = if ts > 10_000_000_000 { ts } else { ts * 1000 };
        if let Some(dt) = DateTime::from_timestamp_millis(millis) {
            return Ok(dt.date_naive());
        }
    }

    Err(FetchError::Parse(format!("Could not parse date: {date_str}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn id(code: &str) -> InstrumentId {
        InstrumentId::parse(code).unwrap()
    }

    #[test]
    fn test_parse_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(parse_date("2024-01-15").unwrap(), expected);
        assert_eq!(parse_date("2024/01/15").unwrap(), expected);
        assert_eq!(parse_date("20240115").unwrap(), expected);
        assert_eq!(parse_date("2024-01-15 10:30:00").unwrap(), expected);
        assert_eq!(parse_date("1705312800000").unwrap(), expected); // Unix ms
        assert_eq!(parse_date("1705312800").unwrap(), expected); // Unix sec
        assert!(parse_date("yesterday").is_err());
    }

    #[tokio::test]
    async fn test_reads_vendor_export() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("161725.csv"),
            "净值日期,单位净值,累计净值\n2024-01-03,1.10,2.10\n2024-01-02,1.00,2.00\n",
        )
        .unwrap();

        let source = CsvDirectorySource::new(dir.path(), ValueField::Cumulative);
        let page = source.fetch_page(&id("161725"), 0).await.unwrap();
        assert!(!page.has_more);
        assert_eq!(page.points.len(), 2);
        assert_eq!(page.points[0].value, 2.00);
        assert_eq!(page.points[1].value, 2.10);

        let source = CsvDirectorySource::new(dir.path(), ValueField::Unit);
        let page = source.fetch_page(&id("161725"), 0).await.unwrap();
        assert_eq!(page.points[1].value, 1.10);
    }

    #[tokio::test]
    async fn test_plain_value_column() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("000001.csv"), "date,value\n2024-01-02,1.5\n").unwrap();

        let source = CsvDirectorySource::new(dir.path(), ValueField::Cumulative);
        let page = source.fetch_page(&id("1"), 0).await.unwrap();
        assert_eq!(page.points, vec![SeriesPoint::new(
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            1.5
        )]);
    }

    #[tokio::test]
    async fn test_missing_file_not_found() {
        let dir = TempDir::new().unwrap();
        let source = CsvDirectorySource::new(dir.path(), ValueField::Cumulative);
        let err = source.fetch_page(&id("7"), 0).await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound(_)));
    }
}
