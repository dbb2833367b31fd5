//! On-disk series store.
//!
//! Layout: `{data_dir}/{id}.csv`, header `date,value`, dates `YYYY-MM-DD`.
//! - Atomic writes (write to `.csv.tmp`, rename into place)
//! - Corrupt files are moved to `{id}.csv.quarantined` and read as empty

use chrono::NaiveDate;
use fundwatch_core::error::StoreError;
use fundwatch_core::types::{InstrumentId, InstrumentSeries, MergeSummary, SeriesPoint};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One persisted row.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRow {
    date: NaiveDate,
    value: f64,
}

/// Per-instrument CSV files under a single directory.
///
/// Each instrument owns its own file, so concurrent tasks working on
/// different instruments never touch the same path.
#[derive(Debug, Clone)]
pub struct LocalSeriesStore {
    data_dir: PathBuf,
}

impl LocalSeriesStore {
    /// Create a store rooted at `data_dir`. The directory is created on first write.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the series file for `id`.
    pub fn path_for(&self, id: &InstrumentId) -> PathBuf {
        self.data_dir.join(format!("{id}.csv"))
    }

    /// Read the full history of `id`.
    ///
    /// A missing file yields an empty series. A file that cannot be parsed is
    /// quarantined and also yields an empty series.
    pub fn read(&self, id: &InstrumentId) -> Result<InstrumentSeries, StoreError> {
        let path = self.path_for(id);
        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(InstrumentSeries::new());
            }
            Err(e) => return Err(StoreError::Io { path, source: e }),
        };

        match parse_rows(file, &path) {
            Ok(points) => Ok(InstrumentSeries::from_points(points)),
            Err(corrupt) => {
                self.quarantine(&path, &corrupt)?;
                Ok(InstrumentSeries::new())
            }
        }
    }

    /// Date of the newest stored point.
    pub fn latest_date(&self, id: &InstrumentId) -> Result<Option<NaiveDate>, StoreError> {
        Ok(self.read(id)?.latest_date())
    }

    /// Merge `points` into the stored history and rewrite the file.
    ///
    /// Non-finite points are rejected, existing dates take the incoming value.
    /// Merging the same points twice leaves the file unchanged.
    pub fn merge_append(
        &self,
        id: &InstrumentId,
        points: impl IntoIterator<Item = SeriesPoint>,
    ) -> Result<MergeSummary, StoreError> {
        let mut series = self.read(id)?;
        let summary = series.merge(points);

        if summary.rejected > 0 {
            warn!(code = %id, rejected = summary.rejected, "Dropped non-finite points");
        }
        if summary.added == 0 && summary.updated == 0 {
            debug!(code = %id, "Nothing new to persist");
            return Ok(summary);
        }

        self.write(id, &series)?;
        debug!(
            code = %id,
            added = summary.added,
            updated = summary.updated,
            total = summary.total,
            "Persisted series"
        );
        Ok(summary)
    }

    /// Instruments that currently have a series file, sorted.
    pub fn instruments(&self) -> Result<Vec<InstrumentId>, StoreError> {
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::Io {
                    path: self.data_dir.clone(),
                    source: e,
                })
            }
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::Io {
                path: self.data_dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            // Skip .tmp, .quarantined and foreign files
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| InstrumentId::parse(s).ok())
            {
                ids.push(id);
            }
        }
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    fn write(&self, id: &InstrumentId, series: &InstrumentSeries) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir).map_err(|e| StoreError::Io {
            path: self.data_dir.clone(),
            source: e,
        })?;

        let path = self.path_for(id);
        let tmp_path = path.with_extension("csv.tmp");

        if let Err(reason) = write_rows(&tmp_path, series.points()) {
            let _ = fs::remove_file(&tmp_path);
            return Err(StoreError::Write { path, reason });
        }

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            StoreError::Write {
                path: path.clone(),
                reason: format!("atomic rename failed: {e}"),
            }
        })
    }

    fn quarantine(&self, path: &Path, corrupt: &StoreError) -> Result<(), StoreError> {
        let quarantine = path.with_extension("csv.quarantined");
        warn!(error = %corrupt, "Quarantining corrupt series file");
        fs::rename(path, &quarantine).map_err(|e| StoreError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

fn parse_rows(file: fs::File, path: &Path) -> Result<Vec<SeriesPoint>, StoreError> {
    let corrupt = |reason: String| StoreError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut points = Vec::new();
    for (line, result) in reader.deserialize::<StoredRow>().enumerate() {
        let row = result.map_err(|e| corrupt(format!("row {}: {e}", line + 1)))?;
        if !row.value.is_finite() {
            return Err(corrupt(format!("row {}: non-finite value", line + 1)));
        }
        points.push(SeriesPoint::new(row.date, row.value));
    }
    Ok(points)
}

fn write_rows(path: &Path, points: &[SeriesPoint]) -> Result<(), String> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| e.to_string())?;
    for point in points {
        writer
            .serialize(StoredRow {
                date: point.date,
                value: point.value,
            })
            .map_err(|e| e.to_string())?;
    }
    writer.flush().map_err(|e| e.to_string())
}
