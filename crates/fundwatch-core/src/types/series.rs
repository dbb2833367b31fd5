//! Dated value series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single dated observation (NAV or price).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Publication date
    pub date: NaiveDate,
    /// Observed value
    pub value: f64,
}

impl SeriesPoint {
    /// Create a new point.
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }

    /// Only finite values may be stored.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.value.is_finite()
    }
}

/// Counts produced by a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
    /// Dates not previously present
    pub added: usize,
    /// Existing dates whose value changed
    pub updated: usize,
    /// Incoming points dropped for non-finite values
    pub rejected: usize,
    /// Series length after the merge
    pub total: usize,
}

/// Ascending, date-unique series for one instrument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSeries {
    points: Vec<SeriesPoint>,
}

impl InstrumentSeries {
    /// Create an empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from unordered points, dropping invalid ones.
    /// Later duplicates of a date win.
    pub fn from_points(points: impl IntoIterator<Item = SeriesPoint>) -> Self {
        let mut series = Self::new();
        series.merge(points);
        series
    }

    /// Merge points by date: new values replace existing ones, the result stays sorted.
    pub fn merge(&mut self, incoming: impl IntoIterator<Item = SeriesPoint>) -> MergeSummary {
        let mut by_date: BTreeMap<NaiveDate, f64> =
            self.points.iter().map(|p| (p.date, p.value)).collect();
        let mut summary = MergeSummary::default();

        // Later duplicates within one batch win before comparing with stored values
        let mut batch: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for point in incoming {
            if !point.is_valid() {
                summary.rejected += 1;
                continue;
            }
            batch.insert(point.date, point.value);
        }

        for (date, value) in batch {
            match by_date.insert(date, value) {
                None => summary.added += 1,
                Some(old) if old != value => summary.updated += 1,
                Some(_) => {}
            }
        }

        self.points = by_date
            .into_iter()
            .map(|(date, value)| SeriesPoint { date, value })
            .collect();
        summary.total = self.points.len();
        summary
    }

    /// Get the number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the series is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points, oldest first.
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    /// The most recent `n` points.
    pub fn trailing(&self, n: usize) -> &[SeriesPoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }

    /// Get the last point.
    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    /// Date of the most recent point.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Extract values as a vector.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Get an iterator over the points.
    pub fn iter(&self) -> impl Iterator<Item = &SeriesPoint> {
        self.points.iter()
    }
}

impl FromIterator<SeriesPoint> for InstrumentSeries {
    fn from_iter<T: IntoIterator<Item = SeriesPoint>>(iter: T) -> Self {
        Self::from_points(iter)
    }
}
