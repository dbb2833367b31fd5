//! Market sentiment from a benchmark series.
//!
//! Assessed once per run, before any instrument is processed, and carried
//! on the run report. A short moving average above the long one together
//! with a rising trend window reads as bullish; the mirror image reads as
//! bearish; anything else is neutral.

use chrono::{Duration, NaiveDate};
use fundwatch_core::error::FundwatchError;
use fundwatch_core::traits::{Indicator, SeriesSource};
use fundwatch_core::types::{InstrumentId, SeriesPoint};
use fundwatch_indicators::Sma;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Benchmark and windows used for the assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    pub enabled: bool,
    /// Six-digit code of the benchmark series
    pub benchmark_code: String,
    pub short_period: usize,
    pub long_period: usize,
    /// Points spanned by the trend change, inclusive of both ends
    pub trend_window: usize,
    /// Calendar days of history requested for the benchmark
    pub lookback_days: i64,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // Shanghai composite index ETF
            benchmark_code: "510210".to_string(),
            short_period: 5,
            long_period: 20,
            trend_window: 7,
            lookback_days: 60,
        }
    }
}

impl SentimentConfig {
    pub fn validate(&self) -> Result<(), FundwatchError> {
        let err = |m: &str| Err(FundwatchError::Config(m.to_string()));
        if self.short_period == 0 || self.short_period >= self.long_period {
            return err("market.short_period must be positive and below market.long_period");
        }
        if self.trend_window < 2 {
            return err("market.trend_window must be at least 2");
        }
        if self.lookback_days <= 0 {
            return err("market.lookback_days must be positive");
        }
        InstrumentId::parse(&self.benchmark_code)
            .map(|_| ())
            .map_err(|e| FundwatchError::Config(format!("market.benchmark_code: {e}")))
    }

    /// Points needed before an assessment is possible.
    pub fn required_points(&self) -> usize {
        self.long_period.max(self.trend_window)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Bullish,
    Bearish,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            SentimentLabel::Bullish => "bullish",
            SentimentLabel::Bearish => "bearish",
            SentimentLabel::Neutral => "neutral",
        }
    }

    pub fn score(self) -> i32 {
        match self {
            SentimentLabel::Bullish => 5,
            SentimentLabel::Bearish => -5,
            SentimentLabel::Neutral => 0,
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market reading shared by every instrument of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSentiment {
    pub benchmark: InstrumentId,
    /// Date of the last benchmark point used
    pub as_of: NaiveDate,
    pub label: SentimentLabel,
    pub score: i32,
    pub ma_short: f64,
    pub ma_long: f64,
    /// Fractional change across the trend window
    pub trend_change: f64,
}

impl MarketSentiment {
    /// Assess an ascending benchmark series. `None` when it is too short.
    pub fn assess(
        benchmark: InstrumentId,
        points: &[SeriesPoint],
        config: &SentimentConfig,
    ) -> Option<Self> {
        if points.len() < config.required_points() {
            return None;
        }
        let values: Vec<f64> = points.iter().map(|p| p.value).collect();
        let ma_short = Sma::new(config.short_period).latest(&values)?;
        let ma_long = Sma::new(config.long_period).latest(&values)?;

        let window = &values[values.len() - config.trend_window..];
        let first = *window.first()?;
        let last = *window.last()?;
        if first <= 0.0 {
            return None;
        }
        let trend_change = last / first - 1.0;

        let label = if ma_short > ma_long && trend_change > 0.0 {
            SentimentLabel::Bullish
        } else if ma_short < ma_long && trend_change < 0.0 {
            SentimentLabel::Bearish
        } else {
            SentimentLabel::Neutral
        };

        Some(Self {
            benchmark,
            as_of: points[points.len() - 1].date,
            label,
            score: label.score(),
            ma_short,
            ma_long,
            trend_change,
        })
    }

    /// One-line description for the terminal.
    pub fn describe(&self) -> String {
        format!(
            "market {} ({:+}) from {} as of {}: ma{:.4} vs ma{:.4}, trend {:+.2}%",
            self.label,
            self.score,
            self.benchmark,
            self.as_of,
            self.ma_short,
            self.ma_long,
            self.trend_change * 100.0
        )
    }
}

/// Fetch the benchmark and assess it. Failures are logged and yield `None`;
/// the run continues without a market reading.
pub async fn assess_market(
    source: &dyn SeriesSource,
    config: &SentimentConfig,
    as_of: NaiveDate,
) -> Option<MarketSentiment> {
    if !config.enabled {
        return None;
    }
    let benchmark = match InstrumentId::parse(&config.benchmark_code) {
        Ok(id) => id,
        Err(e) => {
            warn!(code = %config.benchmark_code, error = %e, "Invalid benchmark code");
            return None;
        }
    };

    let since = as_of - Duration::days(config.lookback_days);
    let mut points = match source.fetch_since(&benchmark, Some(since)).await {
        Ok(points) => points,
        Err(e) => {
            warn!(code = %benchmark, error = %e, "Fetching benchmark failed");
            return None;
        }
    };
    points.retain(|p| p.value.is_finite() && p.date <= as_of);
    points.sort_by_key(|p| p.date);
    points.dedup_by_key(|p| p.date);

    match MarketSentiment::assess(benchmark.clone(), &points, config) {
        Some(sentiment) => {
            info!(
                code = %benchmark,
                sentiment = %sentiment.label,
                score = sentiment.score,
                trend = sentiment.trend_change,
                "Market sentiment"
            );
            Some(sentiment)
        }
        None => {
            warn!(
                code = %benchmark,
                points = points.len(),
                required = config.required_points(),
                "Benchmark history too short for sentiment"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fundwatch_core::error::FetchError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn benchmark() -> InstrumentId {
        InstrumentId::parse("510210").unwrap()
    }

    fn series(values: &[f64]) -> Vec<SeriesPoint> {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| SeriesPoint::new(start + Duration::days(i as i64), *v))
            .collect()
    }

    fn assess(values: &[f64]) -> Option<MarketSentiment> {
        MarketSentiment::assess(benchmark(), &series(values), &SentimentConfig::default())
    }

    #[test]
    fn test_rising_benchmark_is_bullish() {
        let values: Vec<f64> = (0..30).map(|i| 3000.0 + i as f64 * 10.0).collect();
        let s = assess(&values).unwrap();
        assert_eq!(s.label, SentimentLabel::Bullish);
        assert_eq!(s.score, 5);
        // Last five: 3250..=3290, last twenty: 3100..=3290
        assert!((s.ma_short - 3270.0).abs() < 1e-9);
        assert!((s.ma_long - 3195.0).abs() < 1e-9);
        assert!((s.trend_change - (3290.0 / 3230.0 - 1.0)).abs() < 1e-12);
        assert_eq!(s.as_of, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_falling_benchmark_is_bearish() {
        let values: Vec<f64> = (0..30).map(|i| 3300.0 - i as f64 * 10.0).collect();
        let s = assess(&values).unwrap();
        assert_eq!(s.label, SentimentLabel::Bearish);
        assert_eq!(s.score, -5);
        assert!(s.ma_short < s.ma_long);
        assert!(s.trend_change < 0.0);
    }

    #[test]
    fn test_mixed_signals_are_neutral() {
        // Long rise, then a pullback: short average still above long, trend down
        let mut values: Vec<f64> = (0..25).map(|i| 3000.0 + i as f64 * 20.0).collect();
        values.extend((1..=5).map(|i| 3480.0 - i as f64 * 15.0));
        let s = assess(&values).unwrap();
        assert!(s.ma_short > s.ma_long);
        assert!(s.trend_change < 0.0);
        assert_eq!(s.label, SentimentLabel::Neutral);
        assert_eq!(s.score, 0);

        let flat = assess(&[3000.0; 20]).unwrap();
        assert_eq!(flat.label, SentimentLabel::Neutral);
    }

    #[test]
    fn test_short_history_has_no_reading() {
        assert!(assess(&[3000.0; 19]).is_none());
    }

    #[test]
    fn test_config_validation() {
        assert!(SentimentConfig::default().validate().is_ok());

        let mut config = SentimentConfig::default();
        config.short_period = 20;
        assert!(config.validate().is_err());

        let mut config = SentimentConfig::default();
        config.benchmark_code = "abc".into();
        assert!(config.validate().is_err());
    }

    struct Benchmark {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SeriesSource for Benchmark {
        async fn fetch_since(
            &self,
            _instrument: &InstrumentId,
            since: Option<NaiveDate>,
        ) -> Result<Vec<SeriesPoint>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FetchError::Network("connection refused".into()));
            }
            // Newest first, as vendors page
            let mut points = series(&(0..40).map(|i| 3000.0 + i as f64).collect::<Vec<_>>());
            points.retain(|p| since.map_or(true, |s| p.date > s));
            points.reverse();
            Ok(points)
        }

        fn name(&self) -> &str {
            "benchmark"
        }
    }

    #[tokio::test]
    async fn test_assess_market_fetches_once_and_orders_points() {
        let source = Benchmark {
            calls: AtomicUsize::new(0),
            fail: false,
        };
        let as_of = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let s = assess_market(&source, &SentimentConfig::default(), as_of)
            .await
            .unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(s.label, SentimentLabel::Bullish);
        assert_eq!(s.as_of, as_of);
    }

    #[tokio::test]
    async fn test_assess_market_failure_and_disabled() {
        let failing = Benchmark {
            calls: AtomicUsize::new(0),
            fail: true,
        };
        let as_of = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        assert!(assess_market(&failing, &SentimentConfig::default(), as_of)
            .await
            .is_none());

        let disabled = SentimentConfig {
            enabled: false,
            ..SentimentConfig::default()
        };
        assert!(assess_market(&failing, &disabled, as_of).await.is_none());
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
    }
}
