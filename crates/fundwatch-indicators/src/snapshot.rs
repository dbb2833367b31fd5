//! Indicator snapshot assembly.
//!
//! [`IndicatorEngine`] turns the trailing window of a series into an
//! [`IndicatorSnapshot`]. Non-finite inputs are dropped before any indicator
//! runs, and every indicator that cannot be computed is reported as `None`.

use fundwatch_core::error::IndicatorError;
use fundwatch_core::traits::{Indicator, MultiOutputIndicator};
use fundwatch_core::types::{IndicatorSnapshot, SeriesPoint};
use serde::{Deserialize, Serialize};

use crate::momentum::{Macd, Rsi};
use crate::moving_average::Sma;
use crate::volatility::BollingerBands;

/// Indicator windows and parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Number of most recent points fed to the indicators
    pub trailing_window: usize,
    pub rsi_period: usize,
    /// Upper bound for the moving-average window of the MA ratio
    pub ma_window: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_std_devs: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            trailing_window: 200,
            rsi_period: 14,
            ma_window: 50,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_std_devs: 2.0,
        }
    }
}

impl IndicatorConfig {
    /// Reject parameter combinations the indicators cannot run with.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if self.trailing_window == 0 {
            return Err(IndicatorError::InvalidParameter(
                "trailing_window must be positive".into(),
            ));
        }
        if self.rsi_period == 0 || self.ma_window == 0 {
            return Err(IndicatorError::InvalidParameter(
                "rsi_period and ma_window must be positive".into(),
            ));
        }
        if self.macd_fast == 0 || self.macd_signal == 0 || self.macd_fast >= self.macd_slow {
            return Err(IndicatorError::InvalidParameter(format!(
                "invalid MACD periods ({}, {}, {})",
                self.macd_fast, self.macd_slow, self.macd_signal
            )));
        }
        if self.bollinger_period < 2 || !(self.bollinger_std_devs > 0.0) {
            return Err(IndicatorError::InvalidParameter(
                "bollinger_period must be >= 2 and bollinger_std_devs positive".into(),
            ));
        }
        Ok(())
    }
}

/// Computes indicator snapshots from ascending series.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    config: IndicatorConfig,
    rsi: Rsi,
    macd: Macd,
    bollinger: BollingerBands,
}

impl IndicatorEngine {
    /// Create an engine. Panics on parameters rejected by [`IndicatorConfig::validate`].
    pub fn new(config: IndicatorConfig) -> Self {
        let rsi = Rsi::new(config.rsi_period);
        let macd = Macd::with_periods(config.macd_fast, config.macd_slow, config.macd_signal);
        let bollinger =
            BollingerBands::with_params(config.bollinger_period, config.bollinger_std_devs);
        Self {
            config,
            rsi,
            macd,
            bollinger,
        }
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    /// Snapshot at the last point of `points`, using only the trailing window.
    pub fn snapshot(&self, points: &[SeriesPoint]) -> IndicatorSnapshot {
        let start = points.len().saturating_sub(self.config.trailing_window);
        let values: Vec<f64> = points[start..].iter().map(|p| p.value).collect();
        self.snapshot_values(&values)
    }

    /// Snapshot at the last element of `values`.
    pub fn snapshot_values(&self, values: &[f64]) -> IndicatorSnapshot {
        let values: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let Some(&latest) = values.last() else {
            return IndicatorSnapshot::unavailable();
        };

        let rsi = self.rsi.latest(&values).filter(|v| v.is_finite());

        let ma_len = self.config.ma_window.min(values.len());
        let ma_ratio = Sma::new(ma_len)
            .latest(&values)
            .filter(|sma| *sma != 0.0)
            .map(|sma| latest / sma)
            .filter(|v| v.is_finite());

        let macd_histogram = self
            .macd
            .latest(&values)
            .map(|out| out.histogram)
            .filter(|v| v.is_finite());

        let bands = self
            .bollinger
            .latest(&values)
            .filter(|b| b.upper.is_finite() && b.lower.is_finite());

        IndicatorSnapshot {
            latest_value: Some(latest),
            rsi,
            ma_ratio,
            macd_histogram,
            bollinger_upper: bands.map(|b| b.upper),
            bollinger_lower: bands.map(|b| b.lower),
        }
    }
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::new(IndicatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn points(values: &[f64]) -> Vec<SeriesPoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| SeriesPoint::new(start + Duration::days(i as i64), v))
            .collect()
    }

    #[test]
    fn test_empty_series_unavailable() {
        let engine = IndicatorEngine::default();
        assert_eq!(engine.snapshot(&[]), IndicatorSnapshot::unavailable());
    }

    #[test]
    fn test_short_series_partial_snapshot() {
        let engine = IndicatorEngine::default();
        let snap = engine.snapshot(&points(&[1.0, 1.1, 1.2]));

        assert_eq!(snap.latest_value, Some(1.2));
        assert!(snap.rsi.is_none());
        assert!(snap.bollinger_upper.is_none());
        // MA window shrinks to the available length: 1.2 / 1.1
        assert!((snap.ma_ratio.unwrap() - 1.2 / 1.1).abs() < 1e-12);
        assert!(snap.macd_histogram.is_some());
    }

    #[test]
    fn test_full_snapshot() {
        let engine = IndicatorEngine::default();
        let values: Vec<f64> = (0..120)
            .map(|i| 1.0 + (i as f64 * 0.2).sin() * 0.05 + i as f64 * 0.001)
            .collect();
        let snap = engine.snapshot(&points(&values));

        let rsi = snap.rsi.unwrap();
        assert!((0.0..=100.0).contains(&rsi));
        assert!(snap.ma_ratio.unwrap() > 0.0);
        assert!(snap.bollinger_upper.unwrap() > snap.bollinger_lower.unwrap());
    }

    #[test]
    fn test_non_finite_values_skipped() {
        let engine = IndicatorEngine::default();
        let mut values: Vec<f64> = (0..30).map(|i| 1.0 + i as f64 * 0.01).collect();
        values[10] = f64::NAN;
        values.push(f64::INFINITY);

        let snap = engine.snapshot_values(&values);
        assert_eq!(snap.latest_value, Some(1.29));
        assert!(snap.rsi.is_some());
    }

    #[test]
    fn test_trailing_window_limits_input() {
        let config = IndicatorConfig {
            trailing_window: 5,
            ..Default::default()
        };
        let engine = IndicatorEngine::new(config);
        let values: Vec<f64> = (1..=100).map(|i| i as f64).collect();
        let snap = engine.snapshot(&points(&values));

        // SMA over [96..=100] = 98
        assert!((snap.ma_ratio.unwrap() - 100.0 / 98.0).abs() < 1e-12);
        assert!(snap.rsi.is_none());
    }

    #[test]
    fn test_config_validation() {
        assert!(IndicatorConfig::default().validate().is_ok());
        let bad = IndicatorConfig {
            macd_fast: 30,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
