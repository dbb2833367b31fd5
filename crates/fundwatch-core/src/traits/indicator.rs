//! Indicator trait definitions.

use crate::error::IndicatorError;

/// Trait for technical indicators over a value series.
pub trait Indicator: Send + Sync {
    /// The output type of the indicator.
    type Output;

    /// Calculate indicator values for the given data.
    ///
    /// # Arguments
    /// * `data` - Input values, oldest first
    ///
    /// # Returns
    /// One value per position where the indicator is defined, aligned to the end of `data`
    fn calculate(&self, data: &[f64]) -> Vec<Self::Output>;

    /// Get the minimum data points required.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;

    /// Value at the last position, if defined.
    fn latest(&self, data: &[f64]) -> Option<Self::Output> {
        self.calculate(data).pop()
    }

    /// Validate that there's enough data.
    fn validate_data(&self, data: &[f64]) -> Result<(), IndicatorError> {
        if data.len() < self.period() {
            return Err(IndicatorError::InsufficientData {
                required: self.period(),
                available: data.len(),
            });
        }
        Ok(())
    }
}

/// Multi-output indicator (e.g., Bollinger Bands, MACD).
pub trait MultiOutputIndicator: Send + Sync {
    /// The output type containing multiple values.
    type Outputs;

    /// Calculate indicator values for the given data.
    fn calculate(&self, data: &[f64]) -> Vec<Self::Outputs>;

    /// Get the minimum data points required.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;

    /// Outputs at the last position, if defined.
    fn latest(&self, data: &[f64]) -> Option<Self::Outputs> {
        self.calculate(data).pop()
    }

    /// Validate that there's enough data.
    fn validate_data(&self, data: &[f64]) -> Result<(), IndicatorError> {
        if data.len() < self.period() {
            return Err(IndicatorError::InsufficientData {
                required: self.period(),
                available: data.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct WindowSum {
        period: usize,
    }

    impl Indicator for WindowSum {
        type Output = f64;

        fn calculate(&self, data: &[f64]) -> Vec<f64> {
            if data.len() < self.period {
                return vec![];
            }
            data.windows(self.period)
                .map(|w| w.iter().sum())
                .collect()
        }

        fn period(&self) -> usize {
            self.period
        }

        fn name(&self) -> &str {
            "window_sum"
        }
    }

    #[test]
    fn test_indicator_validation() {
        let indicator = WindowSum { period: 5 };

        assert!(indicator.validate_data(&[1.0, 2.0, 3.0]).is_err());
        assert!(indicator.validate_data(&[1.0, 2.0, 3.0, 4.0, 5.0]).is_ok());
    }

    #[test]
    fn test_latest_is_last_output() {
        let indicator = WindowSum { period: 3 };
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];

        assert_eq!(indicator.calculate(&data).len(), 3);
        assert!((indicator.latest(&data).unwrap() - 12.0).abs() < 0.001);
        assert!(indicator.latest(&[1.0]).is_none());
    }
}
