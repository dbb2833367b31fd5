//! Moving average indicators.

use fundwatch_core::traits::Indicator;

/// Simple Moving Average (SMA).
///
/// Calculates the arithmetic mean of the last N values.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() < self.period {
            return vec![];
        }

        let mut result = Vec::with_capacity(data.len() - self.period + 1);
        let period_f64 = self.period as f64;

        // Initial sum
        let mut sum: f64 = data[..self.period].iter().sum();
        result.push(sum / period_f64);

        // Sliding window
        for i in self.period..data.len() {
            sum = sum - data[i - self.period] + data[i];
            result.push(sum / period_f64);
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

/// How the first EMA value is formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmaSeed {
    /// First output is the SMA of the first `period` values.
    Sma,
    /// First output is the first value; one output per input.
    FirstValue,
}

/// Exponential Moving Average (EMA).
///
/// Gives more weight to recent values using an exponential decay.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    multiplier: f64,
    seed: EmaSeed,
}

impl Ema {
    /// Create a new SMA-seeded EMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        let multiplier = 2.0 / (period as f64 + 1.0);
        Self {
            period,
            multiplier,
            seed: EmaSeed::Sma,
        }
    }

    /// EMA seeded with the first value, defined from the first point on.
    pub fn from_first(period: usize) -> Self {
        Self {
            seed: EmaSeed::FirstValue,
            ..Self::new(period)
        }
    }

    /// Smoothing factor `2 / (period + 1)`.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        let (initial, rest) = match self.seed {
            EmaSeed::Sma => {
                if data.len() < self.period {
                    return vec![];
                }
                let sma = data[..self.period].iter().sum::<f64>() / self.period as f64;
                (sma, &data[self.period..])
            }
            EmaSeed::FirstValue => match data.split_first() {
                Some((&first, rest)) => (first, rest),
                None => return vec![],
            },
        };

        let mut result = Vec::with_capacity(rest.len() + 1);
        result.push(initial);

        let mut ema = initial;
        let one_minus_mult = 1.0 - self.multiplier;

        for &value in rest {
            ema = value * self.multiplier + ema * one_minus_mult;
            result.push(ema);
        }

        result
    }

    fn period(&self) -> usize {
        match self.seed {
            EmaSeed::Sma => self.period,
            EmaSeed::FirstValue => 1,
        }
    }

    fn name(&self) -> &str {
        "EMA"
    }
}
