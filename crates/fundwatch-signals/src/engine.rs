//! Rule-table signal engine.
//!
//! Maps an [`IndicatorSnapshot`] to an [`ActionLabel`] and an
//! [`AdvisoryLabel`]. Rules are evaluated top to bottom and the first match
//! wins. A comparison against an unavailable field never matches.

use fundwatch_core::error::FundwatchError;
use fundwatch_core::types::{
    ActionLabel, AdvisoryLabel, IndicatorSnapshot, InstrumentId, SignalResult,
};
use serde::{Deserialize, Serialize};

/// Thresholds for the action and advisory rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Strong buy: RSI below this
    pub strong_buy_rsi: f64,
    /// Strong buy: MA ratio below this
    pub strong_buy_ma_ratio: f64,
    /// Strong sell: MA ratio below this (broken trend)
    pub stop_ma_ratio: f64,
    /// Strong sell: RSI above this, together with an extended MA ratio
    pub overbought_rsi: f64,
    /// MA ratio considered extended above the average
    pub extended_ma_ratio: f64,
    /// Weak sell: RSI above this
    pub weak_sell_rsi: f64,
    /// Weak buy: RSI below this
    pub weak_buy_rsi: f64,
    /// Weak buy: MA ratio below this
    pub weak_buy_ma_ratio: f64,
    /// Advisory: RSI below this suggests adding
    pub oversold_rsi: f64,
    /// Advisory: lowest MA ratio for gradual accumulation
    pub accumulate_min_ma_ratio: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            strong_buy_rsi: 35.0,
            strong_buy_ma_ratio: 0.9,
            stop_ma_ratio: 0.95,
            overbought_rsi: 70.0,
            extended_ma_ratio: 1.2,
            weak_sell_rsi: 65.0,
            weak_buy_rsi: 45.0,
            weak_buy_ma_ratio: 1.0,
            oversold_rsi: 30.0,
            accumulate_min_ma_ratio: 0.8,
        }
    }
}

impl SignalConfig {
    /// Check threshold sanity.
    pub fn validate(&self) -> Result<(), FundwatchError> {
        let rsi_levels = [
            self.strong_buy_rsi,
            self.overbought_rsi,
            self.weak_sell_rsi,
            self.weak_buy_rsi,
            self.oversold_rsi,
        ];
        if rsi_levels.iter().any(|v| !(0.0..=100.0).contains(v)) {
            return Err(FundwatchError::Config(
                "RSI thresholds must be between 0 and 100".into(),
            ));
        }
        if self.oversold_rsi >= self.overbought_rsi {
            return Err(FundwatchError::Config(
                "oversold_rsi must be below overbought_rsi".into(),
            ));
        }
        let ratios = [
            self.strong_buy_ma_ratio,
            self.stop_ma_ratio,
            self.extended_ma_ratio,
            self.weak_buy_ma_ratio,
            self.accumulate_min_ma_ratio,
        ];
        if ratios.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(FundwatchError::Config(
                "MA ratio thresholds must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Pure mapping from snapshots to labels.
#[derive(Debug, Clone, Default)]
pub struct SignalEngine {
    config: SignalConfig,
}

impl SignalEngine {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Evaluate both labels for one instrument.
    pub fn evaluate(&self, instrument_id: InstrumentId, snapshot: IndicatorSnapshot) -> SignalResult {
        let action = self.action(&snapshot);
        let advisory = self.advisory(&snapshot);
        tracing::trace!(
            instrument = %instrument_id,
            rsi = ?snapshot.rsi,
            ma_ratio = ?snapshot.ma_ratio,
            %action,
            %advisory,
            "Evaluated signal"
        );
        SignalResult {
            instrument_id,
            snapshot,
            advisory,
            action,
        }
    }

    /// Action label for a snapshot.
    pub fn action(&self, snap: &IndicatorSnapshot) -> ActionLabel {
        let c = &self.config;
        let (Some(rsi), Some(ma_ratio)) = (snap.rsi, snap.ma_ratio) else {
            return ActionLabel::Unavailable;
        };
        let macd_positive = snap.macd_histogram.is_some_and(|h| h > 0.0);
        let macd_negative = snap.macd_histogram.is_some_and(|h| h < 0.0);

        // Every strong-buy snapshot also satisfies the stop rule, so it is checked first.
        if rsi < c.strong_buy_rsi && ma_ratio < c.strong_buy_ma_ratio && macd_positive {
            return ActionLabel::StrongBuy;
        }
        if ma_ratio < c.stop_ma_ratio
            || (rsi > c.overbought_rsi && ma_ratio > c.extended_ma_ratio && macd_negative)
        {
            return ActionLabel::StrongSell;
        }
        if rsi > c.weak_sell_rsi || snap.above_upper_band() || ma_ratio > c.extended_ma_ratio {
            return ActionLabel::WeakSell;
        }
        if rsi < c.weak_buy_rsi || snap.below_lower_band() || ma_ratio < c.weak_buy_ma_ratio {
            return ActionLabel::WeakBuy;
        }
        ActionLabel::Hold
    }

    /// Advisory label for a snapshot. Informational only.
    pub fn advisory(&self, snap: &IndicatorSnapshot) -> AdvisoryLabel {
        let c = &self.config;
        let (Some(rsi), Some(ma_ratio)) = (snap.rsi, snap.ma_ratio) else {
            return AdvisoryLabel::Unavailable;
        };

        if rsi > c.overbought_rsi || ma_ratio > c.extended_ma_ratio {
            AdvisoryLabel::WaitForPullback
        } else if (c.oversold_rsi..=c.overbought_rsi).contains(&rsi)
            && (c.accumulate_min_ma_ratio..=c.extended_ma_ratio).contains(&ma_ratio)
        {
            AdvisoryLabel::AccumulateGradually
        } else if rsi < c.oversold_rsi {
            AdvisoryLabel::AddPosition
        } else {
            AdvisoryLabel::Watch
        }
    }
}
