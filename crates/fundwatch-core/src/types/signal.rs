//! Indicator snapshots and signal labels.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::InstrumentId;

/// Indicator values at the latest point of a series.
///
/// `None` marks an indicator that could not be computed (too little history,
/// non-finite inputs, degenerate denominator).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub latest_value: Option<f64>,
    pub rsi: Option<f64>,
    /// latest value / simple moving average
    pub ma_ratio: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub bollinger_upper: Option<f64>,
    pub bollinger_lower: Option<f64>,
}

impl IndicatorSnapshot {
    /// Snapshot with every field unavailable.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// True when the value sits above the upper band.
    pub fn above_upper_band(&self) -> bool {
        matches!((self.latest_value, self.bollinger_upper), (Some(v), Some(u)) if v > u)
    }

    /// True when the value sits below the lower band.
    pub fn below_lower_band(&self) -> bool {
        matches!((self.latest_value, self.bollinger_lower), (Some(v), Some(l)) if v < l)
    }
}

/// Discrete action derived from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionLabel {
    StrongBuy,
    WeakBuy,
    Hold,
    WeakSell,
    StrongSell,
    Unavailable,
}

impl ActionLabel {
    /// Sort key for reports, lower first.
    pub fn priority(self) -> u8 {
        match self {
            ActionLabel::StrongBuy => 0,
            ActionLabel::WeakBuy => 1,
            ActionLabel::Hold => 2,
            ActionLabel::WeakSell => 3,
            ActionLabel::StrongSell => 4,
            ActionLabel::Unavailable => 5,
        }
    }

    pub fn is_buy(self) -> bool {
        matches!(self, ActionLabel::StrongBuy | ActionLabel::WeakBuy)
    }

    pub fn is_sell(self) -> bool {
        matches!(self, ActionLabel::StrongSell | ActionLabel::WeakSell)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionLabel::StrongBuy => "strong-buy",
            ActionLabel::WeakBuy => "weak-buy",
            ActionLabel::Hold => "hold",
            ActionLabel::WeakSell => "weak-sell",
            ActionLabel::StrongSell => "strong-sell",
            ActionLabel::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for ActionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Looser, human-facing advisory label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdvisoryLabel {
    WaitForPullback,
    AccumulateGradually,
    AddPosition,
    Watch,
    Unavailable,
}

impl AdvisoryLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            AdvisoryLabel::WaitForPullback => "wait-for-pullback",
            AdvisoryLabel::AccumulateGradually => "accumulate-gradually",
            AdvisoryLabel::AddPosition => "add-position",
            AdvisoryLabel::Watch => "watch",
            AdvisoryLabel::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for AdvisoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one analysis run for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalResult {
    pub instrument_id: InstrumentId,
    pub snapshot: IndicatorSnapshot,
    pub advisory: AdvisoryLabel,
    pub action: ActionLabel,
}

impl SignalResult {
    /// Result for an instrument with no usable data.
    pub fn unavailable(instrument_id: InstrumentId) -> Self {
        Self {
            instrument_id,
            snapshot: IndicatorSnapshot::unavailable(),
            advisory: AdvisoryLabel::Unavailable,
            action: ActionLabel::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let mut labels = vec![
            ActionLabel::Unavailable,
            ActionLabel::Hold,
            ActionLabel::StrongSell,
            ActionLabel::StrongBuy,
            ActionLabel::WeakSell,
            ActionLabel::WeakBuy,
        ];
        labels.sort_by_key(|l| l.priority());
        assert_eq!(
            labels,
            vec![
                ActionLabel::StrongBuy,
                ActionLabel::WeakBuy,
                ActionLabel::Hold,
                ActionLabel::WeakSell,
                ActionLabel::StrongSell,
                ActionLabel::Unavailable,
            ]
        );
    }

    #[test]
    fn test_band_checks_need_both_values() {
        let snap = IndicatorSnapshot {
            latest_value: Some(1.3),
            bollinger_upper: Some(1.2),
            ..Default::default()
        };
        assert!(snap.above_upper_band());
        assert!(!snap.below_lower_band());
        assert!(!IndicatorSnapshot::unavailable().above_upper_band());
    }

    #[test]
    fn test_label_serde_names() {
        let json = serde_json::to_string(&ActionLabel::StrongBuy).unwrap();
        assert_eq!(json, "\"strong-buy\"");
        let json = serde_json::to_string(&AdvisoryLabel::WaitForPullback).unwrap();
        assert_eq!(json, "\"wait-for-pullback\"");
    }
}
