//! Return and drawdown statistics over a value series.

use serde::{Deserialize, Serialize};

use crate::volatility::mean_std;

/// Trading days per year used for annualization.
pub const TRADING_DAYS: f64 = 252.0;

/// Annualized risk/return profile of a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    /// Mean daily return × 252
    pub annual_return: Option<f64>,
    /// Daily return standard deviation × √252
    pub annual_volatility: Option<f64>,
    /// (annual_return - risk_free_rate) / annual_volatility
    pub sharpe_ratio: Option<f64>,
    /// Largest peak-to-trough decline as a fraction of the peak
    pub max_drawdown: Option<f64>,
}

impl RiskProfile {
    /// Compute from values ordered oldest first. Non-finite values are skipped.
    pub fn from_values(values: &[f64], risk_free_rate: f64) -> Self {
        let values: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let returns = daily_returns(&values);

        let (annual_return, annual_volatility) = if returns.len() >= 2 {
            let (mean, std) = mean_std(&returns);
            (Some(mean * TRADING_DAYS), Some(std * TRADING_DAYS.sqrt()))
        } else {
            (None, None)
        };

        let sharpe_ratio = match (annual_return, annual_volatility) {
            (Some(ret), Some(vol)) if vol > 0.0 => Some((ret - risk_free_rate) / vol),
            _ => None,
        };

        Self {
            annual_return,
            annual_volatility,
            sharpe_ratio,
            max_drawdown: max_drawdown(&values),
        }
    }
}

/// Simple period-over-period returns; pairs with a zero base are skipped.
pub fn daily_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

/// Maximum drawdown as a non-negative fraction; `None` for an empty series.
pub fn max_drawdown(values: &[f64]) -> Option<f64> {
    let mut iter = values.iter().copied();
    let mut peak = iter.next()?;
    let mut worst = 0.0_f64;
    for value in iter {
        if value > peak {
            peak = value;
        } else if peak > 0.0 {
            worst = worst.max((peak - value) / peak);
        }
    }
    Some(worst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_drawdown() {
        let values = vec![1.0, 1.2, 0.9, 1.1, 0.6, 1.3];
        // Peak 1.2 → trough 0.6
        assert!((max_drawdown(&values).unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), Some(0.0));
        assert!(max_drawdown(&[]).is_none());
    }

    #[test]
    fn test_profile_constant_series_has_no_sharpe() {
        let profile = RiskProfile::from_values(&[1.0; 10], 0.02);
        assert_eq!(profile.annual_return, Some(0.0));
        assert_eq!(profile.annual_volatility, Some(0.0));
        assert!(profile.sharpe_ratio.is_none());
        assert_eq!(profile.max_drawdown, Some(0.0));
    }

    #[test]
    fn test_profile_uptrend() {
        let values: Vec<f64> = (0..60)
            .map(|i| 1.0 + i as f64 * 0.01 + if i % 2 == 0 { 0.002 } else { 0.0 })
            .collect();
        let profile = RiskProfile::from_values(&values, 0.02);
        assert!(profile.annual_return.unwrap() > 0.0);
        assert!(profile.sharpe_ratio.unwrap() > 0.0);
    }

    #[test]
    fn test_profile_too_short() {
        let profile = RiskProfile::from_values(&[1.0, 1.1], 0.02);
        assert!(profile.annual_return.is_none());
        assert!(profile.sharpe_ratio.is_none());
        assert_eq!(profile.max_drawdown, Some(0.0));
    }
}
