//! Backtesting engine.
//!
//! Replays a stored series one point at a time. The decision at point `i`
//! sees only `points[..=i]`, so truncating the future never changes an
//! earlier decision.

use fundwatch_core::types::{ActionLabel, InstrumentId, SeriesPoint};
use fundwatch_data::LocalSeriesStore;
use fundwatch_indicators::IndicatorEngine;
use fundwatch_signals::SignalEngine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::report::{BacktestReport, InstrumentBacktest};
use crate::statistics::{BacktestStats, OpenPosition, TradeRecord};

/// Backtest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Points required before the first decision
    pub warmup: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self { warmup: 30 }
    }
}

/// Single-position replay engine.
pub struct BacktestEngine {
    config: BacktestConfig,
    indicators: IndicatorEngine,
    signals: SignalEngine,
}

impl BacktestEngine {
    /// Create a new backtest engine.
    pub fn new(config: BacktestConfig, indicators: IndicatorEngine, signals: SignalEngine) -> Self {
        Self {
            config,
            indicators,
            signals,
        }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Action at every point, each computed from that point's history only.
    pub fn actions(&self, points: &[SeriesPoint]) -> Vec<ActionLabel> {
        (0..points.len())
            .map(|i| {
                if i + 1 < self.config.warmup {
                    return ActionLabel::Unavailable;
                }
                // snapshot() limits the window to the trailing length
                let snapshot = self.indicators.snapshot(&points[..=i]);
                self.signals.action(&snapshot)
            })
            .collect()
    }

    /// Replay one ascending series.
    pub fn run(&self, points: &[SeriesPoint]) -> BacktestStats {
        replay(points, &self.actions(points))
    }

    /// Backtest every listed instrument from the local store.
    pub fn run_store(&self, store: &LocalSeriesStore, ids: &[InstrumentId]) -> BacktestReport {
        let mut results = BTreeMap::new();

        for id in ids {
            let result = match store.read(id) {
                Ok(series) if series.is_empty() => {
                    warn!(code = %id, "No local history to backtest");
                    InstrumentBacktest::Skipped("no local history".to_string())
                }
                Ok(series) => {
                    let stats = self.run(series.points());
                    info!(
                        code = %id,
                        points = stats.points_processed,
                        trades = stats.total_trades(),
                        compound_return = stats.compound_return,
                        "Backtest complete"
                    );
                    InstrumentBacktest::Completed(stats)
                }
                Err(e) => {
                    warn!(code = %id, error = %e, "Reading history failed");
                    InstrumentBacktest::Skipped(e.to_string())
                }
            };
            results.insert(id.clone(), result);
        }

        BacktestReport::new(self.config.clone(), results)
    }
}

/// Walk points and their actions: a buy label opens a position when flat, a
/// sell label closes it when held, anything else leaves the state alone.
fn replay(points: &[SeriesPoint], actions: &[ActionLabel]) -> BacktestStats {
    let mut trades = Vec::new();
    let mut holding: Option<(SeriesPoint, f64)> = None;
    // Equity realized by closed trades
    let mut realized = 1.0;
    let mut equity_curve = Vec::with_capacity(points.len());

    for (point, &action) in points.iter().zip(actions) {
        match holding {
            None if action.is_buy() => {
                debug!(date = %point.date, value = point.value, %action, "Enter");
                holding = Some((*point, realized));
            }
            Some((entry, _)) if action.is_sell() => {
                let trade = TradeRecord {
                    entry_date: entry.date,
                    entry_value: entry.value,
                    exit_date: point.date,
                    exit_value: point.value,
                };
                debug!(date = %point.date, value = point.value, %action, ret = trade.return_pct(), "Exit");
                realized *= 1.0 + trade.return_pct();
                trades.push(trade);
                holding = None;
            }
            _ => {}
        }

        let equity = match holding {
            Some((entry, base)) => base * point.value / entry.value,
            None => realized,
        };
        equity_curve.push((point.date, equity));
    }

    let open_position = match (holding, points.last()) {
        (Some((entry, _)), Some(last)) => Some(OpenPosition {
            entry_date: entry.date,
            entry_value: entry.value,
            unrealized_return: last.value / entry.value - 1.0,
        }),
        _ => None,
    };

    BacktestStats::from_replay(trades, open_position, equity_curve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn series(values: &[f64]) -> Vec<SeriesPoint> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| SeriesPoint::new(start + Duration::days(i as i64), *v))
            .collect()
    }

    fn engine() -> BacktestEngine {
        BacktestEngine::new(
            BacktestConfig::default(),
            IndicatorEngine::default(),
            SignalEngine::default(),
        )
    }

    /// Decline into oversold territory, then a long rally.
    fn dip_then_rally() -> Vec<f64> {
        let mut values: Vec<f64> = (0..40).map(|i| 1.0 + i as f64 * 0.002).collect();
        values.extend((1..=25).map(|i| 1.08 - i as f64 * 0.012));
        let bottom = *values.last().unwrap();
        values.extend((1..=80).map(|i| bottom + i as f64 * 0.01));
        values
    }

    #[test]
    fn test_no_decisions_during_warmup() {
        let actions = engine().actions(&series(&dip_then_rally()));
        assert!(actions[..29]
            .iter()
            .all(|a| *a == ActionLabel::Unavailable));
        assert!(actions[29..].iter().all(|a| *a != ActionLabel::Unavailable));
    }

    #[test]
    fn test_dip_is_bought() {
        let stats = engine().run(&series(&dip_then_rally()));
        let entered = stats.open_position.map(|p| p.entry_date).or_else(|| {
            stats.trades.first().map(|t| t.entry_date)
        });
        assert!(entered.is_some());
        assert_eq!(stats.points_processed, dip_then_rally().len());
    }

    #[test]
    fn test_flat_series_never_trades() {
        let stats = engine().run(&series(&[1.0; 120]));
        assert!(stats.trades.is_empty());
        assert!(stats.open_position.is_none());
        assert_eq!(stats.compound_return, 0.0);
        assert!(stats.equity_curve.iter().all(|(_, e)| *e == 1.0));
    }

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + Duration::days(n)
    }

    #[test]
    fn test_two_trade_path_exact_results() {
        use ActionLabel::*;
        let points = series(&[1.0, 1.0, 1.1, 1.2, 1.2, 1.08, 1.5]);
        let actions = [WeakBuy, StrongBuy, WeakSell, StrongBuy, Hold, StrongSell, WeakSell];

        let stats = replay(&points, &actions);
        assert_eq!(stats.total_trades(), 2);
        assert!(stats.open_position.is_none());

        let first = stats.trades[0];
        assert_eq!((first.entry_date, first.exit_date), (day(0), day(2)));
        assert!((first.return_pct() - 0.1).abs() < 1e-12);

        let second = stats.trades[1];
        assert_eq!((second.entry_date, second.exit_date), (day(3), day(5)));
        assert!((second.return_pct() + 0.1).abs() < 1e-12);

        // 1.1 × 0.9 - 1
        assert!((stats.compound_return + 0.01).abs() < 1e-12);
        assert_eq!(stats.win_rate, Some(0.5));

        let equity: Vec<f64> = stats.equity_curve.iter().map(|(_, e)| *e).collect();
        let expected = [1.0, 1.0, 1.1, 1.1, 1.1, 0.99, 0.99];
        for (got, want) in equity.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "{got} != {want}");
        }
        // Peak 1.1 down to 0.99
        assert!((stats.max_drawdown - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_open_position_marked_to_market() {
        use ActionLabel::*;
        let points = series(&[1.0, 1.25, 1.0, 1.2]);
        let actions = [StrongBuy, WeakSell, WeakBuy, Hold];

        let stats = replay(&points, &actions);
        assert_eq!(stats.total_trades(), 1);
        let open = stats.open_position.expect("position left open");
        assert_eq!(open.entry_date, day(2));
        assert_eq!(open.entry_value, 1.0);
        assert!((open.unrealized_return - 0.2).abs() < 1e-12);

        // Open positions are excluded from the compound return but not the curve
        assert!((stats.compound_return - 0.25).abs() < 1e-12);
        let (_, last_equity) = *stats.equity_curve.last().unwrap();
        assert!((last_equity - 1.25 * 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_sell_while_flat_and_buy_while_held_are_ignored() {
        use ActionLabel::*;
        let points = series(&[1.0, 1.1, 1.2, 1.3]);
        let actions = [StrongSell, WeakBuy, StrongBuy, Unavailable];

        let stats = replay(&points, &actions);
        assert!(stats.trades.is_empty());
        let open = stats.open_position.unwrap();
        assert_eq!(open.entry_date, day(1));
    }

    #[test]
    fn test_empty_series() {
        let stats = engine().run(&[]);
        assert_eq!(stats.points_processed, 0);
        assert!(stats.trades.is_empty());
        assert_eq!(stats.max_drawdown, 0.0);
    }

    #[test]
    fn test_run_store_skips_missing_history() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = LocalSeriesStore::new(dir.path());
        let id = InstrumentId::parse("110011").unwrap();
        store
            .merge_append(&id, series(&dip_then_rally()))
            .unwrap();
        let missing = InstrumentId::parse("000001").unwrap();

        let report = engine().run_store(&store, &[id.clone(), missing.clone()]);
        assert!(matches!(
            report.get(&id),
            Some(InstrumentBacktest::Completed(_))
        ));
        assert!(matches!(
            report.get(&missing),
            Some(InstrumentBacktest::Skipped(_))
        ));
    }
}
