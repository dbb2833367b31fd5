//! Replay properties over random walks.

use chrono::{Duration, NaiveDate};
use fundwatch_backtest::{BacktestConfig, BacktestEngine};
use fundwatch_core::types::SeriesPoint;
use fundwatch_indicators::IndicatorEngine;
use fundwatch_signals::SignalEngine;
use proptest::prelude::*;

fn walk(steps: &[f64]) -> Vec<SeriesPoint> {
    let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
    let mut value = 1.0;
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            value *= 1.0 + step;
            SeriesPoint::new(start + Duration::days(i as i64), value)
        })
        .collect()
}

fn engine() -> BacktestEngine {
    BacktestEngine::new(
        BacktestConfig::default(),
        IndicatorEngine::default(),
        SignalEngine::default(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn truncating_the_future_keeps_past_decisions(
        steps in prop::collection::vec(-0.03..0.03_f64, 40..160),
        cut in 0.1..0.9_f64,
    ) {
        let points = walk(&steps);
        let k = ((points.len() as f64) * cut) as usize;
        let engine = engine();

        let full = engine.actions(&points);
        let truncated = engine.actions(&points[..k]);
        prop_assert_eq!(&full[..k], &truncated[..]);

        // Trades closed before the cut are identical
        let full_stats = engine.run(&points);
        let cut_stats = engine.run(&points[..k]);
        let full_closed: Vec<_> = full_stats
            .trades
            .iter()
            .filter(|t| t.exit_date < points[k].date)
            .collect();
        let cut_closed: Vec<_> = cut_stats.trades.iter().collect();
        prop_assert_eq!(full_closed, cut_closed);
    }

    #[test]
    fn equity_curve_covers_every_point(
        steps in prop::collection::vec(-0.03..0.03_f64, 0..160),
    ) {
        let points = walk(&steps);
        let stats = engine().run(&points);

        prop_assert_eq!(stats.equity_curve.len(), points.len());
        prop_assert!(stats.max_drawdown >= 0.0 && stats.max_drawdown < 1.0);
        prop_assert!(stats.equity_curve.iter().all(|(_, e)| *e > 0.0));
        if let Some(win_rate) = stats.win_rate {
            prop_assert!((0.0..=1.0).contains(&win_rate));
        }
        if stats.trades.len() < 2 {
            prop_assert!(stats.sharpe.is_none());
        }
    }

    #[test]
    fn trades_alternate_and_never_overlap(
        steps in prop::collection::vec(-0.03..0.03_f64, 40..160),
    ) {
        let stats = engine().run(&walk(&steps));
        for pair in stats.trades.windows(2) {
            prop_assert!(pair[0].exit_date <= pair[1].entry_date);
        }
        for t in &stats.trades {
            prop_assert!(t.entry_date < t.exit_date);
        }
        if let (Some(open), Some(last)) = (stats.open_position, stats.trades.last()) {
            prop_assert!(open.entry_date >= last.exit_date);
        }
    }
}
