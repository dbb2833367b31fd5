//! Property tests for indicator invariants.
//!
//! 1. RSI stays within [0, 100] whenever it is defined
//! 2. Snapshots never panic and never report non-finite values

use fundwatch_core::traits::Indicator;
use fundwatch_indicators::{IndicatorEngine, Rsi};
use proptest::prelude::*;

fn arb_values() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.01..10.0_f64, 0..120)
}

fn arb_messy_values() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(
        prop_oneof![
            8 => (0.01..10.0_f64),
            1 => Just(f64::NAN),
            1 => Just(f64::INFINITY),
        ],
        0..80,
    )
}

proptest! {
    #[test]
    fn rsi_is_bounded(values in arb_values(), period in 2usize..30) {
        let rsi = Rsi::new(period);
        for value in rsi.calculate(&values) {
            prop_assert!((0.0..=100.0).contains(&value), "rsi {} out of range", value);
        }
    }

    #[test]
    fn snapshot_fields_are_finite(values in arb_messy_values()) {
        let engine = IndicatorEngine::default();
        let snap = engine.snapshot_values(&values);

        for field in [
            snap.latest_value,
            snap.rsi,
            snap.ma_ratio,
            snap.macd_histogram,
            snap.bollinger_upper,
            snap.bollinger_lower,
        ]
        .into_iter()
        .flatten()
        {
            prop_assert!(field.is_finite());
        }
        if let Some(rsi) = snap.rsi {
            prop_assert!((0.0..=100.0).contains(&rsi));
        }
    }
}
