//! Benchmarks for indicator implementations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fundwatch_core::traits::{Indicator, MultiOutputIndicator};
use fundwatch_indicators::{IndicatorEngine, Macd, Rsi};

fn generate_test_data(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 1.0 + (i as f64 * 0.1).sin() * 0.1 + i as f64 * 0.0005)
        .collect()
}

fn benchmark_rsi(c: &mut Criterion) {
    let mut group = c.benchmark_group("RSI");

    for size in [200, 2000, 20000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("wilder", size), &data, |b, data| {
            let rsi = Rsi::new(14);
            b.iter(|| rsi.calculate(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_macd(c: &mut Criterion) {
    let mut group = c.benchmark_group("MACD");

    for size in [200, 2000, 20000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("12/26/9", size), &data, |b, data| {
            let macd = Macd::new();
            b.iter(|| macd.calculate(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("Snapshot");
    let engine = IndicatorEngine::default();

    for size in [200, 2000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("latest", size), &data, |b, data| {
            b.iter(|| engine.snapshot_values(black_box(&data[data.len().saturating_sub(200)..])))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_rsi, benchmark_macd, benchmark_snapshot);
criterion_main!(benches);
