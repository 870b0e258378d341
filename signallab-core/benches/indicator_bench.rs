//! Criterion benchmarks for SignalLab hot paths.
//!
//! Benchmarks:
//! 1. Indicator engine (default set, single SMA)
//! 2. Signal generation + backtest over a computed indicator set
//! 3. Regression fit (encode, split, solve)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use signallab_core::backtest::run_backtest;
use signallab_core::domain::{Bar, PriceSeries};
use signallab_core::indicators::{Indicator, IndicatorEngine, Sma};
use signallab_core::regression::{FeatureTable, RegressionEstimator};
use signallab_core::signals::{ShortPolicy, SignalEngine};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(n: usize) -> PriceSeries {
    let base_date = chrono::NaiveDate::from_ymd_opt(2015, 1, 2).unwrap();
    let bars = (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0 + i as f64 * 0.01;
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open: close - 0.3,
                high: close + 1.5,
                low: close - 1.5,
                close,
                volume: 1_000_000 + (i as u64 % 500_000),
            }
        })
        .collect();
    PriceSeries::new("BENCH", bars).unwrap()
}

fn make_table(rows: usize) -> FeatureTable {
    let regions = ["north", "south", "east", "west", "central"];
    let mut csv = String::from("x1,x2,x3,region,y\n");
    for i in 0..rows {
        let x1 = (i * 31 % 997) as f64;
        let x2 = (i * 17 % 101) as f64 * 0.5;
        let x3 = (i as f64 * 0.01).cos();
        let region = regions[i % regions.len()];
        let y = 3.0 * x1 - 2.0 * x2 + 10.0 * x3 + (i % 5) as f64;
        csv.push_str(&format!("{x1},{x2},{x3},{region},{y}\n"));
    }
    FeatureTable::from_csv_reader(csv.as_bytes()).unwrap()
}

// ── 1. Indicator Engine ──────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_engine");
    let engine = IndicatorEngine::default();
    let sma = Sma::new(20);

    for &bar_count in &[252, 1260, 2520] {
        let series = make_series(bar_count);

        group.bench_with_input(BenchmarkId::new("sma_20", bar_count), &series, |b, s| {
            b.iter(|| sma.compute(black_box(s)));
        });

        group.bench_with_input(BenchmarkId::new("default_set", bar_count), &series, |b, s| {
            b.iter(|| engine.compute(black_box(s)));
        });
    }

    group.finish();
}

// ── 2. Signals + Backtest ────────────────────────────────────────────

fn bench_signals(c: &mut Criterion) {
    let mut group = c.benchmark_group("signal_backtest");
    let series = make_series(2520);
    let indicators = IndicatorEngine::default().compute(&series);
    let signals = SignalEngine::default();

    group.bench_function("generate_2520", |b| {
        b.iter(|| signals.generate(black_box(&series), black_box(&indicators)));
    });

    let generated = signals.generate(&series, &indicators).unwrap();
    group.bench_function("backtest_2520", |b| {
        b.iter(|| run_backtest(black_box(&series), black_box(&generated), ShortPolicy::Inverse));
    });

    group.finish();
}

// ── 3. Regression Fit ────────────────────────────────────────────────

fn bench_regression(c: &mut Criterion) {
    let mut group = c.benchmark_group("regression_fit");
    let estimator = RegressionEstimator::default();

    for &rows in &[200, 2000] {
        let table = make_table(rows);
        group.bench_with_input(BenchmarkId::new("fit", rows), &table, |b, t| {
            b.iter(|| estimator.fit(black_box(t), "y"));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_indicators, bench_signals, bench_regression);
criterion_main!(benches);
