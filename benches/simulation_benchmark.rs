//! Benchmarks for quantsim feature engineering and simulation.

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use quantsim::core::types::{AnnualizedStats, Bar, BarSeries};
use quantsim::features::engineer_features;
use quantsim::indicators::momentum::rsi;
use quantsim::portfolio::{simulate_holding, CancellationToken, MonteCarloConfig};

/// Generate a trending daily series.
fn generate_sample_bars(n: usize) -> BarSeries {
    let start = NaiveDate::from_ymd_opt(2000, 1, 3).unwrap();
    let bars = (0..n).map(|i| {
        let close = 100.0 + (i as f64 * 0.1).sin() * 2.0 + i as f64 * 0.01;
        Bar {
            date: start + Duration::days(i as i64),
            open: close - 0.5,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000.0,
            vwap: None,
        }
    });
    BarSeries::from_bars("BENCH", bars)
}

fn bench_engineer_features(c: &mut Criterion) {
    let mut group = c.benchmark_group("engineer_features");

    for size in [1_000, 10_000].iter() {
        let bars = generate_sample_bars(*size);
        group.bench_with_input(BenchmarkId::new("bars", size), size, |b, _| {
            b.iter(|| engineer_features(black_box(&bars)).unwrap())
        });
    }

    group.finish();
}

fn bench_rsi(c: &mut Criterion) {
    let mut group = c.benchmark_group("rsi");

    for size in [1_000, 100_000].iter() {
        let close = generate_sample_bars(*size).close;
        group.bench_with_input(BenchmarkId::new("data_size", size), size, |b, _| {
            b.iter(|| rsi(black_box(&close), 14).unwrap())
        });
    }

    group.finish();
}

fn bench_simulate_holding(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulate_holding");
    group.sample_size(10);
    let stats = AnnualizedStats { mean: 0.08, std: 0.2 };
    let cancel = CancellationToken::new();

    for years in [1u32, 10].iter() {
        let config = MonteCarloConfig { n_simulations: 1_000, trading_days_per_year: 252, seed: Some(42) };
        group.bench_with_input(BenchmarkId::new("years", years), years, |b, &years| {
            b.iter(|| simulate_holding("BENCH", 100_000.0, 100.0, stats, years, &config, &cancel).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_engineer_features, bench_rsi, bench_simulate_holding);
criterion_main!(benches);
