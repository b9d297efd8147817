//! Integration tests for GBM simulation and portfolio aggregation.

use approx::assert_relative_eq;
use proptest::prelude::*;

use quantsim::core::types::AnnualizedStats;
use quantsim::metrics::summary::SummaryStatistics;
use quantsim::portfolio::{
    simulate_holding, CancellationToken, MissingTrialPolicy, MonteCarloConfig, PortfolioSimulation,
};

fn config(n: usize, seed: u64) -> MonteCarloConfig {
    MonteCarloConfig { n_simulations: n, trading_days_per_year: 252, seed: Some(seed) }
}

#[test]
fn test_gbm_sample_mean() {
    let stats = AnnualizedStats { mean: 0.08, std: 0.20 };
    let cancel = CancellationToken::new();
    let sim = simulate_holding("SPY", 100.0, 100.0, stats, 1, &config(10_000, 42), &cancel).unwrap();
    let values = sim.terminal_values();
    let mean = values.iter().sum::<f64>() / values.len() as f64;

    let reference = 100.0 * (0.08f64 - 0.5 * 0.04).exp();
    assert!((mean - reference).abs() / reference < 0.05, "mean {mean} vs {reference}");
    assert!(values.iter().all(|v| *v > 0.0));
}

#[test]
fn test_gbm_median_tracks_log_drift() {
    let stats = AnnualizedStats { mean: 0.08, std: 0.20 };
    let cancel = CancellationToken::new();
    let sim = simulate_holding("SPY", 100.0, 100.0, stats, 1, &config(10_000, 7), &cancel).unwrap();
    let summary = SummaryStatistics::compute(
        &sim.terminal_values(),
        &sim.trials.iter().map(|t| t.return_pct).collect::<Vec<_>>(),
    )
    .unwrap();
    assert_relative_eq!(summary.median, 100.0 * 0.06f64.exp(), max_relative = 0.02);
    assert!(summary.p5 < summary.median && summary.median < summary.p95);
}

#[test]
fn test_zero_drift_zero_volatility_preserves_value() {
    let stats = AnnualizedStats { mean: 0.0, std: 0.0 };
    let cancel = CancellationToken::new();
    let sim = simulate_holding("AAPL", 125_000.0, 187.3, stats, 10, &config(100, 1), &cancel).unwrap();
    for t in &sim.trials {
        assert_relative_eq!(t.terminal_value, 125_000.0, max_relative = 1e-12);
    }
}

#[test]
fn test_results_independent_of_thread_count() {
    let stats = AnnualizedStats { mean: 0.05, std: 0.3 };
    let cancel = CancellationToken::new();
    let run = || simulate_holding("XLF", 1_000.0, 40.0, stats, 2, &config(300, 99), &cancel);

    let single = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap().install(run).unwrap();
    let many = rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap().install(run).unwrap();
    assert_eq!(single.trials, many.trials);
}

#[test]
fn test_portfolio_terminal_is_sum_of_tickers() {
    let cancel = CancellationToken::new();
    let a = simulate_holding(
        "AAPL",
        125_000.0,
        190.0,
        AnnualizedStats { mean: 0.12, std: 0.3 },
        10,
        &config(500, 3),
        &cancel,
    )
    .unwrap();
    let b = simulate_holding(
        "AMZN",
        125_000.0,
        175.0,
        AnnualizedStats { mean: 0.15, std: 0.35 },
        10,
        &config(500, 3),
        &cancel,
    )
    .unwrap();
    let tickers = vec![a.clone(), b.clone()];
    let portfolio = PortfolioSimulation::assemble("A", 10, 500, tickers, MissingTrialPolicy::Fail).unwrap();

    assert_eq!(portfolio.initial_value, 250_000.0);
    let trials: Vec<usize> = portfolio.trials.iter().map(|t| t.trial).collect();
    assert_eq!(trials, (1..=500).collect::<Vec<_>>());

    for result in portfolio.portfolio_results(1) {
        let parts: f64 = portfolio
            .simulation_results(1)
            .iter()
            .filter(|r| r.trial == result.trial)
            .map(|r| r.terminal_value)
            .sum();
        assert_eq!(result.terminal_value, parts);
    }
    assert_eq!(portfolio.simulation_results(1).len(), 1_000);
}

#[test]
fn test_cancelled_simulation_stops() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let stats = AnnualizedStats { mean: 0.05, std: 0.2 };
    assert!(simulate_holding("AAPL", 1.0, 1.0, stats, 20, &config(1_000, 1), &cancel).is_err());
}

proptest! {
    #[test]
    fn summary_percentiles_are_ordered(values in proptest::collection::vec(-1e6f64..1e6, 1..300)) {
        let returns: Vec<f64> = values.iter().map(|v| v / 1e4).collect();
        let s = SummaryStatistics::compute(&values, &returns).unwrap();
        prop_assert!(s.min <= s.p5);
        prop_assert!(s.p5 <= s.p25);
        prop_assert!(s.p25 <= s.median);
        prop_assert!(s.median <= s.p75);
        prop_assert!(s.p75 <= s.p95);
        prop_assert!(s.p95 <= s.max);
        prop_assert!(s.std >= 0.0);
    }
}
