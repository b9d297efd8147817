//! Monte Carlo forward simulation of a single holding.
//!
//! Uses Geometric Brownian Motion with a one-trading-day step. Trials are
//! independent and parallelized via Rayon; every trial owns a random stream
//! keyed by (seed, ticker, trial index), so a seeded run gives the same
//! outcomes whatever the thread count.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::QuantError;
use crate::core::types::{AnnualizedStats, Price};
use crate::core::Result;
use crate::metrics::returns::TRADING_DAYS_PER_YEAR;

/// Steps between cancellation checks inside one trial.
const CANCEL_CHECK_INTERVAL: usize = 4096;

/// Configuration for Monte Carlo simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloConfig {
    pub n_simulations: usize,
    pub trading_days_per_year: usize,
    /// Base seed. `None` draws one from the OS entropy source.
    pub seed: Option<u64>,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self { n_simulations: 10_000, trading_days_per_year: TRADING_DAYS_PER_YEAR, seed: None }
    }
}

/// Shared flag for cooperative cancellation of long simulations.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Running trials stop at their next check.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-step GBM constants in log space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GbmStep {
    /// `(mu - sigma^2 / 2) * dt`
    pub drift: f64,
    /// `sigma * sqrt(dt)`
    pub diffusion: f64,
}

impl GbmStep {
    pub fn new(stats: AnnualizedStats, dt: f64) -> Self {
        let sigma = stats.std;
        Self { drift: (stats.mean - 0.5 * sigma * sigma) * dt, diffusion: sigma * dt.sqrt() }
    }

    /// Log price increment for one standard-normal shock.
    #[inline]
    pub fn log_increment(&self, z: f64) -> f64 {
        self.drift + self.diffusion * z
    }
}

/// One trial's outcome for a single holding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    /// 1-based trial index.
    pub trial: usize,
    pub terminal_value: f64,
    pub return_pct: f64,
}

/// All trials of one holding over one horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerSimulation {
    pub ticker: String,
    pub initial_value: f64,
    pub start_price: Price,
    pub stats: AnnualizedStats,
    pub horizon_years: u32,
    /// Ordered by trial index, 1..=N.
    pub trials: Vec<TrialOutcome>,
}

impl TickerSimulation {
    pub fn terminal_values(&self) -> Vec<f64> {
        self.trials.iter().map(|t| t.terminal_value).collect()
    }
}

/// Return percent of a terminal value against its initial value.
#[inline]
pub fn return_pct(initial: f64, terminal: f64) -> f64 {
    (terminal - initial) / initial * 100.0
}

fn fnv1a(text: &str) -> u64 {
    text.bytes().fold(0xcbf29ce484222325, |h, b| (h ^ b as u64).wrapping_mul(0x100000001b3))
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e3779b97f4a7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// Seed of the random stream for one trial of one ticker.
pub fn stream_seed(seed: u64, ticker: &str, trial: usize) -> u64 {
    splitmix64(splitmix64(seed ^ fnv1a(ticker)) ^ trial as u64)
}

/// Accumulated log growth of one trial.
fn run_trial(
    rng: &mut Xoshiro256PlusPlus,
    steps: usize,
    step: GbmStep,
    cancel: &CancellationToken,
) -> Result<f64> {
    let mut log_growth = 0.0;
    for t in 0..steps {
        if t % CANCEL_CHECK_INTERVAL == CANCEL_CHECK_INTERVAL - 1 && cancel.is_cancelled() {
            return Err(QuantError::Cancelled);
        }
        let z: f64 = StandardNormal.sample(rng);
        log_growth += step.log_increment(z);
    }
    Ok(log_growth)
}

fn validate_inputs(
    ticker: &str,
    initial_value: f64,
    start_price: Price,
    stats: AnnualizedStats,
    config: &MonteCarloConfig,
) -> Result<()> {
    if config.n_simulations == 0 {
        return Err(QuantError::invalid_parameter("number of simulations must be > 0"));
    }
    if config.trading_days_per_year == 0 {
        return Err(QuantError::invalid_parameter("trading days per year must be > 0"));
    }
    if !start_price.is_finite() || start_price <= 0.0 {
        return Err(QuantError::simulation_input(
            ticker,
            format!("starting price must be positive, got {start_price}"),
        ));
    }
    if !initial_value.is_finite() || initial_value <= 0.0 {
        return Err(QuantError::simulation_input(
            ticker,
            format!("initial allocation must be positive, got {initial_value}"),
        ));
    }
    if !stats.mean.is_finite() || !stats.std.is_finite() || stats.std < 0.0 {
        return Err(QuantError::simulation_input(
            ticker,
            format!("degenerate drift/volatility ({}, {})", stats.mean, stats.std),
        ));
    }
    Ok(())
}

/// Simulate terminal values of one holding.
///
/// Buys `initial_value / start_price` shares at the starting price and steps
/// the price `horizon_years * trading_days_per_year` days with
/// `S(t+dt) = S(t) * exp((mu - sigma^2/2) dt + sigma sqrt(dt) Z)`.
///
/// # Arguments
/// * `ticker` - Ticker label, also part of the random stream key
/// * `initial_value` - Amount allocated to the holding
/// * `start_price` - Most recent historical close
/// * `stats` - Annualized drift and volatility
/// * `horizon_years` - Simulation horizon
/// * `config` - Simulation configuration
/// * `cancel` - Cooperative cancellation flag
pub fn simulate_holding(
    ticker: &str,
    initial_value: f64,
    start_price: Price,
    stats: AnnualizedStats,
    horizon_years: u32,
    config: &MonteCarloConfig,
    cancel: &CancellationToken,
) -> Result<TickerSimulation> {
    validate_inputs(ticker, initial_value, start_price, stats, config)?;

    let seed = config.seed.unwrap_or_else(rand::random);
    let steps = horizon_years as usize * config.trading_days_per_year;
    let step = GbmStep::new(stats, 1.0 / config.trading_days_per_year as f64);
    let shares = initial_value / start_price;

    debug!(ticker, steps, n = config.n_simulations, mu = stats.mean, sigma = stats.std, "simulating holding");

    let trials = (1..=config.n_simulations)
        .into_par_iter()
        .map(|trial| {
            if cancel.is_cancelled() {
                return Err(QuantError::Cancelled);
            }
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(stream_seed(seed, ticker, trial));
            let log_growth = run_trial(&mut rng, steps, step, cancel)?;
            let terminal_value = shares * (start_price * log_growth.exp());
            Ok(TrialOutcome {
                trial,
                terminal_value,
                return_pct: return_pct(initial_value, terminal_value),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TickerSimulation {
        ticker: ticker.to_string(),
        initial_value,
        start_price,
        stats,
        horizon_years,
        trials,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(n: usize) -> MonteCarloConfig {
        MonteCarloConfig { n_simulations: n, seed: Some(42), ..Default::default() }
    }

    fn stats(mean: f64, std: f64) -> AnnualizedStats {
        AnnualizedStats { mean, std }
    }

    #[test]
    fn test_zero_volatility_zero_drift() {
        let cancel = CancellationToken::new();
        let sim =
            simulate_holding("AAA", 125_000.0, 37.5, stats(0.0, 0.0), 20, &config(50), &cancel).unwrap();
        for t in &sim.trials {
            assert!((t.terminal_value - 125_000.0).abs() < 1e-6);
            assert!(t.return_pct.abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_volatility_is_deterministic() {
        let cancel = CancellationToken::new();
        let sim = simulate_holding("AAA", 100.0, 100.0, stats(0.1, 0.0), 2, &config(5), &cancel).unwrap();
        let expected = 100.0 * (0.1f64 / 252.0 * 504.0).exp();
        for t in &sim.trials {
            assert!((t.terminal_value - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_trial_indices_contiguous() {
        let cancel = CancellationToken::new();
        let sim = simulate_holding("AAA", 100.0, 10.0, stats(0.05, 0.2), 1, &config(257), &cancel).unwrap();
        let indices: Vec<usize> = sim.trials.iter().map(|t| t.trial).collect();
        assert_eq!(indices, (1..=257).collect::<Vec<_>>());
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let cancel = CancellationToken::new();
        let a = simulate_holding("AAA", 100.0, 10.0, stats(0.05, 0.2), 1, &config(64), &cancel).unwrap();
        let b = simulate_holding("AAA", 100.0, 10.0, stats(0.05, 0.2), 1, &config(64), &cancel).unwrap();
        assert_eq!(a.trials, b.trials);
    }

    #[test]
    fn test_tickers_use_distinct_streams() {
        let cancel = CancellationToken::new();
        let a = simulate_holding("AAA", 100.0, 10.0, stats(0.05, 0.2), 1, &config(8), &cancel).unwrap();
        let b = simulate_holding("BBB", 100.0, 10.0, stats(0.05, 0.2), 1, &config(8), &cancel).unwrap();
        assert_ne!(a.terminal_values(), b.terminal_values());
    }

    #[test]
    fn test_invalid_start_price() {
        let cancel = CancellationToken::new();
        for price in [0.0, -1.0, f64::NAN] {
            let err =
                simulate_holding("AAA", 100.0, price, stats(0.05, 0.2), 1, &config(4), &cancel).unwrap_err();
            assert!(matches!(err, QuantError::SimulationInput { .. }));
        }
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err =
            simulate_holding("AAA", 100.0, 10.0, stats(0.05, 0.2), 1, &config(16), &cancel).unwrap_err();
        assert!(matches!(err, QuantError::Cancelled));
    }

    #[test]
    fn test_cancel_checked_inside_trial() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let step = GbmStep::new(stats(0.05, 0.2), 1.0 / 252.0);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        assert!(run_trial(&mut rng, CANCEL_CHECK_INTERVAL - 1, step, &cancel).is_ok());

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let err = run_trial(&mut rng, 3 * CANCEL_CHECK_INTERVAL, step, &cancel).unwrap_err();
        assert!(matches!(err, QuantError::Cancelled));
    }

    #[test]
    fn test_cancelled_while_running() {
        let cancel = CancellationToken::new();
        // 400 years of daily steps per trial keeps the run busy well past the cancel.
        let err = std::thread::scope(|scope| {
            let run = scope.spawn(|| {
                simulate_holding("AAA", 100.0, 10.0, stats(0.05, 0.2), 400, &config(4_000), &cancel)
            });
            std::thread::sleep(std::time::Duration::from_millis(20));
            cancel.cancel();
            run.join().unwrap()
        })
        .unwrap_err();
        assert!(matches!(err, QuantError::Cancelled));
    }

    #[test]
    fn test_gbm_step() {
        let step = GbmStep::new(stats(0.08, 0.2), 1.0 / 252.0);
        assert!((step.drift - (0.08 - 0.02) / 252.0).abs() < 1e-15);
        assert!((step.diffusion - 0.2 / 252f64.sqrt()).abs() < 1e-15);
        assert_eq!(step.log_increment(0.0), step.drift);
    }
}
