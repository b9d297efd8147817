//! Portfolio simulation over stored features.

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::core::error::QuantError;
use crate::core::types::{AnnualizedStats, Price, SimulationRun};
use crate::core::Result;
use crate::metrics::returns::estimate;
use crate::metrics::summary::SummaryStatistics;
use crate::portfolio::{
    simulate_holding, CancellationToken, MissingTrialPolicy, MonteCarloConfig, Portfolio,
    PortfolioSimulation,
};
use crate::store::Store;

/// Starting price and annualized statistics of one ticker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldingInputs {
    pub start_price: Price,
    pub stats: AnnualizedStats,
}

/// A persisted run and its summary.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run: SimulationRun,
    pub initial_value: f64,
    pub summary: SummaryStatistics,
}

/// Read a ticker's stored history and derive its simulation inputs.
pub fn prepare_holding(store: &dyn Store, ticker: &str, trading_days: usize) -> Result<HoldingInputs> {
    let history = store.load_price_history(ticker)?;
    let start_price = history.last_close().ok_or_else(|| QuantError::no_historical_data(ticker))?;
    let stats = estimate(&history, trading_days)?;
    info!(
        ticker,
        start_price,
        mu = stats.mean,
        sigma = stats.std,
        days = history.closes.len(),
        "estimated inputs"
    );
    Ok(HoldingInputs { start_price, stats })
}

/// Simulate every holding of a portfolio in parallel and aggregate.
pub fn simulate_portfolio(
    portfolio: &Portfolio,
    inputs: &IndexMap<String, HoldingInputs>,
    horizon_years: u32,
    config: &MonteCarloConfig,
    policy: MissingTrialPolicy,
    cancel: &CancellationToken,
) -> Result<PortfolioSimulation> {
    info!(
        portfolio = %portfolio.label,
        horizon = horizon_years,
        holdings = portfolio.len(),
        initial_value = portfolio.initial_value(),
        "simulating portfolio"
    );
    let holdings: Vec<(&String, f64)> = portfolio.holdings.iter().map(|(t, &a)| (t, a)).collect();
    let tickers = holdings
        .into_par_iter()
        .map(|(ticker, allocation)| {
            let input =
                inputs.get(ticker).ok_or_else(|| QuantError::no_historical_data(ticker.as_str()))?;
            let HoldingInputs { start_price, stats } = *input;
            simulate_holding(ticker, allocation, start_price, stats, horizon_years, config, cancel)
        })
        .collect::<Result<Vec<_>>>()?;

    PortfolioSimulation::assemble(&portfolio.label, horizon_years, config.n_simulations, tickers, policy)
}

/// Seed for one horizon, so horizons do not replay each other's paths.
fn horizon_seed(seed: Option<u64>, horizon_years: u32) -> Option<u64> {
    seed.map(|s| s.wrapping_add(u64::from(horizon_years).wrapping_mul(0x9e3779b97f4a7c15)))
}

/// Simulate every configured portfolio over every horizon and persist each
/// (portfolio, horizon) as a run.
///
/// A portfolio holding a ticker without usable history is skipped as a
/// whole.
pub fn simulate(
    store: &mut dyn Store,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<Vec<RunReport>> {
    let portfolios = config.portfolios();

    let mut inputs: IndexMap<String, HoldingInputs> = IndexMap::new();
    for ticker in portfolios.iter().flat_map(Portfolio::tickers) {
        if inputs.contains_key(ticker) {
            continue;
        }
        match prepare_holding(store, ticker, config.trading_days_per_year) {
            Ok(input) => {
                inputs.insert(ticker.to_string(), input);
            }
            Err(err) if err.is_ticker_scoped() => warn!(ticker, error = %err, "no simulation inputs"),
            Err(err) => return Err(err),
        }
    }

    let mut reports = Vec::new();
    for &horizon in &config.horizons {
        let mc = MonteCarloConfig { seed: horizon_seed(config.seed, horizon), ..config.monte_carlo() };
        for portfolio in &portfolios {
            if let Some(missing) = portfolio.tickers().find(|t| !inputs.contains_key(*t)) {
                warn!(portfolio = %portfolio.label, ticker = missing, horizon, "skipping portfolio");
                continue;
            }
            let simulation =
                match simulate_portfolio(portfolio, &inputs, horizon, &mc, config.missing_trials, cancel) {
                    Ok(simulation) => simulation,
                    Err(err) if err.is_ticker_scoped() => {
                        warn!(portfolio = %portfolio.label, horizon, error = %err, "skipping portfolio");
                        continue;
                    }
                    Err(err) => return Err(err),
                };
            let run = store.persist_run(&simulation)?;
            info!(
                run_id = run.run_id,
                portfolio = %run.portfolio,
                horizon,
                mean = simulation.summary.mean,
                median = simulation.summary.median,
                p5 = simulation.summary.p5,
                p95 = simulation.summary.p95,
                "simulation complete"
            );
            reports.push(RunReport {
                run,
                initial_value: simulation.initial_value,
                summary: simulation.summary,
            });
        }
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizon_seed() {
        assert_eq!(horizon_seed(None, 10), None);
        assert_ne!(horizon_seed(Some(1), 10), horizon_seed(Some(1), 20));
    }

    #[test]
    fn test_simulate_portfolio_missing_inputs() {
        let portfolio = Portfolio::new("A", [("AAPL", 100.0)]);
        let config = MonteCarloConfig { n_simulations: 4, seed: Some(1), ..Default::default() };
        let err = simulate_portfolio(
            &portfolio,
            &IndexMap::new(),
            1,
            &config,
            MissingTrialPolicy::Fail,
            &CancellationToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, QuantError::NoHistoricalData { .. }));
    }
}
