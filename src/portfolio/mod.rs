//! Forward simulation of portfolios.

pub mod aggregate;
pub mod allocation;
pub mod monte_carlo;

pub use aggregate::{aggregate, MissingTrialPolicy, PortfolioSimulation, PortfolioTrial};
pub use allocation::Portfolio;
pub use monte_carlo::{
    simulate_holding, CancellationToken, GbmStep, MonteCarloConfig, TickerSimulation, TrialOutcome,
};
