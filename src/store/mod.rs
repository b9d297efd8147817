//! Persistence of bars, features and simulation runs.
//!
//! [`SqliteStore`] is the durable backend; [`MemoryStore`] keeps everything in
//! process and is used by tests and dry runs. Every write operation is one
//! unit of work: it either lands completely or not at all.

pub mod memory;
pub mod records;
pub mod sqlite;

use chrono::NaiveDate;

use crate::core::types::{
    Bar, BarSeries, FeatureSet, PortfolioResult, PriceHistory, RunId, SimulationResult, SimulationRun,
    SummaryStatistic,
};
use crate::core::Result;
use crate::portfolio::PortfolioSimulation;

pub use memory::MemoryStore;
pub use records::{BarRecord, FeatureRecord};
pub use sqlite::SqliteStore;

/// Storage backend used by the pipeline.
pub trait Store {
    /// Insert raw bars, skipping dates already stored. Returns rows inserted.
    fn upsert_bars(&mut self, ticker: &str, bars: &[Bar]) -> Result<usize>;

    /// Date of the most recent raw bar.
    fn latest_bar_date(&self, ticker: &str) -> Result<Option<NaiveDate>>;

    /// All raw bars of a ticker in date order.
    fn load_bars(&self, ticker: &str) -> Result<BarSeries>;

    /// Insert feature rows, skipping (ticker, date) pairs already stored.
    /// Returns rows inserted.
    fn upsert_features(&mut self, features: &FeatureSet) -> Result<usize>;

    fn feature_count(&self, ticker: &str) -> Result<usize>;

    /// Date-ordered closes and stored daily returns from the feature rows.
    fn load_price_history(&self, ticker: &str) -> Result<PriceHistory>;

    /// Store a portfolio simulation as a new run with all of its rows.
    fn persist_run(&mut self, simulation: &PortfolioSimulation) -> Result<SimulationRun>;

    fn list_runs(&self) -> Result<Vec<SimulationRun>>;

    fn load_simulation_results(&self, run_id: RunId) -> Result<Vec<SimulationResult>>;

    fn load_portfolio_results(&self, run_id: RunId) -> Result<Vec<PortfolioResult>>;

    fn load_summary(&self, run_id: RunId) -> Result<Vec<SummaryStatistic>>;
}
