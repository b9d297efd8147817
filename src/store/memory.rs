//! In-process storage backend.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::records::FeatureRecord;
use super::Store;
use crate::core::types::{
    Bar, BarSeries, FeatureSet, PortfolioResult, PriceHistory, RunId, SimulationResult, SimulationRun,
    SummaryStatistic,
};
use crate::core::Result;
use crate::portfolio::PortfolioSimulation;

/// [`Store`] kept in memory. Same insert-if-absent semantics as SQLite.
#[derive(Debug, Default)]
pub struct MemoryStore {
    bars: BTreeMap<String, BTreeMap<NaiveDate, Bar>>,
    features: BTreeMap<String, BTreeMap<NaiveDate, FeatureRecord>>,
    runs: Vec<SimulationRun>,
    simulation_results: Vec<SimulationResult>,
    portfolio_results: Vec<PortfolioResult>,
    summaries: Vec<SummaryStatistic>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn upsert_bars(&mut self, ticker: &str, bars: &[Bar]) -> Result<usize> {
        let stored = self.bars.entry(ticker.to_string()).or_default();
        let before = stored.len();
        for bar in bars {
            stored.entry(bar.date).or_insert(*bar);
        }
        Ok(stored.len() - before)
    }

    fn latest_bar_date(&self, ticker: &str) -> Result<Option<NaiveDate>> {
        Ok(self.bars.get(ticker).and_then(|b| b.keys().next_back().copied()))
    }

    fn load_bars(&self, ticker: &str) -> Result<BarSeries> {
        let bars: Vec<Bar> =
            self.bars.get(ticker).map(|b| b.values().copied().collect()).unwrap_or_default();
        Ok(BarSeries::from_bars(ticker, bars))
    }

    fn upsert_features(&mut self, features: &FeatureSet) -> Result<usize> {
        let stored = self.features.entry(features.ticker.clone()).or_default();
        let before = stored.len();
        for row in &features.rows {
            stored
                .entry(row.bar.date)
                .or_insert_with(|| FeatureRecord::new(&features.ticker, row));
        }
        Ok(stored.len() - before)
    }

    fn feature_count(&self, ticker: &str) -> Result<usize> {
        Ok(self.features.get(ticker).map_or(0, BTreeMap::len))
    }

    fn load_price_history(&self, ticker: &str) -> Result<PriceHistory> {
        let mut history = PriceHistory { ticker: ticker.to_string(), ..Default::default() };
        let mut returns = Vec::new();
        for record in self.features.get(ticker).into_iter().flat_map(BTreeMap::values) {
            history.dates.push(record.date);
            history.closes.push(record.close);
            returns.push(record.daily_return);
        }
        history.returns = Some(returns);
        Ok(history)
    }

    fn persist_run(&mut self, simulation: &PortfolioSimulation) -> Result<SimulationRun> {
        let run_id = self.runs.last().map_or(1, |r| r.run_id + 1);
        let run = SimulationRun {
            run_id,
            portfolio: simulation.label.clone(),
            horizon_years: simulation.horizon_years,
            n_trials: simulation.n_trials,
        };
        self.simulation_results.extend(simulation.simulation_results(run_id));
        self.portfolio_results.extend(simulation.portfolio_results(run_id));
        self.summaries.extend(simulation.summary_statistics(run_id));
        self.runs.push(run.clone());
        Ok(run)
    }

    fn list_runs(&self) -> Result<Vec<SimulationRun>> {
        Ok(self.runs.clone())
    }

    fn load_simulation_results(&self, run_id: RunId) -> Result<Vec<SimulationResult>> {
        Ok(self.simulation_results.iter().filter(|r| r.run_id == run_id).cloned().collect())
    }

    fn load_portfolio_results(&self, run_id: RunId) -> Result<Vec<PortfolioResult>> {
        Ok(self.portfolio_results.iter().filter(|r| r.run_id == run_id).cloned().collect())
    }

    fn load_summary(&self, run_id: RunId) -> Result<Vec<SummaryStatistic>> {
        Ok(self.summaries.iter().filter(|r| r.run_id == run_id).cloned().collect())
    }
}
