//! Portfolio aggregation of per-ticker simulation trials.
//!
//! Trials of different tickers are matched by trial index and summed. This
//! is the join point after the tickers of a portfolio were simulated.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::monte_carlo::{return_pct, TickerSimulation};
use crate::core::error::QuantError;
use crate::core::types::{PortfolioResult, RunId, SimulationResult, SummaryStatistic};
use crate::core::Result;
use crate::metrics::summary::SummaryStatistics;

/// What to do when a ticker has no outcome for a trial index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingTrialPolicy {
    /// Fail with `TrialMisaligned`.
    #[default]
    Fail,
    /// Count the missing outcome as a terminal value of 0.
    #[serde(rename = "zero")]
    TreatAsZero,
}

/// One trial of a whole portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTrial {
    /// 1-based trial index.
    pub trial: usize,
    pub terminal_value: f64,
    pub return_pct: f64,
}

/// Terminal values of one ticker by trial slot (index - 1).
///
/// A duplicated index or one outside 1..=n_trials is misaligned under any
/// policy; only absent slots are left to the policy.
fn index_trials(sim: &TickerSimulation, n_trials: usize) -> Result<Vec<Option<f64>>> {
    let mut slots = vec![None; n_trials];
    for outcome in &sim.trials {
        match outcome.trial.checked_sub(1).and_then(|i| slots.get_mut(i)) {
            Some(slot) if slot.is_none() => *slot = Some(outcome.terminal_value),
            _ => {
                return Err(QuantError::TrialMisaligned { ticker: sim.ticker.clone(), trial: outcome.trial });
            }
        }
    }
    Ok(slots)
}

/// Sum per-ticker terminal values for every trial index in 1..=n_trials.
///
/// Return percent is relative to the sum of the tickers' initial values.
pub fn aggregate(
    tickers: &[TickerSimulation],
    n_trials: usize,
    policy: MissingTrialPolicy,
) -> Result<Vec<PortfolioTrial>> {
    if tickers.is_empty() {
        return Err(QuantError::empty_data("portfolio aggregation"));
    }
    let initial_value: f64 = tickers.iter().map(|t| t.initial_value).sum();
    let slots = tickers.iter().map(|sim| index_trials(sim, n_trials)).collect::<Result<Vec<_>>>()?;
    let mut missing = vec![0usize; tickers.len()];

    let mut trials = Vec::with_capacity(n_trials);
    for trial in 1..=n_trials {
        let mut terminal_value = 0.0;
        for (i, sim) in tickers.iter().enumerate() {
            match slots[i][trial - 1] {
                Some(value) => terminal_value += value,
                None if policy == MissingTrialPolicy::TreatAsZero => missing[i] += 1,
                None => {
                    return Err(QuantError::TrialMisaligned { ticker: sim.ticker.clone(), trial });
                }
            }
        }
        trials.push(PortfolioTrial {
            trial,
            terminal_value,
            return_pct: return_pct(initial_value, terminal_value),
        });
    }

    for (sim, &count) in tickers.iter().zip(&missing) {
        if count > 0 {
            warn!(ticker = %sim.ticker, missing = count, "missing trials counted as zero");
        }
    }
    Ok(trials)
}

/// A simulated portfolio over one horizon, ready to be persisted.
#[derive(Debug, Clone)]
pub struct PortfolioSimulation {
    pub label: String,
    pub horizon_years: u32,
    pub n_trials: usize,
    pub initial_value: f64,
    pub tickers: Vec<TickerSimulation>,
    pub trials: Vec<PortfolioTrial>,
    pub summary: SummaryStatistics,
}

impl PortfolioSimulation {
    /// Aggregate ticker simulations and summarize the portfolio trials.
    pub fn assemble(
        label: impl Into<String>,
        horizon_years: u32,
        n_trials: usize,
        tickers: Vec<TickerSimulation>,
        policy: MissingTrialPolicy,
    ) -> Result<Self> {
        let trials = aggregate(&tickers, n_trials, policy)?;
        let terminal: Vec<f64> = trials.iter().map(|t| t.terminal_value).collect();
        let returns: Vec<f64> = trials.iter().map(|t| t.return_pct).collect();
        let summary = SummaryStatistics::compute(&terminal, &returns)?;

        Ok(Self {
            label: label.into(),
            horizon_years,
            n_trials,
            initial_value: tickers.iter().map(|t| t.initial_value).sum(),
            tickers,
            trials,
            summary,
        })
    }

    /// Per-ticker rows for a run.
    pub fn simulation_results(&self, run_id: RunId) -> Vec<SimulationResult> {
        self.tickers
            .iter()
            .flat_map(|sim| {
                sim.trials.iter().map(move |t| SimulationResult {
                    run_id,
                    ticker: sim.ticker.clone(),
                    initial_value: sim.initial_value,
                    terminal_value: t.terminal_value,
                    return_pct: t.return_pct,
                    trial: t.trial,
                })
            })
            .collect()
    }

    /// Portfolio-level rows for a run.
    pub fn portfolio_results(&self, run_id: RunId) -> Vec<PortfolioResult> {
        self.trials
            .iter()
            .map(|t| PortfolioResult {
                run_id,
                portfolio: self.label.clone(),
                terminal_value: t.terminal_value,
                return_pct: t.return_pct,
                trial: t.trial,
            })
            .collect()
    }

    pub fn summary_statistics(&self, run_id: RunId) -> Vec<SummaryStatistic> {
        self.summary.to_statistics(run_id, &self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::AnnualizedStats;
    use crate::portfolio::monte_carlo::TrialOutcome;

    fn sim(ticker: &str, initial: f64, terminals: &[(usize, f64)]) -> TickerSimulation {
        TickerSimulation {
            ticker: ticker.to_string(),
            initial_value: initial,
            start_price: 10.0,
            stats: AnnualizedStats { mean: 0.0, std: 0.0 },
            horizon_years: 1,
            trials: terminals
                .iter()
                .map(|&(trial, v)| TrialOutcome {
                    trial,
                    terminal_value: v,
                    return_pct: return_pct(initial, v),
                })
                .collect(),
        }
    }

    #[test]
    fn test_sums_by_trial_index() {
        let a = sim("AAA", 100.0, &[(1, 110.0), (2, 90.0)]);
        let b = sim("BBB", 100.0, &[(1, 100.0), (2, 130.0)]);
        let trials = aggregate(&[a, b], 2, MissingTrialPolicy::Fail).unwrap();
        assert_eq!(trials[0].terminal_value, 210.0);
        assert_eq!(trials[1].terminal_value, 220.0);
        assert!((trials[1].return_pct - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_matches_out_of_order_trials() {
        let a = sim("AAA", 100.0, &[(2, 90.0), (1, 110.0)]);
        let trials = aggregate(&[a], 2, MissingTrialPolicy::Fail).unwrap();
        assert_eq!(trials[0].terminal_value, 110.0);
        assert_eq!(trials[1].terminal_value, 90.0);
    }

    #[test]
    fn test_missing_trial_fails_by_default() {
        let a = sim("AAA", 100.0, &[(1, 110.0), (2, 90.0)]);
        let b = sim("BBB", 100.0, &[(1, 100.0)]);
        let err = aggregate(&[a, b], 2, MissingTrialPolicy::Fail).unwrap_err();
        match err {
            QuantError::TrialMisaligned { ticker, trial } => {
                assert_eq!(ticker, "BBB");
                assert_eq!(trial, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_trial_rejected() {
        let a = sim("AAA", 100.0, &[(1, 110.0), (2, 90.0)]);
        let b = sim("BBB", 100.0, &[(1, 100.0), (2, 130.0), (2, 120.0)]);
        for policy in [MissingTrialPolicy::Fail, MissingTrialPolicy::TreatAsZero] {
            let err = aggregate(&[a.clone(), b.clone()], 2, policy).unwrap_err();
            assert!(matches!(err, QuantError::TrialMisaligned { ref ticker, trial: 2 } if ticker == "BBB"));
        }
    }

    #[test]
    fn test_surplus_trial_rejected() {
        let a = sim("AAA", 100.0, &[(1, 110.0), (2, 90.0)]);
        let b = sim("BBB", 100.0, &[(1, 100.0), (2, 130.0), (3, 120.0)]);
        let err = aggregate(&[a, b], 2, MissingTrialPolicy::Fail).unwrap_err();
        assert!(matches!(err, QuantError::TrialMisaligned { ref ticker, trial: 3 } if ticker == "BBB"));
    }

    #[test]
    fn test_zero_trial_index_rejected() {
        let a = sim("AAA", 100.0, &[(0, 110.0), (1, 90.0)]);
        let err = aggregate(&[a], 2, MissingTrialPolicy::TreatAsZero).unwrap_err();
        assert!(matches!(err, QuantError::TrialMisaligned { trial: 0, .. }));
    }

    #[test]
    fn test_missing_trial_as_zero() {
        let a = sim("AAA", 100.0, &[(1, 110.0), (2, 90.0)]);
        let b = sim("BBB", 100.0, &[(1, 100.0)]);
        let trials = aggregate(&[a, b], 2, MissingTrialPolicy::TreatAsZero).unwrap();
        assert_eq!(trials[1].terminal_value, 90.0);
        assert!((trials[1].return_pct + 55.0).abs() < 1e-12);
    }

    #[test]
    fn test_assemble_projections() {
        let a = sim("AAA", 100.0, &[(1, 110.0), (2, 90.0), (3, 100.0)]);
        let b = sim("BBB", 50.0, &[(1, 50.0), (2, 60.0), (3, 40.0)]);
        let p = PortfolioSimulation::assemble("A", 10, 3, vec![a, b], MissingTrialPolicy::Fail).unwrap();
        assert_eq!(p.initial_value, 150.0);
        assert_eq!(p.simulation_results(9).len(), 6);
        let portfolio = p.portfolio_results(9);
        assert_eq!(portfolio.iter().map(|r| r.trial).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(p.summary_statistics(9).len(), 14);
        assert_eq!(p.summary.median, 150.0);
    }

    #[test]
    fn test_policy_serde_names() {
        let fail: MissingTrialPolicy = serde_json::from_str("\"fail\"").unwrap();
        let zero: MissingTrialPolicy = serde_json::from_str("\"zero\"").unwrap();
        assert_eq!(fail, MissingTrialPolicy::Fail);
        assert_eq!(zero, MissingTrialPolicy::TreatAsZero);
    }
}
