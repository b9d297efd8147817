//! Summary statistics of a simulated terminal-value distribution.

use serde::{Deserialize, Serialize};

use super::descriptive::{quantile_sorted, sorted_values, RunningStats};
use crate::core::error::QuantError;
use crate::core::types::{RunId, SummaryStatistic};
use crate::core::Result;

/// Distribution summary of terminal values and return percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub p5: f64,
    pub p25: f64,
    pub p75: f64,
    pub p95: f64,
    pub mean_return: f64,
    pub median_return: f64,
    pub std_return: f64,
    pub min_return: f64,
    pub max_return: f64,
}

impl SummaryStatistics {
    /// Summarize terminal values and their return percentages.
    ///
    /// Fails with `EmptyData` when there are no terminal values.
    pub fn compute(terminal_values: &[f64], return_pcts: &[f64]) -> Result<Self> {
        let values = sorted_values(terminal_values);
        if values.is_empty() {
            return Err(QuantError::empty_data("summary statistics"));
        }
        let returns = sorted_values(return_pcts);

        let value_stats: RunningStats = values.iter().copied().collect();
        let return_stats: RunningStats = returns.iter().copied().collect();

        Ok(Self {
            mean: value_stats.mean(),
            median: quantile_sorted(&values, 0.5),
            std: value_stats.std(),
            min: value_stats.min(),
            max: value_stats.max(),
            p5: quantile_sorted(&values, 0.05),
            p25: quantile_sorted(&values, 0.25),
            p75: quantile_sorted(&values, 0.75),
            p95: quantile_sorted(&values, 0.95),
            mean_return: return_stats.mean(),
            median_return: quantile_sorted(&returns, 0.5),
            std_return: return_stats.std(),
            min_return: return_stats.min(),
            max_return: return_stats.max(),
        })
    }

    /// Metric name/value pairs in storage order.
    pub fn metrics(&self) -> [(&'static str, f64); 14] {
        [
            ("mean", self.mean),
            ("median", self.median),
            ("std", self.std),
            ("min", self.min),
            ("max", self.max),
            ("p5", self.p5),
            ("p25", self.p25),
            ("p75", self.p75),
            ("p95", self.p95),
            ("mean_return", self.mean_return),
            ("median_return", self.median_return),
            ("std_return", self.std_return),
            ("min_return", self.min_return),
            ("max_return", self.max_return),
        ]
    }

    /// Flatten into one row per metric.
    pub fn to_statistics(&self, run_id: RunId, portfolio: &str) -> Vec<SummaryStatistic> {
        self.metrics()
            .iter()
            .map(|&(metric, value)| SummaryStatistic {
                run_id,
                portfolio: portfolio.to_string(),
                metric: metric.to_string(),
                value,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute() {
        let values: Vec<f64> = (1..=101).map(|v| v as f64).collect();
        let returns: Vec<f64> = values.iter().map(|v| v - 51.0).collect();
        let summary = SummaryStatistics::compute(&values, &returns).unwrap();

        assert!((summary.mean - 51.0).abs() < 1e-12);
        assert_eq!(summary.median, 51.0);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 101.0);
        assert!((summary.p5 - 6.0).abs() < 1e-12);
        assert!((summary.p95 - 96.0).abs() < 1e-12);
        assert!(summary.mean_return.abs() < 1e-12);
        assert_eq!(summary.median_return, 0.0);
    }

    #[test]
    fn test_empty() {
        assert!(SummaryStatistics::compute(&[], &[]).is_err());
    }

    #[test]
    fn test_flatten() {
        let summary = SummaryStatistics::compute(&[1.0, 2.0], &[0.0, 100.0]).unwrap();
        let rows = summary.to_statistics(7, "A");
        assert_eq!(rows.len(), 14);
        assert_eq!(rows[0].metric, "mean");
        assert_eq!(rows[13].metric, "max_return");
        assert!(rows.iter().all(|r| r.run_id == 7 && r.portfolio == "A"));
    }
}
