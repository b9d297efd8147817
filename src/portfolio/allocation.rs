//! Portfolio definitions: a label and a ticker to allocation mapping.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::error::QuantError;
use crate::core::Result;

/// A named set of holdings with the amount initially allocated to each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub label: String,
    /// Ticker to initial allocation, in declaration order.
    pub holdings: IndexMap<String, f64>,
}

impl Portfolio {
    /// Create a portfolio from (ticker, allocation) pairs.
    pub fn new<I, S>(label: impl Into<String>, holdings: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            label: label.into(),
            holdings: holdings.into_iter().map(|(t, a)| (t.into(), a)).collect(),
        }
    }

    /// Sum of all allocations.
    pub fn initial_value(&self) -> f64 {
        self.holdings.values().sum()
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.holdings.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// Reject empty portfolios and non-positive or non-finite allocations.
    pub fn validate(&self) -> Result<()> {
        if self.holdings.is_empty() {
            return Err(QuantError::invalid_config(format!("portfolio {} has no holdings", self.label)));
        }
        for (ticker, &allocation) in &self.holdings {
            if !allocation.is_finite() || allocation <= 0.0 {
                return Err(QuantError::invalid_config(format!(
                    "portfolio {}: allocation for {ticker} must be positive, got {allocation}",
                    self.label
                )));
            }
        }
        Ok(())
    }
}
