//! Batch workflows over many tickers and portfolios.
//!
//! Each stage processes tickers independently. Failures that only concern
//! one ticker are logged and collected in a [`BatchReport`]; anything else
//! (storage, cancellation, configuration) aborts the batch.

pub mod ingest;
pub mod simulate;
pub mod transform;

use serde::Serialize;
use tracing::warn;

use crate::core::error::QuantError;
use crate::core::Result;

pub use ingest::{ingest, ingest_window};
pub use simulate::{prepare_holding, simulate, simulate_portfolio, HoldingInputs, RunReport};
pub use transform::{process_csv_dir, transform, transform_ticker};

/// A unit of work that completed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Processed {
    pub name: String,
    pub rows: usize,
}

/// A unit of work that was skipped.
#[derive(Debug)]
pub struct Skipped {
    pub name: String,
    pub error: QuantError,
}

/// Outcome of a batch stage.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: Vec<Processed>,
    pub skipped: Vec<Skipped>,
}

impl BatchReport {
    /// Record one unit's result. Errors that are not scoped to the unit are
    /// returned so the caller aborts the batch.
    pub fn record(&mut self, name: impl Into<String>, result: Result<usize>) -> Result<()> {
        let name = name.into();
        match result {
            Ok(rows) => self.processed.push(Processed { name, rows }),
            Err(error) if error.is_ticker_scoped() => {
                warn!(name = %name, error = %error, "skipped");
                self.skipped.push(Skipped { name, error });
            }
            Err(error) => return Err(error),
        }
        Ok(())
    }

    pub fn total_rows(&self) -> usize {
        self.processed.iter().map(|p| p.rows).sum()
    }

    pub fn is_skipped(&self, name: &str) -> bool {
        self.skipped.iter().any(|s| s.name == name)
    }
}
