// Suppress warning from PyO3 macro expansion (fixed in newer PyO3 versions)
#![cfg_attr(feature = "python", allow(non_local_definitions))]

//! quantsim - market data feature engineering and Monte Carlo portfolio
//! simulation.
//!
//! This crate provides:
//! - Technical indicators (rolling statistics, moving-average ratios, RSI, ROC)
//! - Feature engineering from daily OHLCV bars
//! - Annualized drift/volatility estimation from stored history
//! - Parallel Geometric Brownian Motion simulation per holding
//! - Portfolio aggregation and summary statistics
//! - SQLite persistence and batch pipelines

pub mod config;
pub mod core;
pub mod data;
pub mod features;
pub mod indicators;
pub mod metrics;
pub mod pipeline;
pub mod portfolio;
pub mod store;

#[cfg(feature = "python")]
pub mod python;

pub use crate::config::Config;
pub use crate::core::{QuantError, Result};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module entry point
#[cfg(feature = "python")]
#[pymodule]
fn _quantsim(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    // Indicators
    m.add_function(wrap_pyfunction!(python::bindings::rsi, m)?)?;
    m.add_function(wrap_pyfunction!(python::bindings::rolling_mean, m)?)?;
    m.add_function(wrap_pyfunction!(python::bindings::rolling_std, m)?)?;

    // Estimation and simulation
    m.add_function(wrap_pyfunction!(python::bindings::annualize_returns, m)?)?;
    m.add_function(wrap_pyfunction!(python::bindings::simulate_terminal_values, m)?)?;
    m.add_function(wrap_pyfunction!(python::bindings::summarize, m)?)?;

    Ok(())
}
