//! PyO3 function bindings for quantsim.

use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::core::types::AnnualizedStats;
use crate::indicators;
use crate::metrics::returns::annualize;
use crate::metrics::summary::SummaryStatistics;
use crate::portfolio::monte_carlo::return_pct;
use crate::portfolio::{simulate_holding, CancellationToken, MonteCarloConfig};

use super::numpy_bridge::*;

/// Relative Strength Index.
#[pyfunction]
pub fn rsi<'py>(
    py: Python<'py>,
    data: PyReadonlyArray1<f64>,
    period: usize,
) -> PyResult<&'py PyArray1<f64>> {
    let vec = numpy_to_vec_f64(data);
    let result = indicators::momentum::rsi(&vec, period)?;
    Ok(vec_to_numpy_f64(py, result))
}

/// Rolling mean over a fixed window.
#[pyfunction]
pub fn rolling_mean<'py>(
    py: Python<'py>,
    data: PyReadonlyArray1<f64>,
    window: usize,
) -> PyResult<&'py PyArray1<f64>> {
    let vec = numpy_to_vec_f64(data);
    let result = indicators::rolling::rolling_mean(&vec, window)?;
    Ok(vec_to_numpy_f64(py, result))
}

/// Rolling sample standard deviation over a fixed window.
#[pyfunction]
pub fn rolling_std<'py>(
    py: Python<'py>,
    data: PyReadonlyArray1<f64>,
    window: usize,
) -> PyResult<&'py PyArray1<f64>> {
    let vec = numpy_to_vec_f64(data);
    let result = indicators::rolling::rolling_std(&vec, window)?;
    Ok(vec_to_numpy_f64(py, result))
}

/// Annualized (mean, std) of daily returns.
#[pyfunction]
#[pyo3(signature = (returns, trading_days=252))]
pub fn annualize_returns(returns: PyReadonlyArray1<f64>, trading_days: usize) -> PyResult<(f64, f64)> {
    let vec = numpy_to_vec_f64(returns);
    let stats = annualize(&vec, trading_days)
        .ok_or_else(|| pyo3::exceptions::PyValueError::new_err("no defined returns"))?;
    Ok((stats.mean, stats.std))
}

/// Terminal values of a single holding simulated under GBM.
#[pyfunction]
#[pyo3(signature = (
    initial_value,
    start_price,
    mu,
    sigma,
    years,
    n_simulations=10000,
    trading_days=252,
    seed=None,
    ticker="ASSET"
))]
#[allow(clippy::too_many_arguments)]
pub fn simulate_terminal_values<'py>(
    py: Python<'py>,
    initial_value: f64,
    start_price: f64,
    mu: f64,
    sigma: f64,
    years: u32,
    n_simulations: usize,
    trading_days: usize,
    seed: Option<u64>,
    ticker: &str,
) -> PyResult<&'py PyArray1<f64>> {
    let config = MonteCarloConfig { n_simulations, trading_days_per_year: trading_days, seed };
    let stats = AnnualizedStats { mean: mu, std: sigma };
    let ticker = ticker.to_string();

    let simulation = py.allow_threads(|| {
        let cancel = CancellationToken::new();
        simulate_holding(&ticker, initial_value, start_price, stats, years, &config, &cancel)
    })?;
    Ok(vec_to_numpy_f64(py, simulation.terminal_values()))
}

/// Summary statistics of terminal values against an initial value.
#[pyfunction]
pub fn summarize<'py>(
    py: Python<'py>,
    terminal_values: PyReadonlyArray1<f64>,
    initial_value: f64,
) -> PyResult<&'py PyDict> {
    let values = numpy_to_vec_f64(terminal_values);
    let returns: Vec<f64> = values.iter().map(|&v| return_pct(initial_value, v)).collect();
    let summary = SummaryStatistics::compute(&values, &returns)?;

    let dict = PyDict::new(py);
    for (name, value) in summary.metrics() {
        dict.set_item(name, value)?;
    }
    Ok(dict)
}
