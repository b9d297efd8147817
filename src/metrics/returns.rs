//! Annualized drift and volatility from daily returns.

use super::descriptive::RunningStats;
use crate::core::error::QuantError;
use crate::core::types::{AnnualizedStats, PriceHistory};
use crate::core::Result;
use crate::indicators::pct_change;

/// Trading days in a year, used for annualization and the simulation step.
pub const TRADING_DAYS_PER_YEAR: usize = 252;

/// Daily returns of a history.
///
/// Stored returns are used when at least one of them is defined; otherwise
/// returns are derived from the closes and the undefined first change is
/// dropped.
pub fn daily_returns(history: &PriceHistory) -> Vec<f64> {
    if let Some(stored) = &history.returns {
        if stored.iter().any(|r| !r.is_nan()) {
            return stored.iter().copied().filter(|r| !r.is_nan()).collect();
        }
    }
    pct_change(&history.closes, 1).into_iter().filter(|r| !r.is_nan()).collect()
}

/// Annualize daily returns: `mean * days`, `std * sqrt(days)`.
///
/// `None` when there is no defined return.
pub fn annualize(returns: &[f64], trading_days: usize) -> Option<AnnualizedStats> {
    let stats: RunningStats = returns.iter().copied().collect();
    if stats.count() == 0 {
        return None;
    }
    let days = trading_days as f64;
    Some(AnnualizedStats { mean: stats.mean() * days, std: stats.std() * days.sqrt() })
}

/// Estimate a ticker's annualized statistics from its persisted history.
///
/// Fails with `NoHistoricalData` when no daily return can be derived.
pub fn estimate(history: &PriceHistory, trading_days: usize) -> Result<AnnualizedStats> {
    if trading_days == 0 {
        return Err(QuantError::invalid_parameter("trading days per year must be > 0"));
    }
    annualize(&daily_returns(history), trading_days)
        .ok_or_else(|| QuantError::no_historical_data(&history.ticker))
}
