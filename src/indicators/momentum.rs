//! Momentum indicators: RSI, rate of change.

use super::change::pct_change;
use crate::core::error::QuantError;
use crate::core::Result;

/// Relative Strength Index (RSI) with Wilder smoothing.
///
/// Average gain and loss are exponentially weighted with `alpha = 1 / period`
/// using normalised weights, i.e. at every step
/// `avg = sum((1 - alpha)^k * x[t-k]) / sum((1 - alpha)^k)`.
/// A value is produced once `period` price changes have been observed, so the
/// first `period` positions are NaN. An average loss of zero gives 100.
///
/// # Arguments
/// * `data` - Price data (typically close prices)
/// * `period` - Lookback period (14, 30, 50 in the feature set)
///
/// # Returns
/// Vector of RSI values (0-100 scale, NaN for warmup period)
pub fn rsi(data: &[f64], period: usize) -> Result<Vec<f64>> {
    if period == 0 {
        return Err(QuantError::invalid_parameter("RSI period must be > 0"));
    }

    let n = data.len();
    let mut result = vec![f64::NAN; n];
    if n < 2 {
        return Ok(result);
    }

    let decay = 1.0 - 1.0 / period as f64;
    let mut gain_num = 0.0;
    let mut loss_num = 0.0;
    let mut weight = 0.0;
    let mut observed = 0usize;

    for i in 1..n {
        let change = data[i] - data[i - 1];

        if change.is_nan() {
            // Weights follow absolute positions, so a gap still ages the history.
            gain_num *= decay;
            loss_num *= decay;
            weight *= decay;
        } else {
            gain_num = change.max(0.0) + decay * gain_num;
            loss_num = (-change).max(0.0) + decay * loss_num;
            weight = 1.0 + decay * weight;
            observed += 1;
        }

        if observed >= period && weight > 0.0 {
            let avg_gain = gain_num / weight;
            let avg_loss = loss_num / weight;
            result[i] = if avg_loss == 0.0 {
                100.0
            } else {
                let rs = avg_gain / avg_loss;
                100.0 - (100.0 / (1.0 + rs))
            };
        }
    }

    Ok(result)
}

/// Rate of change over `period` rows, as a fraction (0.05 = +5%).
pub fn rate_of_change(data: &[f64], period: usize) -> Result<Vec<f64>> {
    if period == 0 {
        return Err(QuantError::invalid_parameter("ROC period must be > 0"));
    }
    Ok(pct_change(data, period))
}
