//! Trend indicators: SMA and moving-average ratios.

use crate::core::error::QuantError;
use crate::core::Result;

/// Simple Moving Average.
///
/// # Arguments
/// * `data` - Price data
/// * `period` - Lookback period
///
/// # Returns
/// Vector of SMA values (NaN for warmup period)
pub fn sma(data: &[f64], period: usize) -> Result<Vec<f64>> {
    if period == 0 {
        return Err(QuantError::invalid_parameter("SMA period must be > 0"));
    }
    if data.is_empty() {
        return Ok(vec![]);
    }

    let n = data.len();
    let mut result = vec![f64::NAN; n];

    if period > n {
        return Ok(result);
    }

    // Calculate first SMA
    let mut sum: f64 = data[..period].iter().sum();
    result[period - 1] = sum / period as f64;

    // Sliding window for remaining values
    for i in period..n {
        sum = sum - data[i - period] + data[i];
        result[i] = sum / period as f64;
    }

    Ok(result)
}

/// Moving average expressed as a ratio to the current close.
///
/// Values above 1 mean the close sits below its trailing average.
pub fn ma_ratio(close: &[f64], period: usize) -> Result<Vec<f64>> {
    let averages = sma(close, period)?;
    Ok(averages
        .iter()
        .zip(close)
        .map(|(avg, c)| {
            let ratio = avg / c;
            if ratio.is_finite() {
                ratio
            } else {
                f64::NAN
            }
        })
        .collect())
}
