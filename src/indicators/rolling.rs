//! Trailing-window mean and standard deviation.
//!
//! A window produces a value only when it is full and every value inside it
//! is defined, so a NaN anywhere in the lookback propagates.

use crate::core::error::QuantError;

/// Calculate the rolling mean over a trailing window.
///
/// Returns NaN for the first (window - 1) values.
///
/// # Arguments
/// * `data` - Input data slice
/// * `window` - Lookback window
pub fn rolling_mean(data: &[f64], window: usize) -> Result<Vec<f64>, QuantError> {
    if window == 0 {
        return Err(QuantError::invalid_parameter("window must be at least 1"));
    }

    let n = data.len();
    let mut result = vec![f64::NAN; n];

    for i in (window - 1)..n {
        let slice = &data[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = slice.iter().sum::<f64>() / window as f64;
    }

    Ok(result)
}

/// Calculate the rolling sample standard deviation (n - 1 denominator).
///
/// Returns NaN for the first (window - 1) values. A window of one has no
/// sample deviation and is NaN throughout.
pub fn rolling_std(data: &[f64], window: usize) -> Result<Vec<f64>, QuantError> {
    if window == 0 {
        return Err(QuantError::invalid_parameter("window must be at least 1"));
    }

    let n = data.len();
    let mut result = vec![f64::NAN; n];
    if window < 2 {
        return Ok(result);
    }

    for i in (window - 1)..n {
        let slice = &data[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        let mean = slice.iter().sum::<f64>() / window as f64;
        let ss: f64 = slice.iter().map(|v| (v - mean).powi(2)).sum();
        result[i] = (ss / (window - 1) as f64).sqrt();
    }

    Ok(result)
}
