//! Volatility indicators.

use super::change::pct_change;
use super::rolling::rolling_std;
use crate::core::Result;

/// Rolling sample standard deviation of one-day percent changes.
///
/// The first defined value sits at index `period`, one row later than a plain
/// rolling window because the first change is itself undefined.
pub fn return_volatility(close: &[f64], period: usize) -> Result<Vec<f64>> {
    rolling_std(&pct_change(close, 1), period)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_growth_has_zero_volatility() {
        let close: Vec<f64> = (0..20).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let result = return_volatility(&close, 5).unwrap();
        assert!(result[4].is_nan());
        assert!(result[5].abs() < 1e-12);
        assert!(result[19].abs() < 1e-12);
    }

    #[test]
    fn test_alternating_returns() {
        let close = vec![100.0, 110.0, 99.0, 108.9];
        let result = return_volatility(&close, 3).unwrap();
        // Returns: +10%, -10%, +10%.
        let mean: f64 = 0.1 / 3.0;
        let ss = 2.0 * (0.1 - mean).powi(2) + (-0.1 - mean).powi(2);
        assert!((result[3] - (ss / 2.0).sqrt()).abs() < 1e-9);
    }
}
