//! Lag and percent-change transforms.

/// Lag a series by `periods` rows. The first `periods` values are NaN.
pub fn shift(data: &[f64], periods: usize) -> Vec<f64> {
    let n = data.len();
    let mut result = vec![f64::NAN; n];
    for i in periods..n {
        result[i] = data[i - periods];
    }
    result
}

/// Percent change against the value `periods` rows earlier, as a fraction.
///
/// Positions without a prior value, and changes that are not finite (a zero
/// prior value), are NaN.
pub fn pct_change(data: &[f64], periods: usize) -> Vec<f64> {
    let n = data.len();
    let mut result = vec![f64::NAN; n];
    if periods == 0 {
        result.iter_mut().zip(data).for_each(|(r, x)| {
            if x.is_finite() {
                *r = 0.0;
            }
        });
        return result;
    }
    for i in periods..n {
        let change = data[i] / data[i - periods] - 1.0;
        if change.is_finite() {
            result[i] = change;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift() {
        let result = shift(&[1.0, 2.0, 3.0, 4.0], 2);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_eq!(&result[2..], &[1.0, 2.0]);
    }

    #[test]
    fn test_pct_change() {
        let result = pct_change(&[100.0, 110.0, 99.0], 1);
        assert!(result[0].is_nan());
        assert!((result[1] - 0.10).abs() < 1e-12);
        assert!((result[2] + 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_pct_change_zero_prior() {
        let result = pct_change(&[0.0, 10.0, 0.0, 0.0], 1);
        assert!(result[1].is_nan());
        assert!((result[2] + 1.0).abs() < 1e-12);
        assert!(result[3].is_nan());
    }
}
