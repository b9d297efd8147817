//! Descriptive statistics over f64 samples.
//!
//! NaN values are skipped by every function here.

/// Single-pass mean/variance accumulator (Welford's algorithm).
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self { count: 0, mean: 0.0, m2: 0.0, min: f64::INFINITY, max: f64::NEG_INFINITY }
    }

    /// Feed one observation. NaN is ignored.
    #[inline]
    pub fn push(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Mean, NaN when empty.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.mean
        }
    }

    /// Sample standard deviation (n - 1 denominator).
    ///
    /// NaN when empty; a single observation has zero spread.
    pub fn std(&self) -> f64 {
        match self.count {
            0 => f64::NAN,
            1 => 0.0,
            n => (self.m2 / (n - 1) as f64).sqrt(),
        }
    }

    pub fn min(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.min
        }
    }

    pub fn max(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.max
        }
    }
}

impl FromIterator<f64> for RunningStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = RunningStats::new();
        for v in iter {
            stats.push(v);
        }
        stats
    }
}

/// Defined values sorted ascending.
pub fn sorted_values(data: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = data.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Quantile of an ascending slice with linear interpolation between the two
/// closest ranks. `q` is clamped to [0, 1]; an empty slice gives NaN.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    // Never above the upper rank, even after rounding.
    (sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)).min(sorted[hi])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let stats: RunningStats = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0].into_iter().collect();
        assert_eq!(stats.count(), 8);
        assert!((stats.mean() - 5.0).abs() < 1e-12);
        assert!((stats.std() - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(stats.min(), 2.0);
        assert_eq!(stats.max(), 9.0);
    }

    #[test]
    fn test_empty_and_single() {
        let empty = RunningStats::new();
        assert!(empty.mean().is_nan());
        assert!(empty.std().is_nan());

        let single: RunningStats = [3.0].into_iter().collect();
        assert_eq!(single.std(), 0.0);
    }

    #[test]
    fn test_nan_skipped() {
        let stats: RunningStats = [1.0, f64::NAN, 3.0].into_iter().collect();
        assert_eq!(stats.count(), 2);
        assert!((stats.mean() - 2.0).abs() < 1e-12);
        assert_eq!(sorted_values(&[3.0, f64::NAN, 1.0]), vec![1.0, 3.0]);
    }

    #[test]
    fn test_quantile_linear() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&sorted, 0.0), 1.0);
        assert_eq!(quantile_sorted(&sorted, 1.0), 4.0);
        assert!((quantile_sorted(&sorted, 0.5) - 2.5).abs() < 1e-12);
        assert!((quantile_sorted(&sorted, 0.25) - 1.75).abs() < 1e-12);
        assert!(quantile_sorted(&[], 0.5).is_nan());
    }

    #[test]
    fn test_median_of_unsorted() {
        assert_eq!(quantile_sorted(&sorted_values(&[5.0, 1.0, 3.0]), 0.5), 3.0);
        assert!((quantile_sorted(&sorted_values(&[4.0, 1.0, 3.0, 2.0]), 0.5) - 2.5).abs() < 1e-12);
    }
}
