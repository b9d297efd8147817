//! Market data sources.

use chrono::{Months, NaiveDate, Utc};

use crate::core::types::Bar;
use crate::core::Result;

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The `years` of history ending at `end`.
    pub fn history_window(end: NaiveDate, years: u32) -> Self {
        let start = end.checked_sub_months(Months::new(12 * years)).unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    /// The `years` of history ending today (UTC).
    pub fn trailing_years(years: u32) -> Self {
        Self::history_window(Utc::now().date_naive(), years)
    }

    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Narrow the range so it does not start before `earliest`.
    pub fn clamp_start(self, earliest: NaiveDate) -> Self {
        Self { start: self.start.max(earliest), end: self.end }
    }
}

/// A provider of daily bars.
///
/// Bars are pushed into `sink` as they arrive, in ascending date order, so a
/// caller keeps whatever arrived before a failure.
pub trait MarketDataSource {
    fn fetch_bars(
        &self,
        ticker: &str,
        range: DateRange,
        sink: &mut dyn FnMut(Bar),
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_history_window() {
        let range = DateRange::history_window(date(2024, 6, 14), 2);
        assert_eq!(range.start, date(2022, 6, 14));
        assert!(range.contains(date(2023, 1, 3)));
        assert!(!range.contains(date(2022, 6, 13)));
    }

    #[test]
    fn test_history_window_leap_day() {
        let range = DateRange::history_window(date(2024, 2, 29), 1);
        assert_eq!(range.start, date(2023, 2, 28));
    }

    #[test]
    fn test_clamp_start() {
        let range = DateRange::new(date(2020, 1, 1), date(2024, 1, 1)).clamp_start(date(2022, 1, 1));
        assert_eq!(range.start, date(2022, 1, 1));
        let range = range.clamp_start(date(2019, 1, 1));
        assert_eq!(range.start, date(2022, 1, 1));
    }
}
