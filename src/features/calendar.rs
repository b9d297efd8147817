//! Calendar flags derived from a trading date.

use chrono::{Datelike, NaiveDate};

/// Monday = 0 through Sunday = 6.
#[inline]
pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_monday()
}

/// First calendar day of the month.
#[inline]
pub fn is_month_start(date: NaiveDate) -> bool {
    date.day() == 1
}

/// Last calendar day of the month (not the last trading day).
pub fn is_month_end(date: NaiveDate) -> bool {
    date.succ_opt().map_or(true, |next| next.month() != date.month())
}
