//! Untyped tabular input and its conversion into a [`BarSeries`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::core::error::QuantError;
use crate::core::types::{Bar, BarSeries};
use crate::core::Result;

/// Column names recognised as the date column, in priority order.
pub const DATE_COLUMNS: [&str; 5] = ["date", "Date", "timestamp", "datetime", "time"];

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// Header plus string cells, as read from CSV or handed over by a caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Position of a column, matched exactly.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Position of a column, ignoring ASCII case and surrounding whitespace.
    pub fn column_ignore_case(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
    }

    /// Name and position of the first recognised date column.
    pub fn date_column(&self) -> Option<(&'static str, usize)> {
        DATE_COLUMNS.iter().find_map(|&name| self.column(name).map(|idx| (name, idx)))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse a date cell.
///
/// Accepts `YYYY-MM-DD`, date-times with a time part, RFC 3339, and integer
/// epoch milliseconds.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(d);
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(ms) = value.parse::<i64>() {
        return DateTime::from_timestamp_millis(ms).map(|dt| dt.date_naive());
    }
    None
}

fn parse_price(cell: &str, row: usize, column: &str) -> Result<f64> {
    let value: f64 = cell
        .trim()
        .parse()
        .map_err(|_| QuantError::malformed_row(row, format!("{column}: cannot parse {cell:?}")))?;
    if !value.is_finite() {
        return Err(QuantError::malformed_row(row, format!("{column}: non-finite value")));
    }
    Ok(value)
}

impl BarSeries {
    /// Convert a raw table into a bar series.
    ///
    /// Fails with `MissingColumn` when no recognised date column or one of
    /// open/high/low/close/volume is absent, and with `MalformedRow` on an
    /// unparsable cell or a date that is not after the previous row's.
    /// Row numbers in errors are 1-based data rows.
    pub fn from_table(ticker: impl Into<String>, table: &RawTable) -> Result<Self> {
        let (date_name, date_idx) = table
            .date_column()
            .ok_or_else(|| QuantError::missing_column(DATE_COLUMNS.join("|")))?;

        let required = |name: &str| {
            table.column_ignore_case(name).ok_or_else(|| QuantError::missing_column(name))
        };
        let open_idx = required("open")?;
        let high_idx = required("high")?;
        let low_idx = required("low")?;
        let close_idx = required("close")?;
        let volume_idx = required("volume")?;
        let vwap_idx = table.column_ignore_case("vwap");

        let mut series = BarSeries::new(ticker);
        for (i, cells) in table.rows.iter().enumerate() {
            let row = i + 1;
            let cell = |idx: usize| cells.get(idx).map(String::as_str).unwrap_or("");

            let date = parse_date(cell(date_idx)).ok_or_else(|| {
                QuantError::malformed_row(row, format!("{date_name}: cannot parse {:?}", cell(date_idx)))
            })?;
            let vwap = match vwap_idx.map(cell) {
                Some(v) if !v.trim().is_empty() => Some(parse_price(v, row, "vwap")?),
                _ => None,
            };

            series.push(Bar {
                date,
                open: parse_price(cell(open_idx), row, "open")?,
                high: parse_price(cell(high_idx), row, "high")?,
                low: parse_price(cell(low_idx), row, "low")?,
                close: parse_price(cell(close_idx), row, "close")?,
                volume: parse_price(cell(volume_idx), row, "volume")?,
                vwap,
            })?;
        }

        Ok(series)
    }
}
