//! Flat storage projections of typed rows.
//!
//! Undefined numeric fields are written as 0 and flags as 0/1 integers, the
//! layout of the `processed_market_data` table and of processed CSV files.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::types::{Bar, FeatureRow};

#[inline]
fn zero_filled(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// One raw bar of one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarRecord {
    pub ticker: String,
    pub timestamp: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub vwap: Option<f64>,
}

impl BarRecord {
    pub fn new(ticker: &str, bar: &Bar) -> Self {
        Self {
            ticker: ticker.to_string(),
            timestamp: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            vwap: bar.vwap,
        }
    }

    pub fn to_bar(&self) -> Bar {
        Bar {
            date: self.timestamp,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            vwap: self.vwap,
        }
    }
}

/// One engineered row in storage layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub vwap: f64,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub weekday: u32,
    pub is_month_start: i64,
    pub is_month_end: i64,
    pub high_low_range: f64,
    pub average_price: f64,
    pub volume_change: f64,
    pub close_lag_1: f64,
    pub close_lag_2: f64,
    #[serde(rename = "return")]
    pub daily_return: f64,
    pub return_lag_1: f64,
    pub rolling_mean_7: f64,
    pub rolling_std_7: f64,
    pub rolling_mean_30: f64,
    pub rolling_std_30: f64,
    pub ma14: f64,
    pub ma30: f64,
    pub ma50: f64,
    pub ma200: f64,
    pub rsi14: f64,
    pub rsi30: f64,
    pub rsi50: f64,
    pub roc14: f64,
    pub vol14: f64,
    pub up_day: i64,
    pub down_day: i64,
}

impl FeatureRecord {
    pub fn new(ticker: &str, row: &FeatureRow) -> Self {
        let bar = &row.bar;
        Self {
            ticker: ticker.to_string(),
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            vwap: bar.vwap.map_or(0.0, zero_filled),
            year: row.year,
            month: row.month,
            day: row.day,
            weekday: row.weekday,
            is_month_start: row.is_month_start as i64,
            is_month_end: row.is_month_end as i64,
            high_low_range: zero_filled(row.high_low_range),
            average_price: zero_filled(row.average_price),
            volume_change: zero_filled(row.volume_change),
            close_lag_1: zero_filled(row.close_lag_1),
            close_lag_2: zero_filled(row.close_lag_2),
            daily_return: zero_filled(row.daily_return),
            return_lag_1: zero_filled(row.return_lag_1),
            rolling_mean_7: zero_filled(row.rolling_mean_7),
            rolling_std_7: zero_filled(row.rolling_std_7),
            rolling_mean_30: zero_filled(row.rolling_mean_30),
            rolling_std_30: zero_filled(row.rolling_std_30),
            ma14: zero_filled(row.ma14),
            ma30: zero_filled(row.ma30),
            ma50: zero_filled(row.ma50),
            ma200: zero_filled(row.ma200),
            rsi14: zero_filled(row.rsi14),
            rsi30: zero_filled(row.rsi30),
            rsi50: zero_filled(row.rsi50),
            roc14: zero_filled(row.roc14),
            vol14: zero_filled(row.vol14),
            up_day: row.up_day as i64,
            down_day: row.down_day as i64,
        }
    }

    /// Project every row of a feature set.
    pub fn from_rows(ticker: &str, rows: &[FeatureRow]) -> Vec<Self> {
        rows.iter().map(|row| Self::new(ticker, row)).collect()
    }
}
