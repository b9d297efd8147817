//! Per-ticker feature engineering.
//!
//! Every feature at row `i` is computed from rows `0..=i` only. Rows before
//! the longest window is full are dropped rather than zero-filled.

use chrono::Datelike;

use super::calendar::{is_month_end, is_month_start, weekday_index};
use super::table::RawTable;
use crate::core::error::QuantError;
use crate::core::types::{BarSeries, FeatureRow, FeatureSet};
use crate::core::Result;
use crate::indicators::{
    ma_ratio, pct_change, rate_of_change, return_volatility, rolling_mean, rolling_std, rsi, shift,
};

/// Windows of the close-price rolling mean/std features.
pub const ROLLING_WINDOWS: [usize; 2] = [7, 30];
/// Moving-average ratio periods.
pub const MA_PERIODS: [usize; 4] = [14, 30, 50, 200];
/// RSI periods.
pub const RSI_PERIODS: [usize; 3] = [14, 30, 50];
/// Rate-of-change lookback.
pub const ROC_PERIOD: usize = 14;
/// Return-volatility window.
pub const VOL_PERIOD: usize = 14;

/// Longest lookback of any feature (the 200-row moving average).
pub const LONGEST_WINDOW: usize = 200;
/// Leading rows dropped from every feature set.
pub const WARMUP_ROWS: usize = LONGEST_WINDOW - 1;

/// Engineer features for one ticker's bars.
///
/// Fails with `InsufficientHistory` when fewer than [`LONGEST_WINDOW`] bars
/// are available and with `MalformedRow` when dates are not strictly
/// ascending. On success the output has `bars.len() - WARMUP_ROWS` rows.
pub fn engineer_features(bars: &BarSeries) -> Result<FeatureSet> {
    bars.validate()?;

    let n = bars.len();
    if n < LONGEST_WINDOW {
        return Err(QuantError::insufficient_history(LONGEST_WINDOW, n));
    }

    let close = &bars.close;

    let volume_change = pct_change(&bars.volume, 1);
    let close_lag_1 = shift(close, 1);
    let close_lag_2 = shift(close, 2);
    let daily_return = pct_change(close, 1);
    let return_lag_1 = shift(&daily_return, 1);

    let rolling_mean_7 = rolling_mean(close, ROLLING_WINDOWS[0])?;
    let rolling_std_7 = rolling_std(close, ROLLING_WINDOWS[0])?;
    let rolling_mean_30 = rolling_mean(close, ROLLING_WINDOWS[1])?;
    let rolling_std_30 = rolling_std(close, ROLLING_WINDOWS[1])?;

    let ma14 = ma_ratio(close, MA_PERIODS[0])?;
    let ma30 = ma_ratio(close, MA_PERIODS[1])?;
    let ma50 = ma_ratio(close, MA_PERIODS[2])?;
    let ma200 = ma_ratio(close, MA_PERIODS[3])?;

    let rsi14 = rsi(close, RSI_PERIODS[0])?;
    let rsi30 = rsi(close, RSI_PERIODS[1])?;
    let rsi50 = rsi(close, RSI_PERIODS[2])?;

    let roc14 = rate_of_change(close, ROC_PERIOD)?;
    let vol14 = return_volatility(close, VOL_PERIOD)?;

    let rows = (WARMUP_ROWS..n)
        .filter_map(|i| bars.get_bar(i).map(|bar| (i, bar)))
        .map(|(i, bar)| FeatureRow {
            bar,
            year: bar.date.year(),
            month: bar.date.month(),
            day: bar.date.day(),
            weekday: weekday_index(bar.date),
            is_month_start: is_month_start(bar.date),
            is_month_end: is_month_end(bar.date),
            high_low_range: bar.high - bar.low,
            average_price: (bar.open + bar.high + bar.low + bar.close) / 4.0,
            volume_change: volume_change[i],
            close_lag_1: close_lag_1[i],
            close_lag_2: close_lag_2[i],
            daily_return: daily_return[i],
            return_lag_1: return_lag_1[i],
            rolling_mean_7: rolling_mean_7[i],
            rolling_std_7: rolling_std_7[i],
            rolling_mean_30: rolling_mean_30[i],
            rolling_std_30: rolling_std_30[i],
            ma14: ma14[i],
            ma30: ma30[i],
            ma50: ma50[i],
            ma200: ma200[i],
            rsi14: rsi14[i],
            rsi30: rsi30[i],
            rsi50: rsi50[i],
            roc14: roc14[i],
            vol14: vol14[i],
            up_day: bar.close > bar.open,
            down_day: bar.close < bar.open,
        })
        .collect();

    Ok(FeatureSet { ticker: bars.ticker.clone(), rows })
}

/// Convert a raw table and engineer its features in one step.
pub fn engineer_table(ticker: &str, table: &RawTable) -> Result<FeatureSet> {
    let bars = BarSeries::from_table(ticker, table)?;
    engineer_features(&bars)
}
