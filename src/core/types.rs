//! Core data types for quantsim.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::QuantError;
use super::Result;

/// Type alias for price values.
pub type Price = f64;

/// Identifier of a persisted simulation run.
pub type RunId = i64;

/// OHLCV data for a single trading day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: f64,
    pub vwap: Option<Price>,
}

/// Daily OHLCV series for one ticker, stored column-wise.
///
/// Dates are strictly ascending once the series has been built through
/// [`BarSeries::from_bars`] or [`BarSeries::push`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarSeries {
    pub ticker: String,
    pub dates: Vec<NaiveDate>,
    pub open: Vec<Price>,
    pub high: Vec<Price>,
    pub low: Vec<Price>,
    pub close: Vec<Price>,
    pub volume: Vec<f64>,
    pub vwap: Vec<Option<Price>>,
}

impl BarSeries {
    /// Create an empty series for a ticker.
    pub fn new(ticker: impl Into<String>) -> Self {
        Self { ticker: ticker.into(), ..Self::default() }
    }

    /// Build a series from bars in any order.
    ///
    /// Bars are sorted by date and duplicates are dropped, keeping the first
    /// occurrence of each date.
    pub fn from_bars(ticker: impl Into<String>, bars: impl IntoIterator<Item = Bar>) -> Self {
        let mut bars: Vec<Bar> = bars.into_iter().collect();
        // Stable sort keeps the first occurrence ahead of later duplicates.
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);

        let mut series = Self::new(ticker);
        for bar in bars {
            series.push_unchecked(bar);
        }
        series
    }

    fn push_unchecked(&mut self, bar: Bar) {
        self.dates.push(bar.date);
        self.open.push(bar.open);
        self.high.push(bar.high);
        self.low.push(bar.low);
        self.close.push(bar.close);
        self.volume.push(bar.volume);
        self.vwap.push(bar.vwap);
    }

    /// Append a bar, rejecting dates that do not move forward.
    ///
    /// The error carries the 1-based position the bar would have taken.
    pub fn push(&mut self, bar: Bar) -> Result<()> {
        if let Some(&last) = self.dates.last() {
            if bar.date <= last {
                return Err(QuantError::malformed_row(
                    self.len() + 1,
                    format!("date {} does not follow {}", bar.date, last),
                ));
            }
        }
        self.push_unchecked(bar);
        Ok(())
    }

    /// Get the number of bars.
    #[inline]
    pub fn len(&self) -> usize {
        self.close.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    /// Get a single bar at index.
    pub fn get_bar(&self, index: usize) -> Option<Bar> {
        if index >= self.len() {
            return None;
        }
        Some(Bar {
            date: self.dates[index],
            open: self.open[index],
            high: self.high[index],
            low: self.low[index],
            close: self.close[index],
            volume: self.volume[index],
            vwap: self.vwap[index],
        })
    }

    /// Iterate over bars in date order.
    pub fn bars(&self) -> impl Iterator<Item = Bar> + '_ {
        (0..self.len()).filter_map(move |i| self.get_bar(i))
    }

    /// Date of the most recent bar.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Check that dates are strictly ascending and columns have equal length.
    pub fn validate(&self) -> Result<()> {
        let n = self.len();
        let lengths = [
            self.dates.len(),
            self.open.len(),
            self.high.len(),
            self.low.len(),
            self.volume.len(),
            self.vwap.len(),
        ];
        if let Some(&bad) = lengths.iter().find(|&&l| l != n) {
            return Err(QuantError::invalid_parameter(format!(
                "column length mismatch: expected {n}, got {bad}"
            )));
        }
        for (i, pair) in self.dates.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(QuantError::malformed_row(
                    i + 1,
                    format!("date {} does not follow {}", pair[1], pair[0]),
                ));
            }
        }
        Ok(())
    }
}

/// One bar extended with its engineered features.
///
/// Fields that can be undefined for a given row (for example a volume change
/// after a zero-volume day) hold `NaN`; storage projections zero-fill them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub bar: Bar,

    // Calendar
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Monday = 0.
    pub weekday: u32,
    pub is_month_start: bool,
    pub is_month_end: bool,

    // Price & volume
    pub high_low_range: f64,
    pub average_price: f64,
    pub volume_change: f64,

    // Lags & returns
    pub close_lag_1: f64,
    pub close_lag_2: f64,
    pub daily_return: f64,
    pub return_lag_1: f64,

    // Rolling statistics
    pub rolling_mean_7: f64,
    pub rolling_std_7: f64,
    pub rolling_mean_30: f64,
    pub rolling_std_30: f64,

    // Moving average / close ratios
    pub ma14: f64,
    pub ma30: f64,
    pub ma50: f64,
    pub ma200: f64,

    pub rsi14: f64,
    pub rsi30: f64,
    pub rsi50: f64,

    pub roc14: f64,
    pub vol14: f64,

    pub up_day: bool,
    pub down_day: bool,
}

/// Engineered rows for a single ticker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    pub ticker: String,
    pub rows: Vec<FeatureRow>,
}

impl FeatureSet {
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Persisted history the return estimator reads back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceHistory {
    pub ticker: String,
    pub dates: Vec<NaiveDate>,
    pub closes: Vec<Price>,
    /// Stored daily returns, when the store has them.
    pub returns: Option<Vec<f64>>,
}

impl PriceHistory {
    /// Most recent close, the anchor for every simulated trial.
    pub fn last_close(&self) -> Option<Price> {
        self.closes.last().copied()
    }
}

/// Annualized drift and volatility of a ticker's daily returns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnualizedStats {
    /// Annualized drift (mu).
    pub mean: f64,
    /// Annualized volatility (sigma).
    pub std: f64,
}

/// One (portfolio, horizon) execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRun {
    pub run_id: RunId,
    pub portfolio: String,
    pub horizon_years: u32,
    pub n_trials: usize,
}

/// Per-ticker outcome of one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub run_id: RunId,
    pub ticker: String,
    pub initial_value: f64,
    pub terminal_value: f64,
    pub return_pct: f64,
    /// 1-based trial index.
    pub trial: usize,
}

/// Portfolio-level outcome of one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioResult {
    pub run_id: RunId,
    pub portfolio: String,
    pub terminal_value: f64,
    pub return_pct: f64,
    /// 1-based trial index.
    pub trial: usize,
}

/// Flattened summary metric of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistic {
    pub run_id: RunId,
    pub portfolio: String,
    pub metric: String,
    pub value: f64,
}
