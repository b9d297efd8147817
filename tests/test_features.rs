//! Integration tests for feature engineering.

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};

use quantsim::core::types::{Bar, BarSeries};
use quantsim::core::{ErrorKind, QuantError};
use quantsim::features::table::RawTable;
use quantsim::features::{engineer_features, engineer_table, WARMUP_ROWS};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 3).unwrap()
}

fn trending_bars(n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let close = 50.0 + (i as f64 * 0.15).cos() * 3.0 + i as f64 * 0.02;
            Bar {
                date: start() + Duration::days(i as i64),
                open: close + if i % 3 == 0 { 0.4 } else { -0.4 },
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 5_000.0 + (i % 7) as f64 * 100.0,
                vwap: Some(close),
            }
        })
        .collect()
}

fn flat_bars(n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| Bar {
            date: start() + Duration::days(i as i64),
            open: 10.0,
            high: 10.0,
            low: 10.0,
            close: 10.0,
            volume: 100.0,
            vwap: None,
        })
        .collect()
}

#[test]
fn test_sixty_flat_bars_is_insufficient() {
    let series = BarSeries::from_bars("FLAT", flat_bars(60));
    let err = engineer_features(&series).unwrap_err();
    assert!(matches!(err, QuantError::InsufficientHistory { required: 200, available: 60 }));
    assert_eq!(err.kind(), ErrorKind::InsufficientHistory);
}

#[test]
fn test_row_count_property() {
    for n in [200, 201, 260, 500] {
        let features = engineer_features(&BarSeries::from_bars("T", trending_bars(n))).unwrap();
        assert_eq!(features.len(), n - (200 - 1));
    }
}

#[test]
fn test_no_undefined_rolling_or_lag_values() {
    let features = engineer_features(&BarSeries::from_bars("T", trending_bars(320))).unwrap();
    for row in &features.rows {
        for v in [
            row.close_lag_1,
            row.close_lag_2,
            row.daily_return,
            row.return_lag_1,
            row.rolling_mean_7,
            row.rolling_std_7,
            row.rolling_mean_30,
            row.rolling_std_30,
            row.ma14,
            row.ma30,
            row.ma50,
            row.ma200,
            row.rsi14,
            row.rsi30,
            row.rsi50,
            row.roc14,
            row.vol14,
            row.volume_change,
        ] {
            assert!(v.is_finite());
        }
        assert!((0.0..=100.0).contains(&row.rsi14));
    }
}

#[test]
fn test_row_values() {
    let bars = trending_bars(210);
    let features = engineer_features(&BarSeries::from_bars("T", bars.clone())).unwrap();
    let first = &features.rows[0];
    let source = &bars[WARMUP_ROWS];

    assert_eq!(first.bar.date, source.date);
    assert_eq!(first.close_lag_1, bars[WARMUP_ROWS - 1].close);
    assert_eq!(first.close_lag_2, bars[WARMUP_ROWS - 2].close);
    assert_relative_eq!(first.high_low_range, 2.0, epsilon = 1e-12);
    assert_relative_eq!(
        first.daily_return,
        source.close / bars[WARMUP_ROWS - 1].close - 1.0,
        epsilon = 1e-12
    );
    let mean200: f64 = bars[..200].iter().map(|b| b.close).sum::<f64>() / 200.0;
    assert_relative_eq!(first.ma200, mean200 / source.close, epsilon = 1e-9);
    assert_eq!(first.up_day, source.close > source.open);
    assert_eq!(first.down_day, source.close < source.open);
}

#[test]
fn test_flat_prices_zero_spread() {
    let features = engineer_features(&BarSeries::from_bars("FLAT", flat_bars(220))).unwrap();
    let row = &features.rows[5];
    assert_eq!(row.rolling_std_7, 0.0);
    assert_eq!(row.vol14, 0.0);
    assert_eq!(row.rsi14, 100.0);
    assert!(!row.up_day && !row.down_day);
    assert_relative_eq!(row.ma200, 1.0, epsilon = 1e-12);
}

#[test]
fn test_engineer_table_with_timestamp_column() {
    let headers = ["timestamp", "open", "high", "low", "close", "volume", "vwap"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let rows = trending_bars(205)
        .iter()
        .map(|b| {
            vec![
                b.date.format("%Y-%m-%d 00:00:00").to_string(),
                b.open.to_string(),
                b.high.to_string(),
                b.low.to_string(),
                b.close.to_string(),
                b.volume.to_string(),
                String::new(),
            ]
        })
        .collect();
    let features = engineer_table("T", &RawTable::new(headers, rows)).unwrap();
    assert_eq!(features.len(), 6);
    assert!(features.rows.windows(2).all(|w| w[0].bar.date < w[1].bar.date));
}
