//! CSV input and output.

use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::Serialize;
use tracing::debug;

use super::source::{DateRange, MarketDataSource};
use crate::core::error::QuantError;
use crate::core::types::{Bar, BarSeries};
use crate::core::Result;
use crate::features::table::RawTable;

/// Read a CSV file with a header row into a raw table.
pub fn read_table(path: impl AsRef<Path>) -> Result<RawTable> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading csv");

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(RawTable::new(headers, rows))
}

/// Write serializable records as a CSV file with a header row.
pub fn write_records<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Daily bars from a directory of `<TICKER>.csv` files.
#[derive(Debug, Clone)]
pub struct CsvSource {
    dir: PathBuf,
}

impl CsvSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{ticker}.csv"))
    }

    /// Load the full series of one ticker.
    pub fn load_series(&self, ticker: &str) -> Result<BarSeries> {
        let path = self.path_for(ticker);
        if !path.is_file() {
            return Err(QuantError::source(ticker, format!("{} not found", path.display())));
        }
        BarSeries::from_table(ticker, &read_table(&path)?)
    }
}

impl MarketDataSource for CsvSource {
    fn fetch_bars(
        &self,
        ticker: &str,
        range: DateRange,
        sink: &mut dyn FnMut(Bar),
    ) -> Result<()> {
        let series = self.load_series(ticker)?;
        for bar in series.bars().filter(|b| range.contains(b.date)) {
            sink(bar);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;

    fn write_csv(dir: &Path, name: &str) {
        fs::write(
            dir.join(name),
            "Date,Open,High,Low,Close,Volume\n\
             2024-01-02, 1, 2, 0.5, 1.5, 200\n\
             2024-01-03,2,3,1,2.5,100\n\
             2024-01-04,3,4,2,3.5,300\n",
        )
        .unwrap();
    }

    #[test]
    fn test_read_table_trims_cells() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "AAPL.csv");
        let table = read_table(dir.path().join("AAPL.csv")).unwrap();
        assert_eq!(table.headers[0], "Date");
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[0][1], "1");
    }

    #[test]
    fn test_csv_source_filters_range() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "AAPL.csv");
        let source = CsvSource::new(dir.path());
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );
        let mut bars = Vec::new();
        source.fetch_bars("AAPL", range, &mut |b| bars.push(b)).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 2.5);
    }

    #[test]
    fn test_csv_source_missing_ticker() {
        let dir = tempfile::tempdir().unwrap();
        let err = CsvSource::new(dir.path()).load_series("MSFT").unwrap_err();
        assert!(matches!(err, QuantError::Source { .. }));
    }

    #[test]
    fn test_write_records() {
        #[derive(Serialize)]
        struct Row {
            a: i32,
            b: f64,
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_records(&path, &[Row { a: 1, b: 0.5 }]).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "a,b\n1,0.5\n");
    }
}
