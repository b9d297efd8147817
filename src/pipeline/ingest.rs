//! Raw bar ingestion.

use tracing::{debug, info};

use super::BatchReport;
use crate::core::Result;
use crate::data::retry::{fetch_with_resume, RetryPolicy};
use crate::data::source::{DateRange, MarketDataSource};
use crate::store::Store;

/// Fetch the trailing `history_years` of bars for every ticker and store them.
pub fn ingest(
    store: &mut dyn Store,
    source: &dyn MarketDataSource,
    tickers: &[String],
    history_years: u32,
    policy: &RetryPolicy,
) -> Result<BatchReport> {
    ingest_window(store, source, tickers, DateRange::trailing_years(history_years), policy)
}

/// Fetch bars within `window` for every ticker and store them.
///
/// A ticker with stored bars is fetched from its latest stored date onward.
pub fn ingest_window(
    store: &mut dyn Store,
    source: &dyn MarketDataSource,
    tickers: &[String],
    window: DateRange,
    policy: &RetryPolicy,
) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    for ticker in tickers {
        let range = match store.latest_bar_date(ticker)? {
            Some(latest) => window.clamp_start(latest),
            None => window,
        };
        debug!(ticker = %ticker, start = %range.start, end = %range.end, "ingesting");
        let result = fetch_with_resume(source, ticker, range, policy)
            .and_then(|bars| store.upsert_bars(ticker, &bars));
        report.record(ticker.as_str(), result)?;
    }
    info!(
        tickers = tickers.len(),
        skipped = report.skipped.len(),
        rows = report.total_rows(),
        "ingest complete"
    );
    Ok(report)
}
