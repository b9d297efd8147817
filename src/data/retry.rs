//! Resumable fetching with bounded exponential backoff.

use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use super::source::{DateRange, MarketDataSource};
use crate::core::types::Bar;
use crate::core::Result;

/// Retry schedule for a failing fetch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
    pub factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3, backoff: Duration::from_secs(12), factor: 2.0 }
    }
}

impl RetryPolicy {
    /// No waiting between attempts.
    pub fn immediate(max_retries: u32) -> Self {
        Self { max_retries, backoff: Duration::ZERO, factor: 1.0 }
    }

    /// Delay before retry number `attempt` (1-based): `backoff * factor^attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let secs = self.backoff.as_secs_f64() * self.factor.powi(attempt as i32);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

/// Fetch a ticker's bars, resuming from the last received date on failure.
///
/// A failure before any bar arrived is returned as is. Otherwise the fetch
/// is retried from the date of the last bar received, at most
/// `policy.max_retries` times. The result is sorted by date with duplicates
/// removed (first wins).
pub fn fetch_with_resume(
    source: &dyn MarketDataSource,
    ticker: &str,
    range: DateRange,
    policy: &RetryPolicy,
) -> Result<Vec<Bar>> {
    let mut bars: Vec<Bar> = Vec::new();
    let mut cursor = range.start;
    let mut attempt = 0;

    loop {
        let window = DateRange::new(cursor, range.end);
        let outcome = source.fetch_bars(ticker, window, &mut |bar| bars.push(bar));
        match outcome {
            Ok(()) => break,
            Err(err) => {
                let Some(last) = bars.last() else {
                    return Err(err);
                };
                if attempt >= policy.max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay = policy.delay(attempt);
                warn!(
                    ticker,
                    attempt,
                    resume_from = %last.date,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "fetch interrupted, retrying"
                );
                cursor = last.date;
                thread::sleep(delay);
            }
        }
    }

    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    info!(ticker, bars = bars.len(), retries = attempt, "fetched bars");
    Ok(bars)
}
