//! Market data acquisition: sources, CSV boundary and resumable fetching.

pub mod csv;
pub mod retry;
pub mod source;

pub use self::csv::{read_table, write_records, CsvSource};
pub use retry::{fetch_with_resume, RetryPolicy};
pub use source::{DateRange, MarketDataSource};
