//! Return estimation and distribution statistics.

pub mod descriptive;
pub mod returns;
pub mod summary;

pub use descriptive::{quantile_sorted, sorted_values, RunningStats};
pub use returns::{annualize, daily_returns, estimate, TRADING_DAYS_PER_YEAR};
pub use summary::SummaryStatistics;
