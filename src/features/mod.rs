//! Feature engineering: raw daily bars to indicator-enriched rows.

pub mod calendar;
pub mod engineer;
pub mod table;

pub use engineer::{engineer_features, engineer_table, LONGEST_WINDOW, WARMUP_ROWS};
pub use table::{parse_date, RawTable, DATE_COLUMNS};
