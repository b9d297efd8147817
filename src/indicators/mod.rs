//! Technical indicators for quantsim.
//!
//! All indicators are implemented as pure functions that take slice inputs
//! and return Vec outputs of the same length. NaN values are used for the
//! warmup period.

pub mod change;
pub mod momentum;
pub mod rolling;
pub mod trend;
pub mod volatility;

pub use change::{pct_change, shift};
pub use momentum::{rate_of_change, rsi};
pub use rolling::{rolling_mean, rolling_std};
pub use trend::{ma_ratio, sma};
pub use volatility::return_volatility;
