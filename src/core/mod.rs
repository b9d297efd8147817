//! Core types and utilities for quantsim.

pub mod error;
pub mod types;

pub use error::{ErrorKind, QuantError, Result};
pub use types::*;
