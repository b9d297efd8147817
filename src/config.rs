//! Pipeline configuration.
//!
//! Loaded from TOML. Every field has a default, so an empty file is a valid
//! configuration:
//!
//! ```toml
//! trials = 10000
//! horizons = [10, 20]
//! trading_days_per_year = 252
//! seed = 7
//! missing_trials = "fail"   # or "zero"
//! database = "quantsim.db"
//! data_dir = "data"
//!
//! [portfolios.A]
//! AAPL = 125000.0
//! AMZN = 125000.0
//!
//! [fetch]
//! tickers = ["SPY"]
//! history_years = 2
//! ```
//!
//! `QUANTSIM_DB` and `QUANTSIM_DATA_DIR` override `database` and `data_dir`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::core::error::QuantError;
use crate::core::Result;
use crate::data::retry::RetryPolicy;
use crate::metrics::returns::TRADING_DAYS_PER_YEAR;
use crate::portfolio::{MissingTrialPolicy, MonteCarloConfig, Portfolio};

pub const DB_ENV: &str = "QUANTSIM_DB";
pub const DATA_DIR_ENV: &str = "QUANTSIM_DATA_DIR";

/// Market data fetch settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Extra tickers to fetch besides those held by portfolios.
    pub tickers: Vec<String>,
    pub history_years: u32,
    pub max_retries: u32,
    pub backoff_ms: u64,
    pub backoff_factor: f64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            tickers: Vec::new(),
            history_years: 2,
            max_retries: 3,
            backoff_ms: 12_000,
            backoff_factor: 2.0,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub trials: usize,
    /// Simulation horizons in years.
    pub horizons: Vec<u32>,
    pub trading_days_per_year: usize,
    pub seed: Option<u64>,
    pub missing_trials: MissingTrialPolicy,
    pub database: PathBuf,
    pub data_dir: PathBuf,
    /// Portfolio label to ticker to allocation.
    pub portfolios: IndexMap<String, IndexMap<String, f64>>,
    pub fetch: FetchConfig,
}

impl Default for Config {
    fn default() -> Self {
        let mut portfolios = IndexMap::new();
        portfolios.insert(
            "A".to_string(),
            IndexMap::from([("AAPL".to_string(), 125_000.0), ("AMZN".to_string(), 125_000.0)]),
        );
        portfolios.insert(
            "B".to_string(),
            IndexMap::from([("XLK".to_string(), 125_000.0), ("XLF".to_string(), 125_000.0)]),
        );
        Self {
            trials: 10_000,
            horizons: vec![10, 20],
            trading_days_per_year: TRADING_DAYS_PER_YEAR,
            seed: None,
            missing_trials: MissingTrialPolicy::Fail,
            database: PathBuf::from("quantsim.db"),
            data_dir: PathBuf::from("data"),
            portfolios,
            fetch: FetchConfig::default(),
        }
    }
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).map_err(|e| QuantError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file, apply environment overrides and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&text)?;
        config.apply_env();
        Ok(config)
    }

    /// Apply `QUANTSIM_DB` / `QUANTSIM_DATA_DIR` from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply path overrides from a variable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(db) = lookup(DB_ENV).filter(|v| !v.is_empty()) {
            self.database = PathBuf::from(db);
        }
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            return Err(QuantError::invalid_config("trials must be > 0"));
        }
        if self.horizons.is_empty() || self.horizons.contains(&0) {
            return Err(QuantError::invalid_config("horizons must be a non-empty list of positive years"));
        }
        if self.trading_days_per_year == 0 {
            return Err(QuantError::invalid_config("trading_days_per_year must be > 0"));
        }
        if self.portfolios.is_empty() {
            return Err(QuantError::invalid_config("at least one portfolio is required"));
        }
        for portfolio in self.portfolios() {
            portfolio.validate()?;
        }
        if self.fetch.history_years == 0 {
            return Err(QuantError::invalid_config("fetch.history_years must be > 0"));
        }
        if !self.fetch.backoff_factor.is_finite() || self.fetch.backoff_factor < 1.0 {
            return Err(QuantError::invalid_config("fetch.backoff_factor must be >= 1"));
        }
        Ok(())
    }

    pub fn portfolios(&self) -> Vec<Portfolio> {
        self.portfolios
            .iter()
            .map(|(label, holdings)| Portfolio { label: label.clone(), holdings: holdings.clone() })
            .collect()
    }

    /// Portfolio tickers followed by extra fetch tickers, without duplicates.
    pub fn tickers(&self) -> Vec<String> {
        let mut tickers: IndexSet<String> =
            self.portfolios.values().flat_map(|h| h.keys().cloned()).collect();
        tickers.extend(self.fetch.tickers.iter().cloned());
        tickers.into_iter().collect()
    }

    pub fn monte_carlo(&self) -> MonteCarloConfig {
        MonteCarloConfig {
            n_simulations: self.trials,
            trading_days_per_year: self.trading_days_per_year,
            seed: self.seed,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.fetch.max_retries,
            backoff: Duration::from_millis(self.fetch.backoff_ms),
            factor: self.fetch.backoff_factor,
        }
    }
}
