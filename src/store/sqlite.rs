//! SQLite storage backend.

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::records::{BarRecord, FeatureRecord};
use super::Store;
use crate::core::types::{
    Bar, BarSeries, FeatureSet, PortfolioResult, PriceHistory, RunId, SimulationResult, SimulationRun,
    SummaryStatistic,
};
use crate::core::Result;
use crate::portfolio::PortfolioSimulation;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS raw_market_data (
    ticker    TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    open      REAL NOT NULL,
    high      REAL NOT NULL,
    low       REAL NOT NULL,
    close     REAL NOT NULL,
    volume    REAL NOT NULL,
    vwap      REAL,
    PRIMARY KEY (ticker, timestamp)
);

CREATE TABLE IF NOT EXISTS processed_market_data (
    ticker          TEXT NOT NULL,
    date            TEXT NOT NULL,
    open            REAL,
    high            REAL,
    low             REAL,
    close           REAL,
    volume          REAL,
    vwap            REAL,
    year            INTEGER,
    month           INTEGER,
    day             INTEGER,
    weekday         INTEGER,
    is_month_start  INTEGER,
    is_month_end    INTEGER,
    high_low_range  REAL,
    average_price   REAL,
    volume_change   REAL,
    close_lag_1     REAL,
    close_lag_2     REAL,
    return          REAL,
    return_lag_1    REAL,
    rolling_mean_7  REAL,
    rolling_std_7   REAL,
    rolling_mean_30 REAL,
    rolling_std_30  REAL,
    ma14            REAL,
    ma30            REAL,
    ma50            REAL,
    ma200           REAL,
    rsi14           REAL,
    rsi30           REAL,
    rsi50           REAL,
    roc14           REAL,
    vol14           REAL,
    up_day          INTEGER,
    down_day        INTEGER,
    PRIMARY KEY (ticker, date)
);

CREATE TABLE IF NOT EXISTS simulation_runs (
    run_id             INTEGER PRIMARY KEY AUTOINCREMENT,
    portfolio_type     TEXT    NOT NULL,
    time_horizon_years INTEGER NOT NULL,
    num_simulations    INTEGER NOT NULL,
    created_at         TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS simulation_results (
    run_id            INTEGER NOT NULL REFERENCES simulation_runs(run_id),
    ticker            TEXT    NOT NULL,
    initial_value     REAL    NOT NULL,
    final_value       REAL,
    return_pct        REAL,
    simulation_number INTEGER NOT NULL,
    PRIMARY KEY (run_id, ticker, simulation_number)
);

CREATE TABLE IF NOT EXISTS portfolio_results (
    run_id            INTEGER NOT NULL REFERENCES simulation_runs(run_id),
    portfolio_type    TEXT    NOT NULL,
    final_value       REAL,
    return_pct        REAL,
    simulation_number INTEGER NOT NULL,
    PRIMARY KEY (run_id, simulation_number)
);

CREATE TABLE IF NOT EXISTS simulation_summary (
    run_id         INTEGER NOT NULL REFERENCES simulation_runs(run_id),
    portfolio_type TEXT    NOT NULL,
    metric_name    TEXT    NOT NULL,
    metric_value   REAL,
    PRIMARY KEY (run_id, portfolio_type, metric_name)
);
";

const INSERT_FEATURE: &str = "
INSERT INTO processed_market_data (
    ticker, date, open, high, low, close, volume, vwap,
    year, month, day, weekday, is_month_start, is_month_end,
    high_low_range, average_price, volume_change,
    close_lag_1, close_lag_2, return, return_lag_1,
    rolling_mean_7, rolling_std_7, rolling_mean_30, rolling_std_30,
    ma14, ma30, ma50, ma200,
    rsi14, rsi30, rsi50,
    roc14, vol14,
    up_day, down_day
) VALUES (
    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8,
    ?9, ?10, ?11, ?12, ?13, ?14,
    ?15, ?16, ?17,
    ?18, ?19, ?20, ?21,
    ?22, ?23, ?24, ?25,
    ?26, ?27, ?28, ?29,
    ?30, ?31, ?32,
    ?33, ?34,
    ?35, ?36
)
ON CONFLICT (ticker, date) DO NOTHING";

/// NULL reads back as NaN; SQLite stores NaN as NULL.
fn real(row: &Row<'_>, idx: usize) -> rusqlite::Result<f64> {
    Ok(row.get::<_, Option<f64>>(idx)?.unwrap_or(f64::NAN))
}

/// SQLite-backed [`Store`]. The connection is closed on drop.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database file and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        let _ = conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;");
        debug!(path = %path.display(), "opened database");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }
}

impl Store for SqliteStore {
    fn upsert_bars(&mut self, ticker: &str, bars: &[Bar]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO raw_market_data (ticker, timestamp, open, high, low, close, volume, vwap)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT (ticker, timestamp) DO NOTHING",
            )?;
            for bar in bars {
                let r = BarRecord::new(ticker, bar);
                inserted += stmt.execute(params![
                    r.ticker, r.timestamp, r.open, r.high, r.low, r.close, r.volume, r.vwap
                ])?;
            }
        }
        tx.commit()?;
        info!(ticker, received = bars.len(), inserted, "stored raw bars");
        Ok(inserted)
    }

    fn latest_bar_date(&self, ticker: &str) -> Result<Option<NaiveDate>> {
        let date = self
            .conn
            .query_row(
                "SELECT MAX(timestamp) FROM raw_market_data WHERE ticker = ?1",
                params![ticker],
                |row| row.get::<_, Option<NaiveDate>>(0),
            )
            .optional()?
            .flatten();
        Ok(date)
    }

    fn load_bars(&self, ticker: &str) -> Result<BarSeries> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT ticker, timestamp, open, high, low, close, volume, vwap
             FROM raw_market_data WHERE ticker = ?1 ORDER BY timestamp",
        )?;
        let bars = stmt
            .query_map(params![ticker], |row| {
                Ok(BarRecord {
                    ticker: row.get(0)?,
                    timestamp: row.get(1)?,
                    open: row.get(2)?,
                    high: row.get(3)?,
                    low: row.get(4)?,
                    close: row.get(5)?,
                    volume: row.get(6)?,
                    vwap: row.get(7)?,
                })
            })?
            .map(|r| r.map(|record| record.to_bar()))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(BarSeries::from_bars(ticker, bars))
    }

    fn upsert_features(&mut self, features: &FeatureSet) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached(INSERT_FEATURE)?;
            for row in &features.rows {
                let r = FeatureRecord::new(&features.ticker, row);
                inserted += stmt.execute(params![
                    r.ticker,
                    r.date,
                    r.open,
                    r.high,
                    r.low,
                    r.close,
                    r.volume,
                    r.vwap,
                    r.year,
                    r.month,
                    r.day,
                    r.weekday,
                    r.is_month_start,
                    r.is_month_end,
                    r.high_low_range,
                    r.average_price,
                    r.volume_change,
                    r.close_lag_1,
                    r.close_lag_2,
                    r.daily_return,
                    r.return_lag_1,
                    r.rolling_mean_7,
                    r.rolling_std_7,
                    r.rolling_mean_30,
                    r.rolling_std_30,
                    r.ma14,
                    r.ma30,
                    r.ma50,
                    r.ma200,
                    r.rsi14,
                    r.rsi30,
                    r.rsi50,
                    r.roc14,
                    r.vol14,
                    r.up_day,
                    r.down_day,
                ])?;
            }
        }
        tx.commit()?;
        info!(ticker = %features.ticker, rows = features.len(), inserted, "stored feature rows");
        Ok(inserted)
    }

    fn feature_count(&self, ticker: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM processed_market_data WHERE ticker = ?1",
            params![ticker],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn load_price_history(&self, ticker: &str) -> Result<PriceHistory> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT date, close, return FROM processed_market_data WHERE ticker = ?1 ORDER BY date",
        )?;
        let mut history = PriceHistory { ticker: ticker.to_string(), ..Default::default() };
        let mut returns = Vec::new();
        let mut rows = stmt.query(params![ticker])?;
        while let Some(row) = rows.next()? {
            history.dates.push(row.get(0)?);
            history.closes.push(real(row, 1)?);
            returns.push(real(row, 2)?);
        }
        history.returns = Some(returns);
        Ok(history)
    }

    fn persist_run(&mut self, simulation: &PortfolioSimulation) -> Result<SimulationRun> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO simulation_runs (portfolio_type, time_horizon_years, num_simulations)
             VALUES (?1, ?2, ?3)",
            params![simulation.label, simulation.horizon_years, simulation.n_trials as i64],
        )?;
        let run_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO simulation_results
                     (run_id, ticker, initial_value, final_value, return_pct, simulation_number)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for r in simulation.simulation_results(run_id) {
                stmt.execute(params![
                    r.run_id,
                    r.ticker,
                    r.initial_value,
                    r.terminal_value,
                    r.return_pct,
                    r.trial as i64
                ])?;
            }

            let mut stmt = tx.prepare_cached(
                "INSERT INTO portfolio_results
                     (run_id, portfolio_type, final_value, return_pct, simulation_number)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for r in simulation.portfolio_results(run_id) {
                stmt.execute(params![r.run_id, r.portfolio, r.terminal_value, r.return_pct, r.trial as i64])?;
            }

            let mut stmt = tx.prepare_cached(
                "INSERT INTO simulation_summary (run_id, portfolio_type, metric_name, metric_value)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for s in simulation.summary_statistics(run_id) {
                stmt.execute(params![s.run_id, s.portfolio, s.metric, s.value])?;
            }
        }
        tx.commit()?;

        info!(
            run_id,
            portfolio = %simulation.label,
            horizon = simulation.horizon_years,
            trials = simulation.n_trials,
            "stored simulation run"
        );
        Ok(SimulationRun {
            run_id,
            portfolio: simulation.label.clone(),
            horizon_years: simulation.horizon_years,
            n_trials: simulation.n_trials,
        })
    }

    fn list_runs(&self) -> Result<Vec<SimulationRun>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, portfolio_type, time_horizon_years, num_simulations
             FROM simulation_runs ORDER BY run_id",
        )?;
        let runs = stmt
            .query_map([], |row| {
                Ok(SimulationRun {
                    run_id: row.get(0)?,
                    portfolio: row.get(1)?,
                    horizon_years: row.get(2)?,
                    n_trials: row.get::<_, i64>(3)? as usize,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(runs)
    }

    fn load_simulation_results(&self, run_id: RunId) -> Result<Vec<SimulationResult>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT run_id, ticker, initial_value, final_value, return_pct, simulation_number
             FROM simulation_results WHERE run_id = ?1 ORDER BY rowid",
        )?;
        let results = stmt
            .query_map(params![run_id], |row| {
                Ok(SimulationResult {
                    run_id: row.get(0)?,
                    ticker: row.get(1)?,
                    initial_value: row.get(2)?,
                    terminal_value: real(row, 3)?,
                    return_pct: real(row, 4)?,
                    trial: row.get::<_, i64>(5)? as usize,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(results)
    }

    fn load_portfolio_results(&self, run_id: RunId) -> Result<Vec<PortfolioResult>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT run_id, portfolio_type, final_value, return_pct, simulation_number
             FROM portfolio_results WHERE run_id = ?1 ORDER BY simulation_number",
        )?;
        let results = stmt
            .query_map(params![run_id], |row| {
                Ok(PortfolioResult {
                    run_id: row.get(0)?,
                    portfolio: row.get(1)?,
                    terminal_value: real(row, 2)?,
                    return_pct: real(row, 3)?,
                    trial: row.get::<_, i64>(4)? as usize,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(results)
    }

    fn load_summary(&self, run_id: RunId) -> Result<Vec<SummaryStatistic>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT run_id, portfolio_type, metric_name, metric_value
             FROM simulation_summary WHERE run_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok(SummaryStatistic {
                    run_id: row.get(0)?,
                    portfolio: row.get(1)?,
                    metric: row.get(2)?,
                    value: real(row, 3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
