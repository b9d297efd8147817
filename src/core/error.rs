//! Error types for quantsim.

use thiserror::Error;

/// Result type alias for quantsim operations.
pub type Result<T> = std::result::Result<T, QuantError>;

/// Broad failure classes used by the pipeline to decide what a failure aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unrecognized columns, unparsable cells, unordered dates.
    DataFormat,
    /// Not enough rows for the rolling windows, or no returns to estimate from.
    InsufficientHistory,
    /// The durable store rejected a write or read.
    Persistence,
    /// Degenerate or missing starting price / drift / volatility.
    SimulationInput,
    /// Caller supplied an invalid argument or configuration.
    Invalid,
    /// Market-data source failure.
    Source,
    /// Per-ticker trial sequences do not line up.
    Misaligned,
    /// Cooperative cancellation was requested.
    Cancelled,
}

/// Error types for feature engineering, simulation, and persistence.
#[derive(Error, Debug)]
pub enum QuantError {
    /// A required column is absent from the input table.
    #[error("Missing column: {column}")]
    MissingColumn { column: String },

    /// A row could not be interpreted.
    #[error("Malformed row {row}: {message}")]
    MalformedRow { row: usize, message: String },

    /// Not enough rows to fill the longest rolling window.
    #[error("Insufficient history: need at least {required} rows, got {available}")]
    InsufficientHistory { required: usize, available: usize },

    /// No daily returns could be derived for a ticker.
    #[error("No historical data for {ticker}")]
    NoHistoricalData { ticker: String },

    /// Degenerate simulation input.
    #[error("Invalid simulation input for {ticker}: {message}")]
    SimulationInput { ticker: String, message: String },

    /// A ticker's outcome for a trial index is missing, duplicated or out of range.
    #[error("Ticker {ticker} is misaligned at trial {trial}")]
    TrialMisaligned { ticker: String, trial: usize },

    /// Invalid parameter value.
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Empty data error.
    #[error("Empty data provided for {context}")]
    EmptyData { context: String },

    /// Market-data source failure.
    #[error("Source error for {ticker}: {message}")]
    Source { ticker: String, message: String },

    /// Storage failure.
    #[error("Persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),

    /// CSV reader/writer failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Work was cancelled before it completed.
    #[error("Cancelled")]
    Cancelled,
}

impl QuantError {
    /// Create a missing column error.
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn { column: column.into() }
    }

    /// Create a malformed row error.
    pub fn malformed_row(row: usize, message: impl Into<String>) -> Self {
        Self::MalformedRow { row, message: message.into() }
    }

    /// Create an insufficient history error.
    pub fn insufficient_history(required: usize, available: usize) -> Self {
        Self::InsufficientHistory { required, available }
    }

    /// Create a no historical data error.
    pub fn no_historical_data(ticker: impl Into<String>) -> Self {
        Self::NoHistoricalData { ticker: ticker.into() }
    }

    /// Create a simulation input error.
    pub fn simulation_input(ticker: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SimulationInput { ticker: ticker.into(), message: message.into() }
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter { message: message.into() }
    }

    /// Create an invalid config error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig { message: message.into() }
    }

    /// Create an empty data error.
    pub fn empty_data(context: impl Into<String>) -> Self {
        Self::EmptyData { context: context.into() }
    }

    /// Create a source error.
    pub fn source(ticker: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Source { ticker: ticker.into(), message: message.into() }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingColumn { .. } | Self::MalformedRow { .. } | Self::Csv(_) => {
                ErrorKind::DataFormat
            }
            Self::InsufficientHistory { .. } | Self::NoHistoricalData { .. } => {
                ErrorKind::InsufficientHistory
            }
            Self::Persistence(_) | Self::Io(_) => ErrorKind::Persistence,
            Self::SimulationInput { .. } => ErrorKind::SimulationInput,
            Self::InvalidParameter { .. } | Self::InvalidConfig { .. } | Self::EmptyData { .. } => {
                ErrorKind::Invalid
            }
            Self::Source { .. } => ErrorKind::Source,
            Self::TrialMisaligned { .. } => ErrorKind::Misaligned,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Whether the failure only concerns the ticker being processed.
    ///
    /// Batch loops skip these and continue with the next ticker.
    pub fn is_ticker_scoped(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::DataFormat
                | ErrorKind::InsufficientHistory
                | ErrorKind::SimulationInput
                | ErrorKind::Source
        )
    }
}

#[cfg(feature = "python")]
impl From<QuantError> for pyo3::PyErr {
    fn from(err: QuantError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
