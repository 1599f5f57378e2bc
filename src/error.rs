//! Error types for the signal engine

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SignalError>;

/// Every failure the pipeline reports to its caller.
///
/// Nothing in the core retries or swallows these; adapters (CLI, HTTP API)
/// decide how to surface them.
#[derive(Error, Debug)]
pub enum SignalError {
    #[error("No price history for {0}")]
    EmptyHistory(String),

    #[error("Insufficient history: {rows} rows, need at least {required}")]
    InsufficientHistory { rows: usize, required: usize },

    #[error("Invalid price history: {0}")]
    InvalidHistory(String),

    #[error("Unsupported horizon: {0} days (supported: 30, 60, 90, 120, 180)")]
    UnsupportedHorizon(u32),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Feature mismatch: {0}")]
    FeatureMismatch(String),

    #[error("Degenerate training target: {0}")]
    DegenerateTarget(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Data source error: {0}")]
    DataSource(String),
}

impl SignalError {
    /// Short machine-readable code, used in API error bodies
    pub fn code(&self) -> &'static str {
        match self {
            SignalError::EmptyHistory(_) => "empty_history",
            SignalError::InsufficientHistory { .. } => "insufficient_history",
            SignalError::InvalidHistory(_) => "invalid_history",
            SignalError::UnsupportedHorizon(_) => "unsupported_horizon",
            SignalError::ModelNotFound(_) => "model_not_found",
            SignalError::FeatureMismatch(_) => "feature_mismatch",
            SignalError::DegenerateTarget(_) => "degenerate_target",
            SignalError::Model(_) => "model_error",
            SignalError::Storage(_) => "storage_error",
            SignalError::Http(_) => "http_error",
            SignalError::Serialization(_) => "serialization_error",
            SignalError::Csv(_) => "csv_error",
            SignalError::Io(_) => "io_error",
            SignalError::Config(_) => "config_error",
            SignalError::DataSource(_) => "data_source_error",
        }
    }
}
