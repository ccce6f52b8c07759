//! Error types for nanocorr

use thiserror::Error;

/// nanocorr error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error: missing calibration data, unknown period,
    /// double provider installation. Fatal, never retried.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Contract violation: invalid source/scale pair, duplicate source
    /// registration, duplicate column definition. Indicates a programming
    /// error in the registration sequence, not a data problem.
    #[error("Contract violation: {0}")]
    Contract(String),

    /// Column error: unknown column name or column type mismatch.
    #[error("Column error: {0}")]
    Column(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
