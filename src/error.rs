//! Error types for the clutch-window engine
//!
//! Only the edges of the pipeline can fail (vendor parsing, clock/score
//! normalization, configuration, encoding). The segmentation core is total.

use thiserror::Error;

/// Errors that can occur while preparing input or encoding output
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse vendor payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid game clock: {0}")]
    InvalidClock(String),

    #[error("Invalid score: {0}")]
    InvalidScore(String),

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Unsupported vendor: {0}")]
    UnsupportedVendor(String),
}
