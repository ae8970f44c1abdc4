//! Error types for the bank-review-analytics library.
//!
//! This module provides custom error types using `thiserror` for better error handling
//! and more specific error messages throughout the pipeline.

use thiserror::Error;

/// Errors that can occur in the bank-review-analytics pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Error talking to the external review source
    #[error("Review source error: {0}")]
    Source(String),

    /// Bank not present in the store when a review references it
    #[error("Bank not found: {0}")]
    BankNotFound(String),

    /// A stage snapshot that should exist is missing
    #[error("Snapshot not found: {0}. Run the earlier pipeline stages first.")]
    SnapshotNotFound(String),

    /// A stage received no input at all
    #[error("No reviews available for {stage}: upstream stages produced an empty set")]
    EmptyInput {
        /// Pipeline stage that had nothing to work on
        stage: &'static str,
    },

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV snapshot read/write errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid date format
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Chart or report artifact rendering errors
    #[error("Render error: {0}")]
    Render(String),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Result with PipelineError
pub type Result<T> = std::result::Result<T, PipelineError>;

impl From<anyhow::Error> for PipelineError {
    fn from(err: anyhow::Error) -> Self {
        PipelineError::Other(err.to_string())
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::Source(err.to_string())
    }
}
