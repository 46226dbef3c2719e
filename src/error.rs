//! Error types for the momo-analytics library.
//!
//! Document-level parse failures and storage failures are reported through
//! [`MomoError`]. Field extraction never fails, so it has no variant here.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the momo-analytics library.
#[derive(Error, Debug)]
pub enum MomoError {
    /// The source document does not exist
    #[error("Source document not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The source document could not be parsed structurally
    #[error("Malformed source document: {0}")]
    MalformedSource(String),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool errors
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV export errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An extraction pattern failed to compile
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Result with `MomoError`
pub type Result<T> = std::result::Result<T, MomoError>;

impl MomoError {
    /// True for the two document-level failures the batch parser degrades on
    #[must_use]
    pub const fn is_source_failure(&self) -> bool {
        matches!(self, Self::SourceNotFound(_) | Self::MalformedSource(_))
    }
}

impl From<tokio::task::JoinError> for MomoError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Other(format!("Background task failed: {err}"))
    }
}
