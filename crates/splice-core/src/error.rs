//! Error types for Splice.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for Splice operations.
#[derive(Error, Debug)]
pub enum SpliceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A history was asked to replay records onto a document it does not belong to.
    #[error("Edit context mismatch: history belongs to {expected}, got {found}")]
    ContextMismatch { expected: Uuid, found: Uuid },

    #[error("Job error: {0}")]
    Job(String),

    #[error("Job cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for Splice operations.
pub type Result<T> = std::result::Result<T, SpliceError>;
