//! Error handling for the Vendor Analytics Pipeline

use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Data errors
    #[error("invalid volume {value:?} for vendor {vendor_number} brand {brand}: not a number")]
    InvalidVolume {
        value: String,
        vendor_number: i64,
        brand: i64,
    },

    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("ingestion error: {0}")]
    Ingest(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // I/O and serialization errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error")]
    InternalError(#[from] anyhow::Error),
}

/// Result type alias for pipeline operations
pub type AppResult<T> = Result<T, AppError>;
