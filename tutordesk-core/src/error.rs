//! Error types for the engagement core
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation. Nothing in this core is fatal: every failure degrades to
//! an operator-visible state rather than aborting the session.

use thiserror::Error;

/// Main error type for the engagement core
#[derive(Error, Debug)]
pub enum Error {
    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation not valid in the current queue state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Report queue opened with zero recipients
    #[error("Report queue opened with no recipients")]
    EmptyRecipients,

    /// Text-generation service call failed
    #[error("Generation error: {0}")]
    Generation(String),

    /// Delivery gateway call failed
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using the engagement core Error
pub type Result<T> = std::result::Result<T, Error>;
