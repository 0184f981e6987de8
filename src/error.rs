//! Error types for the throttle gate.

use thiserror::Error;

/// Main error type for gate construction and configuration.
#[derive(Error, Debug)]
pub enum ThrottleError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The gate was built outside a Tokio runtime, so period timers have nowhere to run
    #[error("No Tokio runtime available to drive period timers")]
    NoRuntime,

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for throttle gate operations.
pub type Result<T> = std::result::Result<T, ThrottleError>;
