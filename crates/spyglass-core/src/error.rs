//! Error types for Spyglass Core.
//!
//! The host absorbs most failures internally (missing backends and missing
//! root instances abandon a registration silently, removal failures are only
//! logged), so this taxonomy is intentionally small: it covers the wait
//! timeout contract, queue capacity, and backend capability failures that
//! adapters choose to surface.

use thiserror::Error;

/// Main error type for Spyglass operations.
#[derive(Debug, Error)]
pub enum SpyglassError {
    /// A `wait_for_record` call exceeded its deadline.
    #[error("Timed out waiting for an application record for {app}")]
    WaitTimeout { app: String },

    /// The registration queue is at capacity.
    #[error("Registration queue is full (depth {depth})")]
    QueueFull { depth: usize },

    /// The registration queue worker has shut down.
    #[error("Registration queue is closed")]
    QueueClosed,

    /// A backend adapter capability failed.
    #[error("Backend error: {message}")]
    Backend { message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Spyglass operations.
pub type Result<T> = std::result::Result<T, SpyglassError>;

impl SpyglassError {
    /// Create a backend capability error.
    pub fn backend(message: impl Into<String>) -> Self {
        SpyglassError::Backend {
            message: message.into(),
        }
    }

    /// Check if this error is a wait timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SpyglassError::WaitTimeout { .. })
    }
}
