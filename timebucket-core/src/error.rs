//! Error types for timebucket.

use thiserror::Error;

/// Errors that can occur while configuring or running a grouping.
#[derive(Error, Debug)]
pub enum BucketError {
    #[error("At least one range boundary is required")]
    EmptyBoundaries,

    #[error("Range boundary key must not be empty")]
    EmptyBoundaryKey,

    #[error("Range '{0}' is declared more than once")]
    DuplicateBoundary(String),

    #[error("Range '{key}' starts {days} days back, which is not older than the previous range ({previous} days)")]
    NonMonotonicBoundary { key: String, days: u32, previous: u32 },

    #[error("Unbounded range '{0}' must be the last range")]
    UnboundedNotLast(String),

    #[error("Invalid timestamp '{input}': {reason}")]
    InvalidTimestamp { input: String, reason: String },

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BucketError {
    pub(crate) fn invalid_timestamp(input: &str, reason: impl Into<String>) -> Self {
        BucketError::InvalidTimestamp {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by a bad range declaration.
    pub fn is_boundary_error(&self) -> bool {
        matches!(
            self,
            BucketError::EmptyBoundaries
                | BucketError::EmptyBoundaryKey
                | BucketError::DuplicateBoundary(_)
                | BucketError::NonMonotonicBoundary { .. }
                | BucketError::UnboundedNotLast(_)
        )
    }
}

/// Result type alias for timebucket operations.
pub type BucketResult<T> = Result<T, BucketError>;
