//! Error types for series and feature operations.

use thiserror::Error;

/// Result type for feature operations.
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Errors that can occur while building series and feature frames.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// A series violated the monthly cadence invariants
    #[error("Invalid series {name}: {reason}")]
    InvalidSeries {
        /// Name of the offending series
        name: String,
        /// What was wrong with it
        reason: String,
    },

    /// A required column is not present
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A column does not match the frame's index length
    #[error("Length mismatch for column {column}: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Column name
        column: String,
        /// Expected number of rows
        expected: usize,
        /// Actual number of rows
        actual: usize,
    },
}
