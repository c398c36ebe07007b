//! Model errors.

use foresight_features::FeatureError;
use thiserror::Error;

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised while fitting or forecasting.
#[derive(Debug, Error)]
pub enum ModelError {
    /// `predict` was called before `fit`
    #[error("Model must be fitted first")]
    NotFitted,

    /// Fitting failed, including after the fallback configuration
    #[error("Fit failed: {0}")]
    Fit(String),

    /// Forecasting produced no usable values after all fallbacks
    #[error("Forecast failed: {0}")]
    Forecast(String),

    /// Not enough observations for the requested model
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Linear system could not be solved
    #[error("Singular matrix: {0}")]
    Singular(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Feature frame error
    #[error("Feature error: {0}")]
    Feature(#[from] FeatureError),
}
