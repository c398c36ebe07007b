//! Error types for the forecast pipeline.

use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised while loading data or producing a forecast.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Data loading error
    #[error(transparent)]
    Data(#[from] foresight_data::DataError),

    /// Feature construction error
    #[error(transparent)]
    Feature(#[from] foresight_features::FeatureError),

    /// Model fitting or prediction error
    #[error(transparent)]
    Model(#[from] foresight_models::ModelError),

    /// Requested horizon is not usable
    #[error("Invalid horizon {0}: must be at least one month")]
    InvalidHorizon(usize),

    /// Unrecognised model name
    #[error("Unknown model {0}: expected sarimax or gradient-boosting")]
    UnknownModel(String),

    /// No target observations survived feature construction
    #[error("No home value history for region {0}")]
    EmptyHistory(String),
}

impl PipelineError {
    /// Whether the user can fix this by choosing another region code.
    pub const fn is_region_lookup(&self) -> bool {
        matches!(
            self,
            Self::Data(foresight_data::DataError::RegionNotFound { .. }) | Self::EmptyHistory(_)
        )
    }
}
