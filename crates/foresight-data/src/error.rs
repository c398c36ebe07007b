//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur during data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Download failed with a non-network cause
    #[error("Failed to download {source_name}: {reason}")]
    Download {
        /// Source being downloaded
        source_name: String,
        /// Failure description
        reason: String,
    },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// Region code absent from the table
    #[error(
        "Region {region} not found. Sample available codes: {}. \
         Codes may be stored without leading zeros (e.g. 8901 instead of 08901).",
        .samples.join(", ")
    )]
    RegionNotFound {
        /// Requested region code
        region: String,
        /// Up to ten codes that do exist
        samples: Vec<String>,
    },

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Series construction error
    #[error("Series error: {0}")]
    Series(#[from] foresight_features::FeatureError),

    /// Cache error
    #[error("Cache error: {0}")]
    Cache(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_not_found_lists_samples() {
        let err = DataError::RegionNotFound {
            region: "00000".to_string(),
            samples: vec!["8901".to_string(), "10001".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("00000"));
        assert!(message.contains("8901, 10001"));
    }
}
