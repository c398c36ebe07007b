#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/foresight/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod pipeline;
pub mod report;

// Re-export sub-crates
pub use foresight_data as data;
pub use foresight_features as features;
pub use foresight_models as models;

pub use error::{PipelineError, Result};
pub use pipeline::{ForecastConfig, ModelKind, load_market_series, run_forecast};
pub use report::{ForecastReport, ReportPoint};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
