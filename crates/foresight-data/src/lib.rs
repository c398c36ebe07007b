#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/foresight/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod error;
pub mod sources;

pub use cache::{CacheStats, SqliteCache};
pub use error::{DataError, Result};
pub use sources::{
    HpiProvider, InventoryProvider, MortgageRateProvider, SeriesProvider, ZillowProvider,
    extract_region_series, parse_table,
};

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
