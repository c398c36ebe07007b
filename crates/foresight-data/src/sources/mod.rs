//! Series providers.
//!
//! Macro providers generate deterministic synthetic data; the Zillow provider
//! downloads the ZIP-level ZHVI table. All of them consult the cache first
//! unless `force_refresh` is set.

pub mod fhfa;
pub mod pmms;
pub mod redfin;
pub mod synthetic;
pub mod zillow;

pub use fhfa::HpiProvider;
pub use pmms::MortgageRateProvider;
pub use redfin::InventoryProvider;
pub use zillow::{ZillowProvider, extract_region_series, parse_table};

use crate::error::Result;
use foresight_features::TimeSeries;

/// A source of one monthly series.
pub trait SeriesProvider {
    /// Cache key and display name of the source.
    fn name(&self) -> &'static str;

    /// Fetch the series, bypassing the cache when `force_refresh` is set.
    fn get_series(&self, force_refresh: bool) -> Result<TimeSeries>;
}
