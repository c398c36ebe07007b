//! 30-year fixed mortgage rates (Freddie Mac PMMS shape).

use super::SeriesProvider;
use super::synthetic::{cached_or_generate, calendar, clipped_noise};
use crate::cache::SqliteCache;
use crate::error::Result;
use foresight_features::TimeSeries;

/// Cache key for the mortgage rate series.
pub const CACHE_KEY: &str = "pmms_rates";

/// Synthetic mortgage rates: `6.0 + 0.5 z`, clipped to `[3.0, 8.0]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MortgageRateProvider<'a> {
    cache: Option<&'a SqliteCache>,
}

impl<'a> MortgageRateProvider<'a> {
    /// Create a provider, optionally backed by a cache.
    pub const fn new(cache: Option<&'a SqliteCache>) -> Self {
        Self { cache }
    }
}

impl SeriesProvider for MortgageRateProvider<'_> {
    fn name(&self) -> &'static str {
        CACHE_KEY
    }

    fn get_series(&self, force_refresh: bool) -> Result<TimeSeries> {
        cached_or_generate(self.cache, CACHE_KEY, force_refresh, || {
            let values = clipped_noise(6.0, 0.5, 3.0, 8.0);
            Ok(TimeSeries::new("mortgage_rate", calendar().into_iter().zip(values))?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mortgage_rates() {
        let series = MortgageRateProvider::default().get_series(false).unwrap();
        assert_eq!(series.len(), 300);
        assert_eq!(series.name(), "mortgage_rate");
        assert!(series.values().iter().all(|v| (3.0..=8.0).contains(v)));
    }
}
