//! Housing inventory (Redfin shape).

use super::SeriesProvider;
use super::synthetic::{cached_or_generate, calendar, clipped_noise};
use crate::cache::SqliteCache;
use crate::error::Result;
use foresight_features::TimeSeries;

/// Cache key for the inventory series.
pub const CACHE_KEY: &str = "redfin_inventory";

/// Synthetic inventory: `1000 + 200 z`, clipped to `[500, 2000]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryProvider<'a> {
    cache: Option<&'a SqliteCache>,
}

impl<'a> InventoryProvider<'a> {
    /// Create a provider, optionally backed by a cache.
    pub const fn new(cache: Option<&'a SqliteCache>) -> Self {
        Self { cache }
    }
}

impl SeriesProvider for InventoryProvider<'_> {
    fn name(&self) -> &'static str {
        CACHE_KEY
    }

    fn get_series(&self, force_refresh: bool) -> Result<TimeSeries> {
        cached_or_generate(self.cache, CACHE_KEY, force_refresh, || {
            let values = clipped_noise(1000.0, 200.0, 500.0, 2000.0);
            Ok(TimeSeries::new("inventory", calendar().into_iter().zip(values))?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_bounds() {
        let series = InventoryProvider::default().get_series(true).unwrap();
        assert_eq!(series.len(), 300);
        assert!(series.values().iter().all(|v| (500.0..=2000.0).contains(v)));
    }
}
