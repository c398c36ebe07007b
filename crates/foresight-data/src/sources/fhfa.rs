//! House price index (FHFA shape).

use super::SeriesProvider;
use super::synthetic::{cached_or_generate, calendar, standard_normal_draws};
use crate::cache::SqliteCache;
use crate::error::Result;
use foresight_features::TimeSeries;

/// Cache key for the house price index.
pub const CACHE_KEY: &str = "fhfa_hpi";

/// Synthetic HPI: a random walk with step `0.5 z`, rebased to start at 100.
#[derive(Debug, Clone, Copy, Default)]
pub struct HpiProvider<'a> {
    cache: Option<&'a SqliteCache>,
}

impl<'a> HpiProvider<'a> {
    /// Create a provider, optionally backed by a cache.
    pub const fn new(cache: Option<&'a SqliteCache>) -> Self {
        Self { cache }
    }
}

fn random_walk(n: usize) -> Vec<f64> {
    let walk: Vec<f64> = standard_normal_draws(n)
        .into_iter()
        .scan(0.0, |level, z| {
            *level += z * 0.5;
            Some(*level)
        })
        .collect();
    let first = walk.first().copied().unwrap_or(0.0);
    walk.into_iter().map(|v| v - first + 100.0).collect()
}

impl SeriesProvider for HpiProvider<'_> {
    fn name(&self) -> &'static str {
        CACHE_KEY
    }

    fn get_series(&self, force_refresh: bool) -> Result<TimeSeries> {
        cached_or_generate(self.cache, CACHE_KEY, force_refresh, || {
            let dates = calendar();
            let values = random_walk(dates.len());
            Ok(TimeSeries::new("hpi", dates.into_iter().zip(values))?)
        })
    }
}
