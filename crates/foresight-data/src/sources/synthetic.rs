//! Seeded synthetic monthly series and the cache-or-generate flow.

use crate::cache::SqliteCache;
use crate::error::Result;
use chrono::NaiveDate;
use foresight_features::TimeSeries;
use foresight_features::calendar::month_range;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};
use tracing::{debug, info, warn};

/// Seed shared by every synthetic source.
pub const SEED: u64 = 42;

/// Month-end calendar covered by synthetic sources: 2000-01 through 2024-12.
pub fn calendar() -> Vec<NaiveDate> {
    match (
        NaiveDate::from_ymd_opt(2000, 1, 31),
        NaiveDate::from_ymd_opt(2024, 12, 31),
    ) {
        (Some(start), Some(end)) => month_range(start, end),
        _ => Vec::new(),
    }
}

/// `n` standard normal draws from a generator seeded with [`SEED`].
pub fn standard_normal_draws(n: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(SEED);
    (0..n)
        .map(|_| -> f64 { StandardNormal.sample(&mut rng) })
        .collect()
}

/// `base + scale * z`, clipped to `[lower, upper]`, for each draw `z`.
pub fn clipped_noise(base: f64, scale: f64, lower: f64, upper: f64) -> Vec<f64> {
    let dates = calendar();
    standard_normal_draws(dates.len())
        .into_iter()
        .map(|z| (base + z * scale).clamp(lower, upper))
        .collect()
}

/// Return the cached series under `key`, or generate, cache and return it.
pub(crate) fn cached_or_generate(
    cache: Option<&SqliteCache>,
    key: &str,
    force_refresh: bool,
    generate: impl FnOnce() -> Result<TimeSeries>,
) -> Result<TimeSeries> {
    if let Some(cache) = cache
        && !force_refresh
        && let Some(series) = cache.get_series(key)?
    {
        debug!(key, points = series.len(), "serving series from cache");
        return Ok(series);
    }

    let series = generate()?;
    info!(key, points = series.len(), "generated series");
    if let Some(cache) = cache
        && let Err(e) = cache.put_series(key, &series)
    {
        warn!(key, error = %e, "failed to cache series");
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_span() {
        let dates = calendar();
        assert_eq!(dates.len(), 300);
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2000, 1, 31).unwrap());
        assert_eq!(dates[299], NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn test_draws_are_reproducible() {
        assert_eq!(standard_normal_draws(10), standard_normal_draws(10));
    }

    #[test]
    fn test_clipping() {
        let values = clipped_noise(0.0, 100.0, -1.0, 1.0);
        assert!(values.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn test_cache_hit_skips_generation() {
        let cache = SqliteCache::in_memory().unwrap();
        let first = cached_or_generate(Some(&cache), "k", false, || {
            Ok(TimeSeries::new("k", [(calendar()[0], 1.0)])?)
        })
        .unwrap();
        let second = cached_or_generate(Some(&cache), "k", false, || {
            panic!("generator must not run on a cache hit")
        })
        .unwrap();
        assert_eq!(first, second);

        let refreshed = cached_or_generate(Some(&cache), "k", true, || {
            Ok(TimeSeries::new("k", [(calendar()[0], 2.0)])?)
        })
        .unwrap();
        assert_eq!(refreshed.values(), &[2.0]);
        assert_eq!(cache.get_series("k").unwrap(), Some(refreshed));
    }
}
