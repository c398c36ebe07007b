//! Cache-aware loading of the market series for one region.

use super::cache_manager;
use foresight::features::MarketSeries;
use foresight::{Result, load_market_series};
use foresight_data::SqliteCache;
use indicatif::ProgressBar;
use tracing::warn;

/// Configuration for data fetching.
#[derive(Debug, Clone)]
pub(crate) struct FetchConfig {
    /// Whether to use the cache.
    pub use_cache: bool,
    /// Whether to force refresh (ignore cached entries).
    pub force_refresh: bool,
}

/// Open the cache when enabled. A cache that cannot be opened is skipped.
fn open_if_enabled(config: &FetchConfig) -> Option<SqliteCache> {
    if !config.use_cache {
        return None;
    }
    match cache_manager::open_cache() {
        Ok(cache) => Some(cache),
        Err(e) => {
            warn!(error = %e, "cache unavailable, continuing without it");
            None
        }
    }
}

/// Load home values for `region` plus every macro series.
pub(crate) async fn load_market(
    region: &str,
    config: &FetchConfig,
    progress: Option<&ProgressBar>,
) -> Result<MarketSeries> {
    let cache = open_if_enabled(config);

    if let Some(pb) = progress {
        pb.set_message(match (&cache, config.force_refresh) {
            (Some(_), false) => format!("Loading data for {} (cached where available)...", region),
            _ => format!("Downloading data for {}...", region),
        });
    }

    load_market_series(region, cache.as_ref(), config.force_refresh).await
}

/// Print cache location and contents.
pub(crate) fn print_cache_info() {
    println!("  Cache location: {}", cache_manager::cache_path().display());
    if let Some(stats) = cache_manager::open_cache()
        .ok()
        .and_then(|cache| cache.get_stats().ok())
    {
        println!(
            "  Cached data: {} entries ({} bytes)",
            stats.entries, stats.total_bytes
        );
        for key in &stats.keys {
            println!("    {}", key);
        }
    }
}

/// Remove every cache entry. Returns how many were removed.
pub(crate) fn clear_cache() -> foresight_data::Result<usize> {
    let cache = cache_manager::open_cache()?;
    let entries = cache.get_stats()?.entries;
    cache.clear_all()?;
    Ok(entries)
}
