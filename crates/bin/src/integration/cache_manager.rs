//! Cache manager for downloaded and generated series.
//!
//! Keeps the SQLite cache in a platform-specific default location.

use foresight_data::{DataError, SqliteCache};
use std::path::PathBuf;

/// Get the default cache directory path.
///
/// Uses platform-specific cache directories:
/// - Linux: `~/.cache/foresight/`
/// - macOS: `~/Library/Caches/foresight/`
/// - Windows: `%LOCALAPPDATA%\foresight\`
pub(crate) fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("foresight")
}

/// Get the cache database path.
pub(crate) fn cache_path() -> PathBuf {
    default_cache_dir().join("foresight.db")
}

/// Open the cache, creating the directory if needed.
pub(crate) fn open_cache() -> Result<SqliteCache, DataError> {
    let path = cache_path();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    SqliteCache::new(&path)
}
