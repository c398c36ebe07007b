//! SQLite blob cache.

use crate::error::Result;
use chrono::{DateTime, Utc};
use foresight_features::TimeSeries;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use tracing::{debug, warn};

/// Key to blob store for downloaded tables and generated series.
///
/// Entries stay valid until overwritten, removed or cleared.
#[derive(Debug)]
pub struct SqliteCache {
    conn: Connection,
}

impl SqliteCache {
    /// Create a new SQLite cache.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Create an in-memory cache (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS blobs (
                key TEXT PRIMARY KEY,
                data BLOB NOT NULL,
                cached_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Store `blob` under `key`, replacing any previous entry.
    pub fn save(&self, blob: &[u8], key: &str) -> Result<()> {
        let cached_at = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR REPLACE INTO blobs (key, data, cached_at) VALUES (?1, ?2, ?3)",
            params![key, blob, cached_at],
        )?;
        debug!(key, bytes = blob.len(), "cache entry saved");
        Ok(())
    }

    /// Load the blob stored under `key`, if any.
    pub fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let result = self
            .conn
            .query_row(
                "SELECT data FROM blobs WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(result)
    }

    /// When the entry under `key` was written.
    pub fn cached_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let stamp: Option<String> = self
            .conn
            .query_row(
                "SELECT cached_at FROM blobs WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(stamp
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    /// Remove the entry under `key`. Returns whether one existed.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM blobs WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    /// Clear all cached data.
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM blobs", [])?;
        Ok(())
    }

    /// Store a series as JSON under `key`.
    pub fn put_series(&self, key: &str, series: &TimeSeries) -> Result<()> {
        let blob = serde_json::to_vec(series)?;
        self.save(&blob, key)
    }

    /// Load a series stored with [`put_series`](Self::put_series).
    ///
    /// An entry that cannot be decoded is reported as absent.
    pub fn get_series(&self, key: &str) -> Result<Option<TimeSeries>> {
        let Some(blob) = self.load(key)? else {
            return Ok(None);
        };
        match serde_json::from_slice(&blob) {
            Ok(series) => Ok(Some(series)),
            Err(e) => {
                warn!(key, error = %e, "unreadable cache entry, treating as absent");
                Ok(None)
            }
        }
    }

    /// Get cache statistics.
    pub fn get_stats(&self) -> Result<CacheStats> {
        let (entries, total_bytes): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(LENGTH(data)), 0) FROM blobs",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let mut stmt = self.conn.prepare("SELECT key FROM blobs ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(CacheStats {
            entries: entries as usize,
            total_bytes: total_bytes as usize,
            keys,
        })
    }
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of stored entries
    pub entries: usize,
    /// Total payload size in bytes
    pub total_bytes: usize,
    /// Stored keys, sorted
    pub keys: Vec<String>,
}
