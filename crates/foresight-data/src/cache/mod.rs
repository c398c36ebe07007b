//! Caching layer for downloaded and generated data.

pub mod sqlite;

pub use sqlite::{CacheStats, SqliteCache};
