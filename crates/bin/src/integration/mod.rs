//! Glue between the CLI and the library crates.
//!
//! Owns the on-disk cache location and the cache-aware data loading used by
//! the `forecast` command.

pub(crate) mod cache_manager;
pub(crate) mod data_pipeline;
