//! Card catalog: remote source, persisted snapshot and freshness cache.
//!
//! # Architecture
//!
//! - [`CatalogSource`] fetches the full catalog (the indexed HTTP endpoint in
//!   production, a static list in tests)
//! - [`SnapshotStore`] persists the last fetch under the `catalog-cache` key
//! - [`CatalogCache`] serves the snapshot while it is younger than the
//!   freshness window (24 hours by default) and refetches otherwise
//! - [`Clock`] is injected so freshness can be tested without waiting
//!
//! An expired snapshot is treated as absent: if the refetch fails the caller
//! gets [`CatalogError`], never stale data.

mod cache;
mod clock;
mod snapshot;
mod source;

pub use cache::{CATALOG_CACHE_KEY, CachedCatalogSnapshot, CatalogCache, DEFAULT_MAX_AGE};
pub use clock::{Clock, ManualClock, SystemClock};
pub use snapshot::{FileSnapshotStore, MemorySnapshotStore, SnapshotError, SnapshotStore};
pub use source::{
    CatalogSource, HttpCatalogSource, MalformedCatalogEntry, StaticCatalogSource,
    parse_indexed_catalog,
};

use std::sync::Arc;

use thiserror::Error;

use crate::config::CatalogConfig;

/// Errors that make the catalog unavailable.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("catalog endpoint returned HTTP {0}")]
    Status(u16),

    /// The response body was not the expected shape.
    #[error("catalog response could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),

    /// Any other reason the source could not produce a catalog.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// Build the production cache: HTTP source, file snapshot, system clock.
///
/// # Errors
///
/// Returns [`CatalogError::Http`] if the HTTP client cannot be built.
pub fn build_catalog_cache(config: &CatalogConfig) -> Result<CatalogCache, CatalogError> {
    let source = HttpCatalogSource::new(config.url.clone(), config.request_timeout)?;
    Ok(CatalogCache::new(
        Arc::new(source),
        Arc::new(FileSnapshotStore::new(&config.cache_dir)),
        Arc::new(SystemClock),
        config.max_age,
    ))
}
