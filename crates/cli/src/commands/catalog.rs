//! Catalog maintenance commands.
//!
//! # Environment Variables
//!
//! - `LEDGER_CATALOG_URL` - Indexed catalog endpoint
//! - `LEDGER_CACHE_DIR` - Directory holding `catalog-cache.json` (default: .cache)
//! - `LEDGER_CATALOG_MAX_AGE_HOURS` - Freshness window (default: 24)

use std::time::Duration;

use card_ledger_server::catalog::{
    CatalogError, Clock, FileSnapshotStore, SnapshotError, SnapshotStore, SystemClock,
    build_catalog_cache,
};
use card_ledger_server::config::{CatalogConfig, ConfigError};
use thiserror::Error;

/// Errors from catalog commands.
#[derive(Debug, Error)]
pub enum CatalogCommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

fn load_config() -> Result<CatalogConfig, ConfigError> {
    let _ = dotenvy::dotenv();
    CatalogConfig::from_env()
}

/// Fetch the catalog and overwrite the local snapshot.
///
/// # Errors
///
/// Returns `CatalogCommandError` if the fetch fails.
pub async fn refresh() -> Result<(), CatalogCommandError> {
    let config = load_config()?;
    tracing::info!(url = %config.url, "Fetching catalog...");

    let snapshot = build_catalog_cache(&config)?.refresh().await?;

    tracing::info!(
        cards = snapshot.cards.len(),
        path = %FileSnapshotStore::new(&config.cache_dir).path().display(),
        "Catalog snapshot written"
    );
    Ok(())
}

/// Print the snapshot's age and card count.
///
/// # Errors
///
/// Returns `CatalogCommandError` if the snapshot file exists but is unreadable.
pub async fn status() -> Result<(), CatalogCommandError> {
    let config = load_config()?;
    let store = FileSnapshotStore::new(&config.cache_dir);

    let Some(snapshot) = store.load().await? else {
        #[allow(clippy::print_stdout)]
        {
            println!("No catalog snapshot at {}", store.path().display());
        }
        return Ok(());
    };

    let now = SystemClock.now_epoch_ms();
    let age = Duration::from_millis(
        u64::try_from(now.saturating_sub(snapshot.fetched_at_epoch_ms)).unwrap_or(0),
    );
    let fetched_at = chrono::DateTime::from_timestamp_millis(snapshot.fetched_at_epoch_ms)
        .map_or_else(|| "unknown".to_owned(), |t| t.to_rfc3339());
    let state = if snapshot.is_fresh(now, config.max_age) {
        "fresh"
    } else {
        "stale"
    };

    #[allow(clippy::print_stdout)]
    {
        println!("Snapshot:   {}", store.path().display());
        println!("Cards:      {}", snapshot.cards.len());
        println!("Fetched at: {fetched_at}");
        println!("Age:        {}m ({state})", age.as_secs() / 60);
    }
    Ok(())
}
