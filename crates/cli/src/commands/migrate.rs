//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! ledger-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `LEDGER_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! `crates/server/migrations/`:
//! ```text
//! migrations/
//! ├── 20260301000001_create_ownership.sql
//! └── 20260301000002_create_friend_link.sql
//! ```

use card_ledger_server::config::{ConfigError, LedgerConfig};
use card_ledger_server::db;
use thiserror::Error;

/// Errors running migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run the ledger database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let config = LedgerConfig::from_env()?;

    tracing::info!("Connecting to ledger database...");
    let pool = db::create_pool(&config.database_url).await?;

    tracing::info!("Running ledger migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Ledger migrations complete!");
    Ok(())
}
