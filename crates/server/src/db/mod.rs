//! Database operations for the ledger `PostgreSQL`.
//!
//! # Schema: `ledger`
//!
//! ## Tables
//!
//! - `ownership` - Copies of a card held by an owner, keyed by `(owner_id, card_id)`
//! - `friend_link` - One-directional friend links, keyed by `(owner_id, friend_id)`
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p card-ledger-cli -- migrate
//! ```

pub mod friends;
pub mod ownership;

use std::time::Duration;

use async_trait::async_trait;
use card_ledger_core::{
    CardId, DesiredQuantity, FriendLink, OwnerId, OwnershipRecord, ReconcileOutcome,
};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use friends::FriendRepository;
pub use ownership::OwnershipRepository;

use crate::store::{OwnershipStore, StoreError};

/// Postgres error code for `numeric_value_out_of_range`.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., quantity overflow).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map constraint-style database errors to [`RepositoryError::Conflict`].
    fn from_write(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) {
                return Self::Conflict("quantity overflow".to_owned());
            }
            if db_err.is_check_violation() {
                return Self::Conflict(db_err.message().to_owned());
            }
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

// =============================================================================
// PgOwnershipStore
// =============================================================================

/// [`OwnershipStore`] backed by the `ledger` schema.
#[derive(Debug, Clone)]
pub struct PgOwnershipStore {
    pool: PgPool,
}

impl PgOwnershipStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl OwnershipStore for PgOwnershipStore {
    async fn list_owned(&self, owner_id: &OwnerId) -> Result<Vec<OwnershipRecord>, StoreError> {
        Ok(OwnershipRepository::new(&self.pool)
            .list_for_owner(owner_id)
            .await?)
    }

    async fn add_or_increment(
        &self,
        owner_id: &OwnerId,
        card_id: &CardId,
        delta: i32,
    ) -> Result<u32, StoreError> {
        crate::store::validate_delta(delta)?;
        Ok(OwnershipRepository::new(&self.pool)
            .add_or_increment(owner_id, card_id, delta)
            .await?)
    }

    async fn reconcile(
        &self,
        owner_id: &OwnerId,
        desired: &[DesiredQuantity],
    ) -> Result<ReconcileOutcome, StoreError> {
        crate::store::validate_batch(desired)?;
        Ok(OwnershipRepository::new(&self.pool)
            .reconcile(owner_id, desired)
            .await?)
    }

    async fn add_friend_link(&self, link: &FriendLink) -> Result<(), StoreError> {
        let link = crate::store::normalize_link(link)?;
        Ok(FriendRepository::new(&self.pool).upsert(&link).await?)
    }

    async fn remove_friend_link(
        &self,
        owner_id: &OwnerId,
        friend_id: &OwnerId,
    ) -> Result<bool, StoreError> {
        Ok(FriendRepository::new(&self.pool)
            .delete(owner_id, friend_id)
            .await?)
    }

    async fn list_friend_links(&self, owner_id: &OwnerId) -> Result<Vec<FriendLink>, StoreError> {
        Ok(FriendRepository::new(&self.pool)
            .list_for_owner(owner_id)
            .await?)
    }
}
