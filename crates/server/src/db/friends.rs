//! Friend link repository.

use card_ledger_core::{FriendLink, OwnerId};
use sqlx::PgPool;
use tracing::instrument;

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct FriendLinkRow {
    friend_id: OwnerId,
    friend_display_name: String,
}

/// Repository for `ledger.friend_link`.
pub struct FriendRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FriendRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a link, or update the display name of an existing one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the row violates a check
    /// constraint (self-link).
    #[instrument(skip(self, link), fields(owner_id = %link.owner_id, friend_id = %link.friend_id))]
    pub async fn upsert(&self, link: &FriendLink) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO ledger.friend_link (owner_id, friend_id, friend_display_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (owner_id, friend_id)
            DO UPDATE SET friend_display_name = EXCLUDED.friend_display_name
            ",
        )
        .bind(&link.owner_id)
        .bind(&link.friend_id)
        .bind(&link.friend_display_name)
        .execute(self.pool)
        .await
        .map_err(RepositoryError::from_write)?;
        Ok(())
    }

    /// Delete a link. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn delete(
        &self,
        owner_id: &OwnerId,
        friend_id: &OwnerId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM ledger.friend_link WHERE owner_id = $1 AND friend_id = $2")
                .bind(owner_id)
                .bind(friend_id)
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Links of an owner ordered by display name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails or a stored
    /// friend id does not decode.
    #[instrument(skip(self))]
    pub async fn list_for_owner(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Vec<FriendLink>, RepositoryError> {
        let rows: Vec<FriendLinkRow> = sqlx::query_as(
            r"
            SELECT friend_id, friend_display_name
            FROM ledger.friend_link
            WHERE owner_id = $1
            ORDER BY friend_display_name, friend_id
            ",
        )
        .bind(owner_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| FriendLink {
                owner_id: owner_id.clone(),
                friend_id: row.friend_id,
                friend_display_name: row.friend_display_name,
            })
            .collect())
    }
}
