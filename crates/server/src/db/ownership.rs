//! Ownership repository.

use card_ledger_core::{CardId, DesiredQuantity, OwnerId, OwnershipRecord, ReconcileOutcome};
use sqlx::PgPool;
use tracing::instrument;

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct OwnershipRow {
    card_id: CardId,
    quantity: i32,
}

/// Repository for `ledger.ownership`.
pub struct OwnershipRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OwnershipRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All records of an owner, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails or a stored id
    /// does not decode.
    /// Returns `RepositoryError::DataCorruption` for a negative quantity.
    #[instrument(skip(self), fields(owner_id = %owner_id))]
    pub async fn list_for_owner(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Vec<OwnershipRecord>, RepositoryError> {
        let rows: Vec<OwnershipRow> = sqlx::query_as(
            r"
            SELECT card_id, quantity
            FROM ledger.ownership
            WHERE owner_id = $1
            ORDER BY created_at, card_id
            ",
        )
        .bind(owner_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let quantity = u32::try_from(row.quantity).map_err(|_| {
                    RepositoryError::DataCorruption(format!(
                        "negative quantity for card {}",
                        row.card_id
                    ))
                })?;
                Ok(OwnershipRecord::new(owner_id.clone(), row.card_id, quantity))
            })
            .collect()
    }

    /// Apply `delta` to the `(owner, card)` record and return the new quantity.
    ///
    /// Positive deltas upsert in one statement. Negative deltas lock the row,
    /// then update or delete it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on quantity overflow.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self), fields(owner_id = %owner_id, card_id = %card_id))]
    pub async fn add_or_increment(
        &self,
        owner_id: &OwnerId,
        card_id: &CardId,
        delta: i32,
    ) -> Result<u32, RepositoryError> {
        if delta > 0 {
            let quantity: i32 = sqlx::query_scalar(
                r"
                INSERT INTO ledger.ownership (owner_id, card_id, quantity)
                VALUES ($1, $2, $3)
                ON CONFLICT (owner_id, card_id)
                DO UPDATE SET quantity = ledger.ownership.quantity + EXCLUDED.quantity,
                              updated_at = now()
                RETURNING quantity
                ",
            )
            .bind(owner_id)
            .bind(card_id)
            .bind(delta)
            .fetch_one(self.pool)
            .await
            .map_err(RepositoryError::from_write)?;

            return u32::try_from(quantity)
                .map_err(|_| RepositoryError::DataCorruption("negative quantity".to_owned()));
        }

        let mut tx = self.pool.begin().await?;

        let current: Option<i32> = sqlx::query_scalar(
            r"
            SELECT quantity
            FROM ledger.ownership
            WHERE owner_id = $1 AND card_id = $2
            FOR UPDATE
            ",
        )
        .bind(owner_id)
        .bind(card_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            tx.commit().await?;
            return Ok(0);
        };

        let updated = i64::from(current) + i64::from(delta);
        if updated <= 0 {
            sqlx::query("DELETE FROM ledger.ownership WHERE owner_id = $1 AND card_id = $2")
                .bind(owner_id)
                .bind(card_id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            return Ok(0);
        }

        // current > 0 and delta < 0, so updated < current <= i32::MAX
        let updated = i32::try_from(updated)
            .map_err(|_| RepositoryError::Conflict("quantity overflow".to_owned()))?;
        sqlx::query(
            r"
            UPDATE ledger.ownership
            SET quantity = $3, updated_at = now()
            WHERE owner_id = $1 AND card_id = $2
            ",
        )
        .bind(owner_id)
        .bind(card_id)
        .bind(updated)
        .execute(&mut *tx)
        .await
        .map_err(RepositoryError::from_write)?;
        tx.commit().await?;

        u32::try_from(updated)
            .map_err(|_| RepositoryError::DataCorruption("negative quantity".to_owned()))
    }

    /// Overwrite quantities in one transaction. Zero deletes; absent rows are
    /// counted as missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing is
    /// applied in that case.
    #[instrument(skip(self, desired), fields(owner_id = %owner_id, rows = desired.len()))]
    pub async fn reconcile(
        &self,
        owner_id: &OwnerId,
        desired: &[DesiredQuantity],
    ) -> Result<ReconcileOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut outcome = ReconcileOutcome::default();

        for row in desired {
            if row.quantity == 0 {
                let result =
                    sqlx::query("DELETE FROM ledger.ownership WHERE owner_id = $1 AND card_id = $2")
                        .bind(owner_id)
                        .bind(&row.card_id)
                        .execute(&mut *tx)
                        .await?;
                if result.rows_affected() == 1 {
                    outcome.deleted += 1;
                } else {
                    outcome.missing += 1;
                }
                continue;
            }

            let quantity = i32::try_from(row.quantity)
                .map_err(|_| RepositoryError::Conflict("quantity overflow".to_owned()))?;
            let result = sqlx::query(
                r"
                UPDATE ledger.ownership
                SET quantity = $3, updated_at = now()
                WHERE owner_id = $1 AND card_id = $2
                ",
            )
            .bind(owner_id)
            .bind(&row.card_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::from_write)?;

            if result.rows_affected() == 1 {
                outcome.updated += 1;
            } else {
                outcome.missing += 1;
            }
        }

        tx.commit().await?;
        Ok(outcome)
    }
}
