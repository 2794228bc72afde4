//! Ownership store adapter.
//!
//! # Architecture
//!
//! - [`OwnershipStore`] is the seam every screen writes through
//! - [`crate::db::PgOwnershipStore`] is the production implementation
//! - [`MemoryOwnershipStore`] backs tests and local development
//!
//! Records are keyed by the composite `(owner_id, card_id)`, so an increment
//! can never create a second record for a pair that already exists. Bulk
//! reconciles are all-or-nothing.

mod memory;

pub use memory::MemoryOwnershipStore;

use std::collections::HashSet;

use async_trait::async_trait;
use card_ledger_core::{
    CardId, DesiredQuantity, FriendLink, OwnerId, OwnershipRecord, ReconcileOutcome,
};
use thiserror::Error;

use crate::db::RepositoryError;

/// Longest friend display name kept.
pub const MAX_DISPLAY_NAME_LENGTH: usize = 100;

/// Errors returned by the ownership store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached or the operation failed there.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The request was rejected before touching the store.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<RepositoryError> for StoreError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(msg) => Self::InvalidInput(msg),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

/// Reads and writes owned-card records and friend links.
#[async_trait]
pub trait OwnershipStore: Send + Sync + 'static {
    /// All records for `owner_id`.
    async fn list_owned(&self, owner_id: &OwnerId) -> Result<Vec<OwnershipRecord>, StoreError>;

    /// Add `delta` copies (negative to remove) and return the new quantity.
    ///
    /// Creates the record when absent and `delta > 0`; deletes it when the
    /// quantity drops to zero or below. A quantity of `0` in the result means
    /// no record exists afterwards.
    async fn add_or_increment(
        &self,
        owner_id: &OwnerId,
        card_id: &CardId,
        delta: i32,
    ) -> Result<u32, StoreError>;

    /// Overwrite quantities for existing records; zero deletes.
    ///
    /// Rows with no existing record are counted as `missing` and skipped.
    /// Either every row is applied or none is.
    async fn reconcile(
        &self,
        owner_id: &OwnerId,
        desired: &[DesiredQuantity],
    ) -> Result<ReconcileOutcome, StoreError>;

    /// Create or rename a friend link.
    async fn add_friend_link(&self, link: &FriendLink) -> Result<(), StoreError>;

    /// Delete a friend link. Returns `false` if it did not exist.
    async fn remove_friend_link(
        &self,
        owner_id: &OwnerId,
        friend_id: &OwnerId,
    ) -> Result<bool, StoreError>;

    /// All friend links of `owner_id`.
    async fn list_friend_links(&self, owner_id: &OwnerId) -> Result<Vec<FriendLink>, StoreError>;
}

// =============================================================================
// Shared validation
// =============================================================================

/// Reject a zero delta.
pub(crate) fn validate_delta(delta: i32) -> Result<(), StoreError> {
    if delta == 0 {
        return Err(StoreError::InvalidInput("delta must not be zero".to_owned()));
    }
    Ok(())
}

/// Reject batches that name a card twice or exceed the storable quantity.
pub(crate) fn validate_batch(desired: &[DesiredQuantity]) -> Result<(), StoreError> {
    let mut seen = HashSet::with_capacity(desired.len());
    for row in desired {
        if !seen.insert(&row.card_id) {
            return Err(StoreError::InvalidInput(format!(
                "card {} appears more than once",
                row.card_id
            )));
        }
        if i32::try_from(row.quantity).is_err() {
            return Err(StoreError::InvalidInput(format!(
                "quantity for card {} is too large",
                row.card_id
            )));
        }
    }
    Ok(())
}

/// Reject self-links and normalize the display name.
///
/// An empty display name falls back to the friend's id.
pub(crate) fn normalize_link(link: &FriendLink) -> Result<FriendLink, StoreError> {
    if link.owner_id == link.friend_id {
        return Err(StoreError::InvalidInput(
            "cannot add yourself as a friend".to_owned(),
        ));
    }

    let trimmed = link.friend_display_name.trim();
    let display_name = if trimmed.is_empty() {
        link.friend_id.to_string()
    } else {
        trimmed.chars().take(MAX_DISPLAY_NAME_LENGTH).collect()
    };

    Ok(FriendLink {
        owner_id: link.owner_id.clone(),
        friend_id: link.friend_id.clone(),
        friend_display_name: display_name,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn owner(id: &str) -> OwnerId {
        OwnerId::parse(id).unwrap()
    }

    fn desired(card: &str, quantity: u32) -> DesiredQuantity {
        DesiredQuantity {
            card_id: CardId::parse(card).unwrap(),
            quantity,
        }
    }

    #[test]
    fn test_validate_delta() {
        assert!(validate_delta(1).is_ok());
        assert!(validate_delta(-3).is_ok());
        assert!(matches!(validate_delta(0), Err(StoreError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_batch_rejects_duplicates() {
        let err = validate_batch(&[desired("A", 1), desired("B", 0), desired("A", 2)]).unwrap_err();
        assert_eq!(err.to_string(), "invalid input: card A appears more than once");
    }

    #[test]
    fn test_validate_batch_rejects_huge_quantity() {
        assert!(validate_batch(&[desired("A", u32::MAX)]).is_err());
        assert!(validate_batch(&[desired("A", 0), desired("B", 7)]).is_ok());
    }

    #[test]
    fn test_normalize_link() {
        let link = FriendLink {
            owner_id: owner("u1"),
            friend_id: owner("u2"),
            friend_display_name: "   ".to_owned(),
        };
        assert_eq!(normalize_link(&link).unwrap().friend_display_name, "u2");

        let self_link = FriendLink {
            friend_id: owner("u1"),
            ..link
        };
        assert!(matches!(
            normalize_link(&self_link),
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_repository_error_mapping() {
        assert!(matches!(
            StoreError::from(RepositoryError::Conflict("dup".to_owned())),
            StoreError::InvalidInput(_)
        ));
        assert!(matches!(
            StoreError::from(RepositoryError::DataCorruption("bad".to_owned())),
            StoreError::Unavailable(_)
        ));
    }
}
