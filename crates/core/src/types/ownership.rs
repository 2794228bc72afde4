//! Ownership records and friend links.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::id::{CardId, OwnerId};

/// How many copies of one card one owner holds.
///
/// There is exactly one logical record per `(owner_id, card_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipRecord {
    pub owner_id: OwnerId,
    pub card_id: CardId,
    pub quantity: u32,
}

impl OwnershipRecord {
    #[must_use]
    pub const fn new(owner_id: OwnerId, card_id: CardId, quantity: u32) -> Self {
        Self {
            owner_id,
            card_id,
            quantity,
        }
    }
}

/// A locally edited quantity to push back to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredQuantity {
    pub card_id: CardId,
    pub quantity: u32,
}

/// A directed friend relation: `owner_id` follows `friend_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendLink {
    pub owner_id: OwnerId,
    pub friend_id: OwnerId,
    pub friend_display_name: String,
}

/// Counts reported by a bulk reconcile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    /// Records whose quantity was overwritten.
    pub updated: usize,
    /// Records deleted because the desired quantity was zero.
    pub deleted: usize,
    /// Desired rows with no stored record; these are not recreated.
    pub missing: usize,
}

/// Collapse duplicate `(owner_id, card_id)` records by summing quantities.
///
/// The first occurrence of each pair keeps its position in the output.
#[must_use]
pub fn merge_duplicates(records: Vec<OwnershipRecord>) -> Vec<OwnershipRecord> {
    let mut positions: HashMap<(OwnerId, CardId), usize> = HashMap::with_capacity(records.len());
    let mut merged: Vec<OwnershipRecord> = Vec::with_capacity(records.len());

    for record in records {
        let key = (record.owner_id.clone(), record.card_id.clone());
        match positions.get(&key).and_then(|&index| merged.get_mut(index)) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(record.quantity);
            }
            None => {
                positions.insert(key, merged.len());
                merged.push(record);
            }
        }
    }

    merged
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record(owner: &str, card: &str, quantity: u32) -> OwnershipRecord {
        OwnershipRecord::new(
            OwnerId::parse(owner).unwrap(),
            CardId::parse(card).unwrap(),
            quantity,
        )
    }

    #[test]
    fn test_merge_duplicates_sums_and_keeps_first_position() {
        let merged = merge_duplicates(vec![
            record("u", "B", 1),
            record("u", "A", 2),
            record("u", "B", 3),
            record("v", "B", 1),
        ]);

        assert_eq!(
            merged,
            vec![record("u", "B", 4), record("u", "A", 2), record("v", "B", 1)]
        );
    }

    #[test]
    fn test_merge_duplicates_saturates() {
        let merged = merge_duplicates(vec![record("u", "A", u32::MAX), record("u", "A", 1)]);
        assert_eq!(merged, vec![record("u", "A", u32::MAX)]);
    }
}
