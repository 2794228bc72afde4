//! In-memory ownership store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use card_ledger_core::{
    CardId, DesiredQuantity, FriendLink, OwnerId, OwnershipRecord, ReconcileOutcome,
};
use tokio::sync::Mutex;

use super::{OwnershipStore, StoreError, normalize_link, validate_batch, validate_delta};

#[derive(Debug, Default)]
struct MemoryState {
    /// `(owner, card)` -> `(insertion sequence, quantity)`
    ownership: HashMap<(OwnerId, CardId), (u64, u32)>,
    /// `(owner, friend)` -> display name
    friends: HashMap<(OwnerId, OwnerId), String>,
    next_seq: u64,
}

impl MemoryState {
    const fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

/// Ownership store held in process memory.
///
/// Owned cards list in insertion order, friend links by display name.
/// [`MemoryOwnershipStore::set_unavailable`]
/// simulates an outage for every operation.
#[derive(Debug, Default)]
pub struct MemoryOwnershipStore {
    state: Mutex<MemoryState>,
    unavailable: AtomicBool,
}

impl MemoryOwnershipStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with [`StoreError::Unavailable`] (or stop doing so).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store switched off".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl OwnershipStore for MemoryOwnershipStore {
    async fn list_owned(&self, owner_id: &OwnerId) -> Result<Vec<OwnershipRecord>, StoreError> {
        self.check_available()?;
        let state = self.state.lock().await;

        let mut rows: Vec<(u64, OwnershipRecord)> = state
            .ownership
            .iter()
            .filter(|((owner, _), _)| owner == owner_id)
            .map(|((owner, card), &(seq, quantity))| {
                (seq, OwnershipRecord::new(owner.clone(), card.clone(), quantity))
            })
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);

        Ok(rows.into_iter().map(|(_, record)| record).collect())
    }

    async fn add_or_increment(
        &self,
        owner_id: &OwnerId,
        card_id: &CardId,
        delta: i32,
    ) -> Result<u32, StoreError> {
        self.check_available()?;
        validate_delta(delta)?;

        let mut state = self.state.lock().await;
        let key = (owner_id.clone(), card_id.clone());
        let current = state.ownership.get(&key).map_or(0, |&(_, quantity)| quantity);

        let updated = i64::from(current) + i64::from(delta);
        if updated > i64::from(i32::MAX) {
            return Err(StoreError::InvalidInput("quantity overflow".to_owned()));
        }

        if updated <= 0 {
            state.ownership.remove(&key);
            return Ok(0);
        }

        // Bounded by i32::MAX above
        let updated = u32::try_from(updated).unwrap_or(u32::MAX);
        if let Some(entry) = state.ownership.get_mut(&key) {
            entry.1 = updated;
        } else {
            let seq = state.next_seq();
            state.ownership.insert(key, (seq, updated));
        }
        Ok(updated)
    }

    async fn reconcile(
        &self,
        owner_id: &OwnerId,
        desired: &[DesiredQuantity],
    ) -> Result<ReconcileOutcome, StoreError> {
        self.check_available()?;
        validate_batch(desired)?;

        // Validation happens before any write, so the batch applies fully or not at all
        let mut state = self.state.lock().await;
        let mut outcome = ReconcileOutcome::default();

        for row in desired {
            let key = (owner_id.clone(), row.card_id.clone());
            if !state.ownership.contains_key(&key) {
                outcome.missing += 1;
            } else if row.quantity == 0 {
                state.ownership.remove(&key);
                outcome.deleted += 1;
            } else if let Some(entry) = state.ownership.get_mut(&key) {
                entry.1 = row.quantity;
                outcome.updated += 1;
            }
        }

        Ok(outcome)
    }

    async fn add_friend_link(&self, link: &FriendLink) -> Result<(), StoreError> {
        self.check_available()?;
        let link = normalize_link(link)?;

        let mut state = self.state.lock().await;
        state
            .friends
            .insert((link.owner_id, link.friend_id), link.friend_display_name);
        Ok(())
    }

    async fn remove_friend_link(
        &self,
        owner_id: &OwnerId,
        friend_id: &OwnerId,
    ) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        Ok(state
            .friends
            .remove(&(owner_id.clone(), friend_id.clone()))
            .is_some())
    }

    async fn list_friend_links(&self, owner_id: &OwnerId) -> Result<Vec<FriendLink>, StoreError> {
        self.check_available()?;
        let state = self.state.lock().await;

        let mut links: Vec<FriendLink> = state
            .friends
            .iter()
            .filter(|((owner, _), _)| owner == owner_id)
            .map(|((owner, friend), name)| FriendLink {
                owner_id: owner.clone(),
                friend_id: friend.clone(),
                friend_display_name: name.clone(),
            })
            .collect();
        links.sort_by(|a, b| {
            a.friend_display_name
                .cmp(&b.friend_display_name)
                .then_with(|| a.friend_id.cmp(&b.friend_id))
        });

        Ok(links)
    }
}
