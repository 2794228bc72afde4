//! Deck view state.
//!
//! A single view model backs the personal deck (editable) and the friend deck
//! (read-only). It owns the transient in-memory copy of the ownership records
//! for one visit, the local edits that have not been pushed yet, and the
//! transient notifications produced along the way.
//!
//! Loads are tagged with a [`LoadTicket`]. Results for a ticket that is no
//! longer current are discarded.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::collection::{MergedOwnedCard, SortDirection, SortKey, merge_and_filter};
use crate::types::{
    CardDefinition, CardId, DesiredQuantity, OwnerId, OwnershipRecord, ReconcileOutcome,
    merge_duplicates,
};

/// Whether the view accepts local edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Editable,
    ReadOnly,
}

/// Load state of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    /// Nothing has been loaded yet.
    Loading,
    /// At least one load succeeded.
    Ready,
}

/// Identifies one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Severity of a transient user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A transient user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Rejected local edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("this deck is read-only")]
    ReadOnly,

    #[error("card {0} is not in this deck")]
    UnknownCard(CardId),
}

/// View model for one deck screen visit.
#[derive(Debug, Clone)]
pub struct DeckView {
    owner_id: OwnerId,
    mode: ViewMode,
    status: LoadStatus,
    generation: u64,
    records: Vec<OwnershipRecord>,
    /// Quantities as last loaded or reconciled.
    baseline: HashMap<CardId, u32>,
    notifications: Vec<Notification>,
}

impl DeckView {
    /// Create an empty view in the [`LoadStatus::Loading`] state.
    #[must_use]
    pub fn new(owner_id: OwnerId, mode: ViewMode) -> Self {
        Self {
            owner_id,
            mode,
            status: LoadStatus::Loading,
            generation: 0,
            records: Vec::new(),
            baseline: HashMap::new(),
            notifications: Vec::new(),
        }
    }

    #[must_use]
    pub const fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    #[must_use]
    pub const fn mode(&self) -> ViewMode {
        self.mode
    }

    #[must_use]
    pub const fn status(&self) -> LoadStatus {
        self.status
    }

    #[must_use]
    pub fn records(&self) -> &[OwnershipRecord] {
        &self.records
    }

    /// Start a load. Any ticket handed out earlier becomes stale.
    pub const fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        LoadTicket(self.generation)
    }

    const fn accepts(&self, ticket: LoadTicket) -> bool {
        ticket.0 == self.generation
    }

    /// Apply a successful load. Returns `false` if the result was discarded.
    ///
    /// Pending local edits are replaced by the loaded quantities.
    pub fn apply_loaded(&mut self, ticket: LoadTicket, records: Vec<OwnershipRecord>) -> bool {
        if !self.accepts(ticket) {
            return false;
        }

        self.records = merge_duplicates(records);
        self.baseline = self
            .records
            .iter()
            .map(|record| (record.card_id.clone(), record.quantity))
            .collect();
        self.status = LoadStatus::Ready;
        true
    }

    /// Record a failed load. Previously loaded data is kept.
    ///
    /// Returns `false` if the result was discarded.
    pub fn apply_failed(&mut self, ticket: LoadTicket, message: impl Into<String>) -> bool {
        if !self.accepts(ticket) {
            return false;
        }
        self.notifications.push(Notification::error(message));
        true
    }

    /// # Errors
    ///
    /// Returns [`ViewError::ReadOnly`] for read-only views.
    pub const fn ensure_editable(&self) -> Result<(), ViewError> {
        match self.mode {
            ViewMode::Editable => Ok(()),
            ViewMode::ReadOnly => Err(ViewError::ReadOnly),
        }
    }

    /// Set the local quantity of a card already in the deck.
    ///
    /// A row set to zero stays in the view so that the next reconcile
    /// deletes it.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::ReadOnly`] for read-only views and
    /// [`ViewError::UnknownCard`] if the card is not in the deck.
    pub fn set_quantity(&mut self, card_id: &CardId, quantity: u32) -> Result<(), ViewError> {
        self.ensure_editable()?;
        let record = self
            .records
            .iter_mut()
            .find(|record| &record.card_id == card_id)
            .ok_or_else(|| ViewError::UnknownCard(card_id.clone()))?;
        record.quantity = quantity;
        Ok(())
    }

    /// Returns `true` if any quantity differs from the last load or reconcile.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.records
            .iter()
            .any(|record| self.baseline.get(&record.card_id) != Some(&record.quantity))
    }

    /// Rows edited since the last load or reconcile, in deck order.
    #[must_use]
    pub fn desired_quantities(&self) -> Vec<DesiredQuantity> {
        self.records
            .iter()
            .filter(|record| self.baseline.get(&record.card_id) != Some(&record.quantity))
            .map(|record| DesiredQuantity {
                card_id: record.card_id.clone(),
                quantity: record.quantity,
            })
            .collect()
    }

    /// Accept a successful reconcile: zero rows are dropped and the current
    /// quantities become the new baseline.
    pub fn mark_reconciled(&mut self, outcome: ReconcileOutcome) {
        self.records.retain(|record| record.quantity > 0);
        self.baseline = self
            .records
            .iter()
            .map(|record| (record.card_id.clone(), record.quantity))
            .collect();
        self.notifications.push(Notification::success(format!(
            "Deck updated: {} changed, {} removed",
            outcome.updated, outcome.deleted
        )));
    }

    /// Push a notification produced outside the view (e.g. a catalog outage).
    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    /// Drain pending notifications.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Rows for display.
    #[must_use]
    pub fn rows(
        &self,
        catalog: &[CardDefinition],
        search: &str,
        sort_key: Option<SortKey>,
        direction: SortDirection,
    ) -> Vec<MergedOwnedCard> {
        merge_and_filter(&self.records, catalog, search, sort_key, direction)
    }
}
