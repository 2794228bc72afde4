//! Deck screens.
//!
//! The personal deck and a friend's deck are the same screen: a [`DeckView`]
//! loaded from the store, joined with the catalog and paged. Only the mode
//! differs.
//!
//! Reads degrade instead of failing: a store outage leaves the view in
//! [`LoadStatus::Loading`] with an error notification, and a catalog outage
//! shows placeholder names.

use std::sync::Arc;

use card_ledger_core::{
    CardId, DeckTotals, DeckView, DesiredQuantity, LoadStatus, MergedOwnedCard, Notification,
    OwnerId, Page, ReconcileOutcome, UnitPrice, ViewError, ViewMode, paginate,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::ListingQuery;
use crate::catalog::CachedCatalogSnapshot;
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store::validate_batch;

const LOAD_FAILED_MESSAGE: &str = "Could not load cards. Please try again.";
const CATALOG_FAILED_MESSAGE: &str = "Card details are unavailable right now.";

/// One owned card as displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeckRow {
    pub card_id: CardId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: UnitPrice,
    pub image_url: String,
}

/// A rendered deck screen.
#[derive(Debug, Clone, Serialize)]
pub struct DeckScreen {
    pub owner_id: OwnerId,
    /// Set on friend decks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub mode: ViewMode,
    pub status: LoadStatus,
    pub cards: Page<DeckRow>,
    /// Totals over every card matching the search, not just this page.
    pub totals: DeckTotals,
    pub notifications: Vec<Notification>,
}

/// Result of a mark-owned or `+`/`-` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardQuantity {
    pub card_id: CardId,
    /// `0` means the card is no longer owned.
    pub quantity: u32,
}

/// Render the deck of `owner_id`.
#[instrument(skip(state, query), fields(owner_id = %owner_id, mode = ?mode))]
pub async fn load(
    state: &AppState,
    owner_id: OwnerId,
    mode: ViewMode,
    display_name: Option<String>,
    query: &ListingQuery,
) -> DeckScreen {
    let mut view = DeckView::new(owner_id, mode);
    reload(state, &mut view).await;
    render(state, &mut view, display_name, query).await
}

/// Add `delta` copies of a card to the owner's deck (negative removes).
///
/// Positive deltas must name a card in the catalog. When the catalog is
/// unavailable the check is skipped.
///
/// # Errors
///
/// - `AppError::NotFound` for a card id not in the catalog
/// - `AppError::Store` if the store rejects or fails the write
#[instrument(skip(state), fields(owner_id = %owner_id, card_id = %card_id))]
pub async fn add_card(
    state: &AppState,
    owner_id: &OwnerId,
    card_id: CardId,
    delta: i32,
) -> Result<CardQuantity> {
    if delta > 0 {
        match state.catalog().get_catalog().await {
            Ok(snapshot) if !snapshot.cards.iter().any(|card| card.id == card_id) => {
                return Err(AppError::NotFound(format!("card {card_id}")));
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Catalog unavailable, skipping card check"),
        }
    }

    let quantity = state
        .store()
        .add_or_increment(owner_id, &card_id, delta)
        .await?;

    info!(quantity, delta, "Card quantity changed");
    Ok(CardQuantity { card_id, quantity })
}

/// Apply edited quantities to the deck of `owner_id` and render the result.
///
/// Each row is applied to a freshly loaded [`DeckView`]; only rows that
/// differ from the stored quantity are pushed. Rows for cards no longer in
/// the deck are skipped and reported.
///
/// # Errors
///
/// - `AppError::View` for a read-only deck
/// - `AppError::Store` if the batch is invalid or the store fails; no
///   quantity is changed in that case
#[instrument(skip(state, desired, query), fields(owner_id = %owner_id, rows = desired.len()))]
pub async fn save(
    state: &AppState,
    owner_id: OwnerId,
    mode: ViewMode,
    display_name: Option<String>,
    desired: &[DesiredQuantity],
    query: &ListingQuery,
) -> Result<DeckScreen> {
    let mut view = DeckView::new(owner_id, mode);
    view.ensure_editable()?;
    validate_batch(desired)?;

    let ticket = view.begin_load();
    let records = state.store().list_owned(view.owner_id()).await?;
    view.apply_loaded(ticket, records);

    let mut skipped = 0;
    for row in desired {
        match view.set_quantity(&row.card_id, row.quantity) {
            Ok(()) => {}
            Err(ViewError::UnknownCard(_)) => skipped += 1,
            Err(e) => return Err(e.into()),
        }
    }

    let mut outcome = if view.is_dirty() {
        state
            .store()
            .reconcile(view.owner_id(), &view.desired_quantities())
            .await?
    } else {
        ReconcileOutcome::default()
    };
    outcome.missing += skipped;
    info!(
        updated = outcome.updated,
        deleted = outcome.deleted,
        missing = outcome.missing,
        "Deck reconciled"
    );

    view.mark_reconciled(outcome);
    reload(state, &mut view).await;
    if outcome.missing > 0 {
        view.notify(Notification::info(format!(
            "{} card(s) were no longer in the deck and were skipped",
            outcome.missing
        )));
    }

    Ok(render(state, &mut view, display_name, query).await)
}

/// Render an empty deck for a store outage that happened before the deck
/// itself could be read.
pub(crate) async fn unavailable(
    state: &AppState,
    owner_id: OwnerId,
    mode: ViewMode,
    query: &ListingQuery,
) -> DeckScreen {
    let mut view = DeckView::new(owner_id, mode);
    let ticket = view.begin_load();
    view.apply_failed(ticket, LOAD_FAILED_MESSAGE);
    render(state, &mut view, None, query).await
}

/// Load the stored records into `view`. A failure keeps the previous records
/// and adds an error notification.
async fn reload(state: &AppState, view: &mut DeckView) {
    let ticket = view.begin_load();

    match state.store().list_owned(view.owner_id()).await {
        Ok(records) => {
            view.apply_loaded(ticket, records);
        }
        Err(e) => {
            warn!(error = %e, "Failed to load deck");
            view.apply_failed(ticket, LOAD_FAILED_MESSAGE);
        }
    }
}

async fn render(
    state: &AppState,
    view: &mut DeckView,
    display_name: Option<String>,
    query: &ListingQuery,
) -> DeckScreen {
    let snapshot: Option<Arc<CachedCatalogSnapshot>> = if view.records().is_empty() {
        None
    } else {
        match state.catalog().get_catalog().await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(error = %e, "Catalog unavailable, showing placeholder names");
                view.notify(Notification::error(CATALOG_FAILED_MESSAGE));
                None
            }
        }
    };
    let catalog = snapshot.as_deref().map_or(&[][..], |s| s.cards.as_slice());

    let rows = view.rows(catalog, query.search(), query.sort, query.direction());
    let totals = DeckTotals::from_rows(&rows);
    let rows: Vec<DeckRow> = rows
        .into_iter()
        .map(|row| to_deck_row(state, row))
        .collect();

    DeckScreen {
        owner_id: view.owner_id().clone(),
        display_name,
        mode: view.mode(),
        status: view.status(),
        cards: paginate(rows, query.page(), query.per_page()),
        totals,
        notifications: view.take_notifications(),
    }
}

fn to_deck_row(state: &AppState, row: MergedOwnedCard) -> DeckRow {
    DeckRow {
        image_url: state.image_url(&row.image_key),
        card_id: row.card_id,
        name: row.name,
        quantity: row.quantity,
        unit_price: row.unit_price,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::time::Duration;

    use card_ledger_core::{CardDefinition, NotificationLevel, PLACEHOLDER_NAME};
    use rust_decimal::Decimal;
    use url::Url;

    use super::*;
    use crate::catalog::{CatalogCache, ManualClock, MemorySnapshotStore, StaticCatalogSource};
    use crate::store::{MemoryOwnershipStore, OwnershipStore};

    struct Fixture {
        state: AppState,
        store: Arc<MemoryOwnershipStore>,
        source: StaticCatalogSource,
    }

    fn fixture() -> Fixture {
        let source = StaticCatalogSource::new(vec![
            CardDefinition::new(
                CardId::parse("OP01-001").unwrap(),
                None,
                Some("Roronoa Zoro".to_owned()),
                UnitPrice::Known(Decimal::new(300, 2)),
            ),
            CardDefinition::new(
                CardId::parse("OP01-002").unwrap(),
                None,
                Some("Nami".to_owned()),
                UnitPrice::Unknown,
            ),
        ]);
        let catalog = CatalogCache::new(
            Arc::new(source.clone()),
            Arc::new(MemorySnapshotStore::new()),
            Arc::new(ManualClock::new(0)),
            Duration::from_secs(3600),
        );
        let store = Arc::new(MemoryOwnershipStore::new());
        let state = AppState::new(
            catalog,
            Arc::clone(&store) as Arc<dyn OwnershipStore>,
            Url::parse("https://cdn.example.com/card").unwrap(),
        );
        Fixture {
            state,
            store,
            source,
        }
    }

    fn owner() -> OwnerId {
        OwnerId::parse("u1").unwrap()
    }

    fn card(id: &str) -> CardId {
        CardId::parse(id).unwrap()
    }

    #[tokio::test]
    async fn test_add_card_then_load() {
        let fx = fixture();
        add_card(&fx.state, &owner(), card("OP01-001"), 2).await.unwrap();
        let result = add_card(&fx.state, &owner(), card("OP01-001"), 1).await.unwrap();
        assert_eq!(result.quantity, 3);

        let screen = load(
            &fx.state,
            owner(),
            ViewMode::Editable,
            None,
            &ListingQuery::default(),
        )
        .await;
        assert_eq!(screen.status, LoadStatus::Ready);
        assert_eq!(screen.cards.items.len(), 1);
        assert_eq!(screen.cards.items[0].name, "Roronoa Zoro");
        assert_eq!(
            screen.cards.items[0].image_url,
            "https://cdn.example.com/card/OP01-001.webp"
        );
        assert_eq!(screen.totals.known_value, Decimal::new(900, 2));
        assert!(screen.notifications.is_empty());
    }

    #[tokio::test]
    async fn test_add_unknown_card_rejected() {
        let fx = fixture();
        let err = add_card(&fx.state, &owner(), card("NOPE-1"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_add_card_allowed_while_catalog_down() {
        let fx = fixture();
        fx.source.set_failing(true);
        let result = add_card(&fx.state, &owner(), card("NEW-1"), 1).await.unwrap();
        assert_eq!(result.quantity, 1);
    }

    #[tokio::test]
    async fn test_store_outage_degrades_to_loading() {
        let fx = fixture();
        fx.store.set_unavailable(true);

        let screen = load(
            &fx.state,
            owner(),
            ViewMode::Editable,
            None,
            &ListingQuery::default(),
        )
        .await;
        assert_eq!(screen.status, LoadStatus::Loading);
        assert!(screen.cards.items.is_empty());
        assert_eq!(screen.notifications[0].level, NotificationLevel::Error);
    }

    #[tokio::test]
    async fn test_catalog_outage_shows_placeholders() {
        let fx = fixture();
        fx.store
            .add_or_increment(&owner(), &card("OP01-002"), 1)
            .await
            .unwrap();
        fx.source.set_failing(true);

        let screen = load(
            &fx.state,
            owner(),
            ViewMode::Editable,
            None,
            &ListingQuery::default(),
        )
        .await;
        assert_eq!(screen.status, LoadStatus::Ready);
        assert_eq!(screen.cards.items[0].name, PLACEHOLDER_NAME);
        assert_eq!(
            screen.notifications,
            vec![Notification::error(CATALOG_FAILED_MESSAGE)]
        );
    }

    #[tokio::test]
    async fn test_save_deletes_zero_and_reports_missing() {
        let fx = fixture();
        add_card(&fx.state, &owner(), card("OP01-001"), 2).await.unwrap();
        add_card(&fx.state, &owner(), card("OP01-002"), 1).await.unwrap();

        let desired = [
            DesiredQuantity {
                card_id: card("OP01-001"),
                quantity: 0,
            },
            DesiredQuantity {
                card_id: card("OP01-002"),
                quantity: 4,
            },
            DesiredQuantity {
                card_id: card("GONE-1"),
                quantity: 1,
            },
        ];
        let screen = save(
            &fx.state,
            owner(),
            ViewMode::Editable,
            None,
            &desired,
            &ListingQuery::default(),
        )
        .await
        .unwrap();

        assert_eq!(screen.cards.total_items, 1);
        assert_eq!(screen.cards.items[0].quantity, 4);
        let levels: Vec<NotificationLevel> =
            screen.notifications.iter().map(|n| n.level).collect();
        assert_eq!(
            levels,
            vec![NotificationLevel::Success, NotificationLevel::Info]
        );
    }

    #[tokio::test]
    async fn test_save_fails_when_store_down() {
        let fx = fixture();
        fx.store.set_unavailable(true);
        let result = save(
            &fx.state,
            owner(),
            ViewMode::Editable,
            None,
            &[],
            &ListingQuery::default(),
        )
        .await;
        assert!(matches!(result, Err(AppError::Store(_))));
    }

    #[tokio::test]
    async fn test_save_unchanged_rows_skips_store_write() {
        let fx = fixture();
        add_card(&fx.state, &owner(), card("OP01-001"), 2).await.unwrap();

        let desired = [DesiredQuantity {
            card_id: card("OP01-001"),
            quantity: 2,
        }];
        let screen = save(
            &fx.state,
            owner(),
            ViewMode::Editable,
            None,
            &desired,
            &ListingQuery::default(),
        )
        .await
        .unwrap();

        assert_eq!(screen.cards.items[0].quantity, 2);
        assert_eq!(
            screen.notifications,
            vec![Notification::success("Deck updated: 0 changed, 0 removed")]
        );
    }

    #[tokio::test]
    async fn test_save_read_only_deck_rejected() {
        let fx = fixture();
        add_card(&fx.state, &owner(), card("OP01-001"), 2).await.unwrap();

        let desired = [DesiredQuantity {
            card_id: card("OP01-001"),
            quantity: 0,
        }];
        let err = save(
            &fx.state,
            owner(),
            ViewMode::ReadOnly,
            None,
            &desired,
            &ListingQuery::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::View(ViewError::ReadOnly)));

        let records = fx.store.list_owned(&owner()).await.unwrap();
        assert_eq!(records[0].quantity, 2);
    }
}
