//! Catalog browser.

use card_ledger_core::{CardDefinition, CardId, Page, UnitPrice, filter_catalog, paginate};
use serde::Serialize;
use tracing::instrument;

use super::ListingQuery;
use crate::error::Result;
use crate::state::AppState;

/// One card in the catalog browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRow {
    pub card_id: CardId,
    pub name: String,
    pub unit_price: UnitPrice,
    pub image_url: String,
}

impl CatalogRow {
    fn new(state: &AppState, card: &CardDefinition) -> Self {
        Self {
            card_id: card.id.clone(),
            name: card.display_name.clone(),
            unit_price: card.unit_price,
            image_url: state.image_url(&card.normalized_id),
        }
    }
}

/// Search and page through the catalog, in catalog order.
///
/// # Errors
///
/// Returns `AppError::Catalog` if no fresh catalog is available and the
/// refetch fails.
#[instrument(skip(state, query), fields(search = query.search()))]
pub async fn browse(state: &AppState, query: &ListingQuery) -> Result<Page<CatalogRow>> {
    let snapshot = state.catalog().get_catalog().await?;

    let matches: Vec<CatalogRow> = filter_catalog(&snapshot.cards, query.search())
        .into_iter()
        .map(|card| CatalogRow::new(state, card))
        .collect();

    Ok(paginate(matches, query.page(), query.per_page()))
}
