//! Personal deck route handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use card_ledger_core::{CardId, DesiredQuantity, ViewMode};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::CurrentOwner;
use crate::services::ListingQuery;
use crate::services::deck::{self as deck_service, CardQuantity, DeckScreen};
use crate::state::AppState;

/// Body of `POST /api/deck/cards`.
#[derive(Debug, Deserialize)]
pub struct AddCardRequest {
    pub card_id: CardId,
    /// Copies to add; negative removes. Defaults to one.
    #[serde(default = "default_delta")]
    pub delta: i32,
}

const fn default_delta() -> i32 {
    1
}

/// Body of `PUT /api/deck`.
#[derive(Debug, Deserialize)]
pub struct SaveDeckRequest {
    pub items: Vec<DesiredQuantity>,
}

/// The signed-in owner's deck.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    CurrentOwner(owner_id): CurrentOwner,
    Query(query): Query<ListingQuery>,
) -> Json<DeckScreen> {
    Json(deck_service::load(&state, owner_id, ViewMode::Editable, None, &query).await)
}

/// Mark a card owned, or add/remove copies.
#[instrument(skip(state))]
pub async fn add_card(
    State(state): State<AppState>,
    CurrentOwner(owner_id): CurrentOwner,
    Json(request): Json<AddCardRequest>,
) -> Result<Json<CardQuantity>> {
    let result = deck_service::add_card(&state, &owner_id, request.card_id, request.delta).await?;
    Ok(Json(result))
}

/// Save edited quantities and return the refreshed deck.
#[instrument(skip(state, request), fields(rows = request.items.len()))]
pub async fn save(
    State(state): State<AppState>,
    CurrentOwner(owner_id): CurrentOwner,
    Query(query): Query<ListingQuery>,
    Json(request): Json<SaveDeckRequest>,
) -> Result<Json<DeckScreen>> {
    let screen = deck_service::save(
        &state,
        owner_id,
        ViewMode::Editable,
        None,
        &request.items,
        &query,
    )
    .await?;
    Ok(Json(screen))
}
