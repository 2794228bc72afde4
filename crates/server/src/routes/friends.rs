//! Friends route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use card_ledger_core::OwnerId;
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::CurrentOwner;
use crate::services::ListingQuery;
use crate::routes::deck::SaveDeckRequest;
use crate::services::deck::DeckScreen;
use crate::services::friends::{self as friend_service, FriendRow};
use crate::state::AppState;

/// Body of `POST /api/friends`.
#[derive(Debug, Deserialize)]
pub struct AddFriendRequest {
    pub friend_id: OwnerId,
    #[serde(default)]
    pub display_name: String,
}

fn parse_friend_id(raw: &str) -> Result<OwnerId> {
    OwnerId::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Friends directory.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    CurrentOwner(owner_id): CurrentOwner,
) -> Result<Json<Vec<FriendRow>>> {
    Ok(Json(friend_service::list(&state, &owner_id).await?))
}

/// Add or rename a friend.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    CurrentOwner(owner_id): CurrentOwner,
    Json(request): Json<AddFriendRequest>,
) -> Result<(StatusCode, Json<FriendRow>)> {
    let row =
        friend_service::add(&state, owner_id, request.friend_id, request.display_name).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// Remove a friend.
#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    CurrentOwner(owner_id): CurrentOwner,
    Path(friend_id): Path<String>,
) -> Result<StatusCode> {
    let friend_id = parse_friend_id(&friend_id)?;
    friend_service::remove(&state, &owner_id, &friend_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// A friend's deck, read-only.
#[instrument(skip(state))]
pub async fn deck(
    State(state): State<AppState>,
    CurrentOwner(owner_id): CurrentOwner,
    Path(friend_id): Path<String>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<DeckScreen>> {
    let friend_id = parse_friend_id(&friend_id)?;
    let screen = friend_service::view_deck(&state, &owner_id, friend_id, &query).await?;
    Ok(Json(screen))
}

/// Saving a friend's deck is always rejected: friend decks are read-only.
#[instrument(skip(state, request), fields(rows = request.items.len()))]
pub async fn save_deck(
    State(state): State<AppState>,
    CurrentOwner(owner_id): CurrentOwner,
    Path(friend_id): Path<String>,
    Query(query): Query<ListingQuery>,
    Json(request): Json<SaveDeckRequest>,
) -> Result<Json<DeckScreen>> {
    let friend_id = parse_friend_id(&friend_id)?;
    let screen =
        friend_service::save_deck(&state, &owner_id, friend_id, &request.items, &query).await?;
    Ok(Json(screen))
}
