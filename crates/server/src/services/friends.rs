//! Friends directory.

use card_ledger_core::{DesiredQuantity, FriendLink, OwnerId, ViewMode};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::ListingQuery;
use super::deck::{self, DeckScreen};
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store::StoreError;

/// One entry of the friends directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FriendRow {
    pub friend_id: OwnerId,
    pub display_name: String,
}

impl From<FriendLink> for FriendRow {
    fn from(link: FriendLink) -> Self {
        Self {
            friend_id: link.friend_id,
            display_name: link.friend_display_name,
        }
    }
}

/// Friends of `owner_id`.
///
/// # Errors
///
/// Returns `AppError::Store` if the store fails.
#[instrument(skip(state), fields(owner_id = %owner_id))]
pub async fn list(state: &AppState, owner_id: &OwnerId) -> Result<Vec<FriendRow>> {
    let links = state.store().list_friend_links(owner_id).await?;
    Ok(links.into_iter().map(FriendRow::from).collect())
}

/// Add (or rename) a friend.
///
/// # Errors
///
/// Returns `AppError::Store` for a self-link or a store failure.
#[instrument(skip(state, display_name), fields(owner_id = %owner_id, friend_id = %friend_id))]
pub async fn add(
    state: &AppState,
    owner_id: OwnerId,
    friend_id: OwnerId,
    display_name: String,
) -> Result<FriendRow> {
    let link = FriendLink {
        owner_id,
        friend_id,
        friend_display_name: display_name,
    };
    state.store().add_friend_link(&link).await?;

    // The store may have normalized the display name
    let saved = state
        .store()
        .list_friend_links(&link.owner_id)
        .await?
        .into_iter()
        .find(|l| l.friend_id == link.friend_id)
        .map_or_else(|| FriendRow::from(link), FriendRow::from);

    info!("Friend added");
    Ok(saved)
}

/// Remove a friend.
///
/// # Errors
///
/// Returns `AppError::NotFound` if no such friend exists.
#[instrument(skip(state), fields(owner_id = %owner_id, friend_id = %friend_id))]
pub async fn remove(state: &AppState, owner_id: &OwnerId, friend_id: &OwnerId) -> Result<()> {
    if !state.store().remove_friend_link(owner_id, friend_id).await? {
        return Err(AppError::NotFound(format!("friend {friend_id}")));
    }
    info!("Friend removed");
    Ok(())
}

/// Render a friend's deck, read-only.
///
/// Only friends in the owner's directory can be viewed. If the directory
/// cannot be read the screen degrades to an empty loading state.
///
/// # Errors
///
/// Returns `AppError::NotFound` if `friend_id` is not a friend of `owner_id`.
#[instrument(skip(state, query), fields(owner_id = %owner_id, friend_id = %friend_id))]
pub async fn view_deck(
    state: &AppState,
    owner_id: &OwnerId,
    friend_id: OwnerId,
    query: &ListingQuery,
) -> Result<DeckScreen> {
    let link = match find_link(state, owner_id, &friend_id).await {
        Ok(link) => link,
        Err(AppError::Store(StoreError::Unavailable(e))) => {
            warn!(error = %e, "Failed to check friend link");
            return Ok(deck::unavailable(state, friend_id, ViewMode::ReadOnly, query).await);
        }
        Err(e) => return Err(e),
    };

    Ok(deck::load(
        state,
        link.friend_id,
        ViewMode::ReadOnly,
        Some(link.friend_display_name),
        query,
    )
    .await)
}

/// Attempt to save edits to a friend's deck.
///
/// Friend decks are read-only, so this always fails once the link is found.
///
/// # Errors
///
/// - `AppError::NotFound` if `friend_id` is not a friend of `owner_id`
/// - `AppError::View` for the read-only deck
/// - `AppError::Store` if the friend list cannot be read
#[instrument(skip(state, desired, query), fields(owner_id = %owner_id, friend_id = %friend_id))]
pub async fn save_deck(
    state: &AppState,
    owner_id: &OwnerId,
    friend_id: OwnerId,
    desired: &[DesiredQuantity],
    query: &ListingQuery,
) -> Result<DeckScreen> {
    let link = find_link(state, owner_id, &friend_id).await?;

    deck::save(
        state,
        link.friend_id,
        ViewMode::ReadOnly,
        Some(link.friend_display_name),
        desired,
        query,
    )
    .await
}

async fn find_link(
    state: &AppState,
    owner_id: &OwnerId,
    friend_id: &OwnerId,
) -> Result<FriendLink> {
    state
        .store()
        .list_friend_links(owner_id)
        .await?
        .into_iter()
        .find(|link| &link.friend_id == friend_id)
        .ok_or_else(|| AppError::NotFound(format!("friend {friend_id}")))
}
