//! HTTP route handlers for the ledger server.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                      - Liveness
//! GET    /health/ready                - Readiness (database reachable)
//!
//! # Catalog
//! GET    /api/catalog                 - Catalog browser (?q=&page=&per_page=)
//!
//! # Deck (requires x-owner-id)
//! GET    /api/deck                    - Personal deck (?q=&sort=&dir=&page=&per_page=)
//! PUT    /api/deck                    - Save edited quantities
//! POST   /api/deck/cards              - Mark owned / add or remove copies
//!
//! # Friends (requires x-owner-id)
//! GET    /api/friends                 - Friends directory
//! POST   /api/friends                 - Add or rename a friend
//! DELETE /api/friends/{friend_id}     - Remove a friend
//! GET    /api/friends/{friend_id}/deck - Friend's deck, read-only
//! PUT    /api/friends/{friend_id}/deck - Rejected with 403 (read-only)
//! ```

pub mod catalog;
pub mod deck;
pub mod friends;
pub mod health;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

/// Create the deck routes router.
pub fn deck_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(deck::show).put(deck::save))
        .route("/cards", post(deck::add_card))
}

/// Create the friends routes router.
pub fn friend_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(friends::index).post(friends::create))
        .route("/{friend_id}", delete(friends::destroy))
        .route("/{friend_id}/deck", get(friends::deck).put(friends::save_deck))
}

/// Create all routes for the ledger server.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/api/catalog", get(catalog::index))
        .nest("/api/deck", deck_routes())
        .nest("/api/friends", friend_routes())
}
