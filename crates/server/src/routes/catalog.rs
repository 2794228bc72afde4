//! Catalog browser route handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use card_ledger_core::Page;
use tracing::instrument;

use crate::error::Result;
use crate::services::{ListingQuery, catalog::CatalogRow};
use crate::state::AppState;

/// Catalog browser.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<Page<CatalogRow>>> {
    let page = crate::services::catalog::browse(&state, &query).await?;
    Ok(Json(page))
}
