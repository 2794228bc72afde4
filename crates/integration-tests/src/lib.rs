//! Integration tests for Card Ledger.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process API tests (no external services)
//! cargo test -p card-ledger-integration-tests
//!
//! # Include the PostgreSQL store tests
//! LEDGER_TEST_DATABASE_URL=postgres://localhost/ledger_test \
//!     cargo test -p card-ledger-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `api_*` - The full router driven with `tower::ServiceExt::oneshot`, backed
//!   by the in-memory store, a static catalog and a manual clock
//! - `postgres_store` - [`card_ledger_server::db::PgOwnershipStore`] against a
//!   real database; skipped when `LEDGER_TEST_DATABASE_URL` is unset

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use card_ledger_core::{CardDefinition, CardId, UnitPrice};
use card_ledger_server::catalog::{
    CatalogCache, DEFAULT_MAX_AGE, ManualClock, MemorySnapshotStore, StaticCatalogSource,
};
use card_ledger_server::middleware::OWNER_ID_HEADER;
use card_ledger_server::state::AppState;
use card_ledger_server::store::{MemoryOwnershipStore, OwnershipStore};
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

/// Fixed start time for the manual clock.
pub const START_EPOCH_MS: i64 = 1_767_225_600_000;

/// CDN base used by every test router.
pub const TEST_CDN: &str = "https://cdn.test/card";

/// An in-process server with handles on its fakes.
pub struct TestContext {
    pub router: Router,
    pub store: Arc<MemoryOwnershipStore>,
    pub source: StaticCatalogSource,
    pub clock: Arc<ManualClock>,
}

impl TestContext {
    /// A server over [`sample_catalog`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_catalog(sample_catalog())
    }

    /// A server over the given catalog.
    #[must_use]
    pub fn with_catalog(cards: Vec<CardDefinition>) -> Self {
        let source = StaticCatalogSource::new(cards);
        let clock = Arc::new(ManualClock::new(START_EPOCH_MS));
        let store = Arc::new(MemoryOwnershipStore::new());

        let catalog = CatalogCache::new(
            Arc::new(source.clone()),
            Arc::new(MemorySnapshotStore::new()),
            Arc::clone(&clock) as Arc<dyn card_ledger_server::catalog::Clock>,
            DEFAULT_MAX_AGE,
        );
        let state = AppState::new(
            catalog,
            Arc::clone(&store) as Arc<dyn OwnershipStore>,
            Url::parse(TEST_CDN).expect("test CDN URL is valid"),
        );

        Self {
            router: card_ledger_server::app(state),
            store,
            source,
            clock,
        }
    }

    /// Send a request, optionally as `owner`, and decode the JSON response.
    ///
    /// Empty bodies decode to [`Value::Null`].
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body is not JSON.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        owner: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(owner) = owner {
            builder = builder.header(OWNER_ID_HEADER, owner);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("request builds"))
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, owner: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, owner, None).await
    }

    pub async fn post(&self, uri: &str, owner: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(owner), Some(body)).await
    }

    pub async fn put(&self, uri: &str, owner: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(owner), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, owner: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(owner), None).await
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a catalog card.
///
/// # Panics
///
/// Panics if `id` is blank.
#[must_use]
pub fn card(id: &str, name: &str, price: Option<&str>) -> CardDefinition {
    let unit_price = price
        .and_then(|p| p.parse().ok())
        .map_or(UnitPrice::Unknown, UnitPrice::Known);
    CardDefinition::new(
        CardId::parse(id).expect("card id is valid"),
        None,
        Some(name.to_owned()),
        unit_price,
    )
}

/// A small One Piece catalog.
#[must_use]
pub fn sample_catalog() -> Vec<CardDefinition> {
    vec![
        card("OP01-001", "Roronoa Zoro", Some("4.50")),
        card("OP01-016", "Nami", Some("0.25")),
        card("OP01-024", "Monkey.D.Luffy", Some("12.00")),
        card("OP02-013", "Portgas.D.Ace", None),
        card("ST01-012", "Monkey.D.Luffy", Some("1.10")),
    ]
}

/// Let the catalog expire.
pub fn expire_catalog(ctx: &TestContext) {
    ctx.clock.advance(DEFAULT_MAX_AGE + Duration::from_secs(1));
}
