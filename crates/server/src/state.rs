//! Application state shared across handlers.

use std::sync::Arc;

use card_ledger_core::CardId;
use sqlx::PgPool;
use url::Url;

use crate::catalog::CatalogCache;
use crate::store::OwnershipStore;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    catalog: CatalogCache,
    store: Arc<dyn OwnershipStore>,
    image_cdn_url: Url,
    pool: Option<PgPool>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(catalog: CatalogCache, store: Arc<dyn OwnershipStore>, image_cdn_url: Url) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                catalog,
                store,
                image_cdn_url,
                pool: None,
            }),
        }
    }

    /// Attach the database pool checked by `/health/ready`.
    #[must_use]
    pub fn with_pool(self, pool: PgPool) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                catalog: self.inner.catalog.clone(),
                store: Arc::clone(&self.inner.store),
                image_cdn_url: self.inner.image_cdn_url.clone(),
                pool: Some(pool),
            }),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogCache {
        &self.inner.catalog
    }

    #[must_use]
    pub fn store(&self) -> &dyn OwnershipStore {
        self.inner.store.as_ref()
    }

    /// Database pool, if the state was built with one.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// CDN URL of a card image: `<cdn base>/<image key>.webp`.
    #[must_use]
    pub fn image_url(&self, image_key: &CardId) -> String {
        format!(
            "{}/{}.webp",
            self.inner.image_cdn_url.as_str().trim_end_matches('/'),
            image_key
        )
    }
}
