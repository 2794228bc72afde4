//! Business logic behind the JSON routes.
//!
//! # Services
//!
//! - `catalog` - Catalog browser (search + pagination over the cached catalog)
//! - `deck` - Personal and friend deck screens, mark-owned, bulk save
//! - `friends` - Friends directory

pub mod catalog;
pub mod deck;
pub mod friends;

use card_ledger_core::{DEFAULT_PAGE_SIZE, SortDirection, SortKey};
use serde::Deserialize;

/// Largest page size a client may ask for.
pub const MAX_PAGE_SIZE: usize = 200;

/// Search, sort and paging parameters shared by the listing screens.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    /// Search term (name or card id, case-insensitive).
    pub q: Option<String>,
    pub sort: Option<SortKey>,
    pub dir: Option<SortDirection>,
    /// 1-based page number.
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

impl ListingQuery {
    #[must_use]
    pub fn search(&self) -> &str {
        self.q.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn direction(&self) -> SortDirection {
        self.dir.unwrap_or_default()
    }

    #[must_use]
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1)
    }

    /// Requested page size, clamped to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn per_page(&self) -> usize {
        self.per_page
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let query = ListingQuery::default();
        assert_eq!(query.search(), "");
        assert_eq!(query.direction(), SortDirection::Asc);
        assert_eq!(query.page(), 1);
        assert_eq!(query.per_page(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_per_page_clamped() {
        let query = ListingQuery {
            per_page: Some(10_000),
            ..ListingQuery::default()
        };
        assert_eq!(query.per_page(), MAX_PAGE_SIZE);

        let query = ListingQuery {
            per_page: Some(0),
            ..ListingQuery::default()
        };
        assert_eq!(query.per_page(), 1);
    }
}
