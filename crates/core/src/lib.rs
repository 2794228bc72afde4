//! Card Ledger Core - Shared types and collection logic.
//!
//! This crate provides the types and pure logic used across all Card Ledger
//! components:
//! - `server` - JSON API over the catalog cache and ownership store
//! - `cli` - Command-line tools for migrations and catalog maintenance
//!
//! # Architecture
//!
//! The core crate contains only types, traits and pure functions - no I/O, no
//! database access, no HTTP clients. Everything here can be tested without a
//! runtime.
//!
//! # Modules
//!
//! - [`types`] - Type-safe ids, card definitions, ownership records
//! - [`collection`] - Join, filter, sort and paginate owned cards
//! - [`view`] - Deck view state shared by the personal and friend decks

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod collection;
pub mod types;
pub mod view;

pub use collection::{
    DEFAULT_PAGE_SIZE, DeckTotals, MergedOwnedCard, Page, SortDirection, SortKey, filter_catalog,
    merge_and_filter, paginate,
};
pub use types::*;
pub use view::{
    DeckView, LoadStatus, LoadTicket, Notification, NotificationLevel, ViewError, ViewMode,
};
