//! Core types for Card Ledger.
//!
//! This module provides type-safe wrappers for the catalog and ownership
//! domain.

pub mod card;
pub mod id;
pub mod ownership;

pub use card::{CardDefinition, PLACEHOLDER_NAME, UNKNOWN_PRICE_MARKER, UnitPrice};
pub use id::*;
pub use ownership::{
    DesiredQuantity, FriendLink, OwnershipRecord, ReconcileOutcome, merge_duplicates,
};
