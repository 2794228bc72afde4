//! Join, filter, sort and paginate owned cards for display.
//!
//! Every deck screen goes through [`merge_and_filter`]: ownership records are
//! joined with the catalog by card id, filtered by a search term and sorted.
//! Records whose card is missing from the catalog are kept with
//! [`PLACEHOLDER_NAME`] rather than dropped.

use std::cmp::Ordering;
use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CardDefinition, CardId, OwnershipRecord, PLACEHOLDER_NAME, UnitPrice};

/// Default number of cards per page in the catalog browser and decks.
pub const DEFAULT_PAGE_SIZE: usize = 36;

/// An ownership record joined with its catalog definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedOwnedCard {
    pub card_id: CardId,
    /// Catalog display name, or [`PLACEHOLDER_NAME`] when the card is unknown.
    pub name: String,
    pub quantity: u32,
    pub unit_price: UnitPrice,
    /// Key for the card image on the CDN.
    pub image_key: CardId,
}

/// Field to sort owned cards by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Id,
    Name,
    Quantity,
    Price,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    const fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// Join `records` with `catalog`, keep rows matching `search`, then sort.
///
/// - The search is a case-insensitive substring match against the name or the
///   card id; an empty (or whitespace) term matches everything.
/// - With `sort_key == None` the input order is preserved.
/// - The sort is stable: rows with equal keys keep their relative input order.
#[must_use]
pub fn merge_and_filter(
    records: &[OwnershipRecord],
    catalog: &[CardDefinition],
    search: &str,
    sort_key: Option<SortKey>,
    direction: SortDirection,
) -> Vec<MergedOwnedCard> {
    let index = catalog_index(catalog);
    let needle = search.trim().to_lowercase();

    let mut rows: Vec<MergedOwnedCard> = records
        .iter()
        .map(|record| merge_one(record, index.get(record.card_id.as_str()).copied()))
        .filter(|row| matches_search(&needle, &row.name, &row.card_id))
        .collect();

    if let Some(key) = sort_key {
        rows.sort_by(|a, b| direction.apply(compare_rows(key, a, b)));
    }

    rows
}

/// Catalog browser filter: same predicate as [`merge_and_filter`], over
/// definitions, preserving catalog order.
#[must_use]
pub fn filter_catalog<'a>(catalog: &'a [CardDefinition], search: &str) -> Vec<&'a CardDefinition> {
    let needle = search.trim().to_lowercase();
    catalog
        .iter()
        .filter(|card| matches_search(&needle, &card.display_name, &card.id))
        .collect()
}

fn catalog_index(catalog: &[CardDefinition]) -> HashMap<&str, &CardDefinition> {
    let mut index = HashMap::with_capacity(catalog.len());
    for card in catalog {
        index.entry(card.id.as_str()).or_insert(card);
    }
    index
}

fn merge_one(record: &OwnershipRecord, card: Option<&CardDefinition>) -> MergedOwnedCard {
    match card {
        Some(card) => MergedOwnedCard {
            card_id: record.card_id.clone(),
            name: card.display_name.clone(),
            quantity: record.quantity,
            unit_price: card.unit_price,
            image_key: card.normalized_id.clone(),
        },
        None => MergedOwnedCard {
            card_id: record.card_id.clone(),
            name: PLACEHOLDER_NAME.to_owned(),
            quantity: record.quantity,
            unit_price: UnitPrice::Unknown,
            image_key: record.card_id.clone(),
        },
    }
}

fn matches_search(needle: &str, name: &str, card_id: &CardId) -> bool {
    needle.is_empty()
        || name.to_lowercase().contains(needle)
        || card_id.as_str().to_lowercase().contains(needle)
}

fn compare_rows(key: SortKey, a: &MergedOwnedCard, b: &MergedOwnedCard) -> Ordering {
    match key {
        SortKey::Id => locale_compare(a.card_id.as_str(), b.card_id.as_str()),
        SortKey::Name => locale_compare(&a.name, &b.name),
        SortKey::Quantity => a.quantity.cmp(&b.quantity),
        SortKey::Price => compare_prices(a.unit_price, b.unit_price),
    }
}

/// Known prices ascending, unknown prices after all known ones.
fn compare_prices(a: UnitPrice, b: UnitPrice) -> Ordering {
    match (a, b) {
        (UnitPrice::Known(x), UnitPrice::Known(y)) => x.cmp(&y),
        (UnitPrice::Known(_), UnitPrice::Unknown) => Ordering::Less,
        (UnitPrice::Unknown, UnitPrice::Known(_)) => Ordering::Greater,
        (UnitPrice::Unknown, UnitPrice::Unknown) => Ordering::Equal,
    }
}

/// Locale-style comparison: accents and case are ignored at the primary
/// level, the raw strings only break ties.
fn locale_compare(left: &str, right: &str) -> Ordering {
    collation_key(left)
        .cmp(&collation_key(right))
        .then_with(|| left.cmp(right))
}

fn collation_key(s: &str) -> String {
    s.chars().map(strip_diacritic).flat_map(char::to_lowercase).collect()
}

/// Map common Latin-1 accented letters to their base letter.
const fn strip_diacritic(ch: char) -> char {
    match ch {
        'À'..='Å' => 'A',
        'à'..='å' => 'a',
        'Ç' => 'C',
        'ç' => 'c',
        'È'..='Ë' => 'E',
        'è'..='ë' => 'e',
        'Ì'..='Ï' => 'I',
        'ì'..='ï' => 'i',
        'Ñ' => 'N',
        'ñ' => 'n',
        'Ò'..='Ö' | 'Ø' => 'O',
        'ò'..='ö' | 'ø' => 'o',
        'Ù'..='Ü' => 'U',
        'ù'..='ü' => 'u',
        'Ý' => 'Y',
        'ý' | 'ÿ' => 'y',
        _ => ch,
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually returned.
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Slice `items` into 1-based pages.
///
/// Page `0` is treated as page `1`, pages past the end clamp to the last page,
/// and a `per_page` of `0` falls back to [`DEFAULT_PAGE_SIZE`].
#[must_use]
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
    let per_page = if per_page == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        per_page
    };
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page);
    let page = page.clamp(1, total_pages.max(1));

    let items = items
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    Page {
        items,
        page,
        per_page,
        total_items,
        total_pages,
    }
}

/// Summary figures for a deck.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeckTotals {
    pub distinct_cards: usize,
    pub total_copies: u64,
    /// Sum of `quantity * price` over cards with a known price.
    pub known_value: Decimal,
    /// Copies whose price is unknown, or whose value does not fit in the sum.
    pub unpriced_copies: u64,
}

impl DeckTotals {
    #[must_use]
    pub fn from_rows(rows: &[MergedOwnedCard]) -> Self {
        rows.iter().fold(Self::default(), |mut totals, row| {
            let copies = u64::from(row.quantity);
            totals.distinct_cards += 1;
            totals.total_copies += copies;

            let value = match row.unit_price {
                UnitPrice::Known(price) => price
                    .checked_mul(Decimal::from(row.quantity))
                    .and_then(|value| totals.known_value.checked_add(value)),
                UnitPrice::Unknown => None,
            };
            match value {
                Some(value) => totals.known_value = value,
                None => totals.unpriced_copies += copies,
            }
            totals
        })
    }
}
