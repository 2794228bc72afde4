//! Catalog sources.
//!
//! The indexed endpoint answers with `{"data": [[...], [...]]}`, one
//! positional array per card:
//!
//! | offset | field |
//! |--------|-------|
//! | 0 | id |
//! | 1 | normalized id (image key) |
//! | 4 | display name |
//! | 16 | unit price (number, numeric string or `"??"`) |

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use card_ledger_core::{CardDefinition, CardId, UnitPrice};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use super::CatalogError;

const OFFSET_ID: usize = 0;
const OFFSET_NORMALIZED_ID: usize = 1;
const OFFSET_NAME: usize = 4;
const OFFSET_PRICE: usize = 16;

/// Something that can produce the full card catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync + 'static {
    async fn fetch(&self) -> Result<Vec<CardDefinition>, CatalogError>;
}

/// A raw catalog entry that could not be turned into a card.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed catalog entry #{index}: {reason}")]
pub struct MalformedCatalogEntry {
    pub index: usize,
    pub reason: &'static str,
}

#[derive(Deserialize)]
struct IndexedResponse {
    data: Vec<serde_json::Value>,
}

/// Parse an indexed catalog response body.
///
/// Entries without a usable id are skipped with a warning; missing names and
/// prices become placeholders.
///
/// # Errors
///
/// Returns [`CatalogError::Parse`] if the body is not `{"data": [...]}`.
pub fn parse_indexed_catalog(body: &str) -> Result<Vec<CardDefinition>, CatalogError> {
    let response: IndexedResponse = serde_json::from_str(body)?;
    let total = response.data.len();

    let cards: Vec<CardDefinition> = response
        .data
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| match card_from_entry(index, entry) {
            Ok(card) => Some(card),
            Err(e) => {
                warn!(error = %e, "Skipping catalog entry");
                None
            }
        })
        .collect();

    debug!(total, parsed = cards.len(), "Parsed indexed catalog");
    Ok(cards)
}

fn card_from_entry(
    index: usize,
    entry: &serde_json::Value,
) -> Result<CardDefinition, MalformedCatalogEntry> {
    let fields = entry.as_array().ok_or(MalformedCatalogEntry {
        index,
        reason: "entry is not an array",
    })?;

    let id = fields
        .get(OFFSET_ID)
        .and_then(text_field)
        .and_then(|raw| CardId::parse(raw).ok())
        .ok_or(MalformedCatalogEntry {
            index,
            reason: "missing card id",
        })?;

    let normalized_id = fields
        .get(OFFSET_NORMALIZED_ID)
        .and_then(text_field)
        .and_then(|raw| CardId::parse(raw).ok());
    let display_name = fields.get(OFFSET_NAME).and_then(text_field);
    let unit_price = fields
        .get(OFFSET_PRICE)
        .map_or(UnitPrice::Unknown, UnitPrice::from_json);

    Ok(CardDefinition::new(id, normalized_id, display_name, unit_price))
}

/// Strings as-is, numbers stringified, anything else absent.
fn text_field(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// =============================================================================
// HttpCatalogSource
// =============================================================================

/// Fetches the catalog from the indexed HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    client: reqwest::Client,
    url: Url,
}

impl HttpCatalogSource {
    /// Create a source for `url`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Http`] if the HTTP client cannot be built.
    pub fn new(url: Url, timeout: Duration) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<Vec<CardDefinition>, CatalogError> {
        let response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Catalog endpoint returned non-success status"
            );
            return Err(CatalogError::Status(status.as_u16()));
        }

        parse_indexed_catalog(&body).inspect_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse catalog response"
            );
        })
    }
}

// =============================================================================
// StaticCatalogSource
// =============================================================================

/// Serves a fixed catalog; counts fetches and can be switched to fail.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogSource {
    cards: Arc<Vec<CardDefinition>>,
    fetches: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl StaticCatalogSource {
    #[must_use]
    pub fn new(cards: Vec<CardDefinition>) -> Self {
        Self {
            cards: Arc::new(cards),
            ..Self::default()
        }
    }

    /// Number of `fetch` calls so far, including failed ones.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Make subsequent fetches fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl CatalogSource for StaticCatalogSource {
    async fn fetch(&self) -> Result<Vec<CardDefinition>, CatalogError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(CatalogError::Unavailable("static source switched off".to_owned()));
        }
        Ok(self.cards.as_ref().clone())
    }
}
