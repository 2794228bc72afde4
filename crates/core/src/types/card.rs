//! Catalog card definitions.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::id::CardId;

/// Display name used when the catalog has no name for a card, or when an
/// owned card is missing from the catalog entirely.
pub const PLACEHOLDER_NAME: &str = "Name unavailable";

/// Marker the catalog uses (and we serialize) for an unknown price.
pub const UNKNOWN_PRICE_MARKER: &str = "??";

/// Unit price of a card, when the catalog knows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnitPrice {
    /// Price in the catalog's currency.
    Known(Decimal),
    /// The catalog carried no usable price.
    #[default]
    Unknown,
}

impl UnitPrice {
    /// Interpret a raw catalog price value.
    ///
    /// Accepts JSON numbers and numeric strings (including scientific
    /// notation). Negative amounts and anything else, including the `"??"`
    /// marker, are unknown.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => parse_decimal(&n.to_string()),
            serde_json::Value::String(s) => parse_decimal(s.trim()),
            _ => Self::Unknown,
        }
    }

    /// The known amount, if any.
    #[must_use]
    pub const fn amount(&self) -> Option<Decimal> {
        match self {
            Self::Known(amount) => Some(*amount),
            Self::Unknown => None,
        }
    }

    /// Returns `true` if the price is known.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

fn parse_decimal(raw: &str) -> UnitPrice {
    if raw.is_empty() || raw == UNKNOWN_PRICE_MARKER {
        return UnitPrice::Unknown;
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
        .filter(|amount| *amount >= Decimal::ZERO)
        .map_or(UnitPrice::Unknown, UnitPrice::Known)
}

impl fmt::Display for UnitPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(amount) => write!(f, "{:.2}", amount.round_dp(2)),
            Self::Unknown => f.write_str(UNKNOWN_PRICE_MARKER),
        }
    }
}

impl Serialize for UnitPrice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Known(amount) => Serialize::serialize(amount, serializer),
            Self::Unknown => serializer.serialize_str(UNKNOWN_PRICE_MARKER),
        }
    }
}

impl<'de> Deserialize<'de> for UnitPrice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Self::from_json(&value))
    }
}

/// A card from the global catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDefinition {
    /// Catalog id, the join key for ownership records.
    pub id: CardId,
    /// Normalized id used for image lookups on the card CDN.
    pub normalized_id: CardId,
    /// Display name, or [`PLACEHOLDER_NAME`].
    pub display_name: String,
    /// Unit price.
    pub unit_price: UnitPrice,
}

impl CardDefinition {
    /// Create a definition, substituting placeholders for missing fields.
    #[must_use]
    pub fn new(
        id: CardId,
        normalized_id: Option<CardId>,
        display_name: Option<String>,
        unit_price: UnitPrice,
    ) -> Self {
        let display_name = display_name
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| PLACEHOLDER_NAME.to_owned());

        Self {
            normalized_id: normalized_id.unwrap_or_else(|| id.clone()),
            id,
            display_name,
            unit_price,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_price_from_number_and_string() {
        assert_eq!(
            UnitPrice::from_json(&json!(1.25)),
            UnitPrice::Known(Decimal::new(125, 2))
        );
        assert_eq!(
            UnitPrice::from_json(&json!("0.30")),
            UnitPrice::Known(Decimal::new(30, 2))
        );
        assert_eq!(
            UnitPrice::from_json(&json!("1e2")),
            UnitPrice::Known(Decimal::new(100, 0))
        );
    }

    #[test]
    fn test_price_unknown_inputs() {
        assert_eq!(UnitPrice::from_json(&json!("??")), UnitPrice::Unknown);
        assert_eq!(UnitPrice::from_json(&json!("")), UnitPrice::Unknown);
        assert_eq!(UnitPrice::from_json(&json!(null)), UnitPrice::Unknown);
        assert_eq!(UnitPrice::from_json(&json!("n/a")), UnitPrice::Unknown);
        assert_eq!(UnitPrice::from_json(&json!([1])), UnitPrice::Unknown);
    }

    #[test]
    fn test_price_negative_is_unknown() {
        assert_eq!(UnitPrice::from_json(&json!(-1)), UnitPrice::Unknown);
        assert_eq!(UnitPrice::from_json(&json!("-0.50")), UnitPrice::Unknown);
        assert_eq!(
            UnitPrice::from_json(&json!("0")),
            UnitPrice::Known(Decimal::ZERO)
        );
    }

    #[test]
    fn test_price_serde() {
        let known = UnitPrice::Known(Decimal::new(199, 2));
        let encoded = serde_json::to_string(&known).unwrap();
        assert_eq!(encoded, "\"1.99\"");
        assert_eq!(serde_json::from_str::<UnitPrice>(&encoded).unwrap(), known);

        let unknown = serde_json::to_string(&UnitPrice::Unknown).unwrap();
        assert_eq!(unknown, "\"??\"");
        assert_eq!(
            serde_json::from_str::<UnitPrice>(&unknown).unwrap(),
            UnitPrice::Unknown
        );
    }

    #[test]
    fn test_price_display() {
        assert_eq!(UnitPrice::Known(Decimal::new(5, 0)).to_string(), "5.00");
        assert_eq!(UnitPrice::Unknown.to_string(), "??");
    }

    #[test]
    fn test_definition_placeholders() {
        let id = CardId::parse("OP01-001").unwrap();
        let card = CardDefinition::new(id.clone(), None, Some("  ".to_owned()), UnitPrice::Unknown);
        assert_eq!(card.display_name, PLACEHOLDER_NAME);
        assert_eq!(card.normalized_id, id);
    }
}
