//! Newtype ids for type-safe entity references.
//!
//! Owner ids come from the external identity provider and card ids from the
//! catalog; both are opaque strings. Use the `define_id!` macro to create
//! wrappers that prevent accidentally passing a card id where an owner id is
//! expected.

use thiserror::Error;

/// Longest id accepted from any source.
pub const MAX_ID_LENGTH: usize = 128;

/// Errors produced when parsing an id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The id was empty or only whitespace.
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// The id exceeded [`MAX_ID_LENGTH`].
    #[error("{0} must be at most {max} characters", max = MAX_ID_LENGTH)]
    TooLong(&'static str),
}

/// Macro to define a type-safe string id wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` as a plain string (validated on the way in)
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `parse()` (trims, rejects empty and oversized input) and `as_str()`
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use card_ledger_core::define_id;
/// define_id!(DeckId, "deck id");
///
/// let deck = DeckId::parse(" main ").unwrap();
/// assert_eq!(deck.as_str(), "main");
/// assert!(DeckId::parse("   ").is_err());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident, $label:literal) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse an id, trimming surrounding whitespace.
            ///
            /// # Errors
            ///
            /// Returns [`IdError`] if the id is empty or too long.
            pub fn parse(value: impl AsRef<str>) -> ::core::result::Result<Self, $crate::IdError> {
                let trimmed = value.as_ref().trim();
                if trimmed.is_empty() {
                    return Err($crate::IdError::Empty($label));
                }
                if trimmed.chars().count() > $crate::MAX_ID_LENGTH {
                    return Err($crate::IdError::TooLong($label));
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Get the underlying string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::convert::TryFrom<String> for $name {
            type Error = $crate::IdError;

            fn try_from(value: String) -> ::core::result::Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let raw = <String as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self::parse(raw)?)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <String as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(OwnerId, "owner id");
define_id!(CardId, "card id");

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_whitespace() {
        let id = CardId::parse("  OP01-001 ").unwrap();
        assert_eq!(id.as_str(), "OP01-001");
        assert_eq!(id.to_string(), "OP01-001");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(OwnerId::parse(""), Err(IdError::Empty("owner id")));
        assert_eq!(OwnerId::parse(" \t"), Err(IdError::Empty("owner id")));
    }

    #[test]
    fn test_parse_rejects_too_long() {
        let long = "x".repeat(MAX_ID_LENGTH + 1);
        assert_eq!(CardId::parse(long), Err(IdError::TooLong("card id")));
    }

    #[test]
    fn test_serde_is_transparent_and_validated() {
        let id: OwnerId = serde_json::from_str("\"user-1\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"user-1\"");
        assert!(serde_json::from_str::<OwnerId>("\"\"").is_err());
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn test_ids_are_text_columns() {
        use sqlx::{Postgres, Type};

        let text = <String as Type<Postgres>>::type_info();
        assert_eq!(<CardId as Type<Postgres>>::type_info(), text);
        assert!(<OwnerId as Type<Postgres>>::compatible(&text));
    }
}
