//! Owner identity extractor.
//!
//! Sign-in happens in front of this service. The identity proxy forwards the
//! signed-in owner's id in the `x-owner-id` header.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use card_ledger_core::OwnerId;
use serde_json::json;

use crate::error::set_sentry_owner;

/// Header carrying the signed-in owner's id.
pub const OWNER_ID_HEADER: &str = "x-owner-id";

/// Extractor that requires an owner identity.
///
/// ```rust,ignore
/// async fn handler(CurrentOwner(owner_id): CurrentOwner) -> impl IntoResponse {
///     owner_id.to_string()
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentOwner(pub OwnerId);

/// Rejection when the owner header is missing or unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerRejection {
    Missing,
    Invalid,
}

impl IntoResponse for OwnerRejection {
    fn into_response(self) -> Response {
        let message = match self {
            Self::Missing => "Sign in required",
            Self::Invalid => "Invalid owner id",
        };
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
    }
}

impl<S> FromRequestParts<S> for CurrentOwner
where
    S: Send + Sync,
{
    type Rejection = OwnerRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(OWNER_ID_HEADER)
            .ok_or(OwnerRejection::Missing)?
            .to_str()
            .map_err(|_| OwnerRejection::Invalid)?;

        let owner_id = OwnerId::parse(raw).map_err(|e| {
            tracing::debug!(error = %e, "Rejected owner id header");
            match e {
                card_ledger_core::IdError::Empty(_) => OwnerRejection::Missing,
                card_ledger_core::IdError::TooLong(_) => OwnerRejection::Invalid,
            }
        })?;

        tracing::Span::current().record("owner_id", owner_id.as_str());
        set_sentry_owner(&owner_id);

        Ok(Self(owner_id))
    }
}
