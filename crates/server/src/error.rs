//! Unified error handling with Sentry integration.
//!
//! All route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before the JSON error body is written.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use card_ledger_core::ViewError;
use serde_json::json;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::store::StoreError;

/// Application-level error type for the ledger server.
#[derive(Debug, Error)]
pub enum AppError {
    /// The card catalog could not be loaded.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// The ownership store rejected or failed the operation.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A deck edit was rejected.
    #[error("{0}")]
    View(#[from] ViewError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Catalog(_) => StatusCode::BAD_GATEWAY,
            Self::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(StoreError::InvalidInput(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::View(ViewError::ReadOnly) => StatusCode::FORBIDDEN,
            Self::View(ViewError::UnknownCard(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    const fn is_server_fault(&self) -> bool {
        matches!(self, Self::Catalog(_) | Self::Store(StoreError::Unavailable(_)))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_fault() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Catalog(_) => "Card catalog is unavailable".to_owned(),
            Self::Store(StoreError::Unavailable(_)) => "Card storage is unavailable".to_owned(),
            Self::Store(StoreError::InvalidInput(msg)) => msg.clone(),
            _ => self.to_string(),
        };

        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the current owner.
pub fn set_sentry_owner(owner_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(owner_id.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use card_ledger_core::CardId;

    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Store(StoreError::Unavailable("down".to_owned())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Store(StoreError::InvalidInput("bad".to_owned())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Catalog(CatalogError::Status(500)).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::View(ViewError::ReadOnly).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::View(ViewError::UnknownCard(CardId::parse("X").unwrap())).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let response = AppError::Store(StoreError::Unavailable(
            "connection refused at 10.0.0.5".to_owned(),
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Card storage is unavailable");
    }

    #[tokio::test]
    async fn test_client_errors_keep_message() {
        let response =
            AppError::Store(StoreError::InvalidInput("delta must not be zero".to_owned()))
                .into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "delta must not be zero");
    }
}
