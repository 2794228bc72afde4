//! `x-request-id` propagation.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LENGTH: usize = 128;

/// The upstream request id if it is short and made of token characters,
/// otherwise a fresh UUID v4.
fn resolve_request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|id| {
            !id.is_empty()
                && id.len() <= MAX_REQUEST_ID_LENGTH
                && id
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':'))
        })
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_owned)
}

/// Tag the request span and Sentry scope with a request id and echo it back.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = resolve_request_id(request.headers());

    Span::current().record("request_id", &request_id);
    sentry::configure_scope(|scope| scope.set_tag("request_id", &request_id));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headers(id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(id).unwrap());
        headers
    }

    #[test]
    fn test_upstream_id_is_kept() {
        assert_eq!(resolve_request_id(&headers("cf-7a1b:42")), "cf-7a1b:42");
    }

    #[test]
    fn test_unusable_ids_are_replaced() {
        let long = "a".repeat(MAX_REQUEST_ID_LENGTH + 1);
        for id in ["", "has space", "semi;colon", long.as_str()] {
            let resolved = resolve_request_id(&headers(id));
            assert!(Uuid::parse_str(&resolved).is_ok(), "id {id:?}");
        }
        assert!(Uuid::parse_str(&resolve_request_id(&HeaderMap::new())).is_ok());
    }
}
