//! Request ID middleware for request tracing and correlation.
//!
//! Reuses an `x-request-id` set by an upstream proxy when it looks sane,
//! otherwise generates a UUID v4. The id is recorded in the tracing span,
//! tagged on the Sentry scope and echoed in the response headers.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream id we accept.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Upstream id if present and made of printable ASCII, else a fresh UUID.
fn request_id_for(incoming: Option<&HeaderValue>) -> String {
    incoming
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| {
            !id.is_empty()
                && id.len() <= MAX_REQUEST_ID_LEN
                && id.bytes().all(|b| b.is_ascii_graphic())
        })
        .map_or_else(|| Uuid::new_v4().to_string(), String::from)
}

/// Middleware that ensures every request has a unique request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request_id_for(request.headers().get(REQUEST_ID_HEADER));

    Span::current().record("request_id", &request_id);

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

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

    #[test]
    fn test_keeps_upstream_id() {
        let value = HeaderValue::from_static("cf-7f3a9c");
        assert_eq!(request_id_for(Some(&value)), "cf-7f3a9c");
    }

    #[test]
    fn test_generates_uuid_when_missing_or_odd() {
        assert!(Uuid::parse_str(&request_id_for(None)).is_ok());

        let spaced = HeaderValue::from_static("two words");
        assert!(Uuid::parse_str(&request_id_for(Some(&spaced))).is_ok());

        let long = HeaderValue::from_str(&"a".repeat(200)).unwrap();
        assert!(Uuid::parse_str(&request_id_for(Some(&long))).is_ok());
    }
}
