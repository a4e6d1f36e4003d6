//! Correlation id middleware for request tracing.
//!
//! Generates a UUID v4 for each request if not provided by an upstream
//! proxy or load balancer. The id is:
//! - Stored in the request extensions for handlers and guards to echo
//! - Recorded in the current tracing span
//! - Added to the Sentry scope for error correlation
//! - Returned in the response headers
//!
//! Every JSON payload, success or error, carries the id as `requestId` so
//! client-visible failures can be matched against server logs.

use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderValue, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for correlation ids.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// The correlation id assigned to one request.
#[derive(Debug, Clone)]
pub struct CorrelationId(String);

impl CorrelationId {
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(correlation_from_parts(parts))
    }
}

/// Read the correlation id from request parts, generating one if the
/// middleware is not mounted (unit tests hitting a bare router).
#[must_use]
pub fn correlation_from_parts(parts: &Parts) -> CorrelationId {
    parts
        .extensions
        .get::<CorrelationId>()
        .cloned()
        .unwrap_or_else(CorrelationId::generate)
}

/// Middleware that ensures every request has a correlation id.
///
/// If the incoming request has an `x-request-id` header (from a load
/// balancer or another upstream proxy), that value is used. Otherwise, a
/// new UUID v4 is generated.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map_or_else(CorrelationId::generate, CorrelationId::from);

    // Make the id available to handlers and guard rejections
    request.extensions_mut().insert(request_id.clone());

    // Record in current span for structured logging
    Span::current().record("request_id", request_id.as_str());

    // Set in Sentry scope for error correlation
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", request_id.as_str());
    });

    let mut response = next.run(request).await;

    // Add to response headers so clients can reference the request ID
    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
