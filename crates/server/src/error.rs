//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, ApiError>`. The [`ErrorKind`] taxonomy
//! is fixed: guards decide `Unauthenticated`/`Forbidden` centrally, the
//! workflow raises `Validation`/`Conflict`/`NotFound`, and remote-call
//! failures surface as `Upstream` with full detail logged server-side but
//! never returned to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::middleware::CorrelationId;
use crate::storage::StorageError;
use crate::store::StoreError;

/// Application-level error taxonomy.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// No session or an invalid one. All token failure modes collapse here
    /// so a caller cannot distinguish expired from tampered.
    #[error("authentication required")]
    Unauthenticated,

    /// Authenticated but the role does not permit the operation.
    #[error("insufficient permissions")]
    Forbidden,

    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    /// Duplicate username, or an action against an already-decided request.
    #[error("{0}")]
    Conflict(String),

    /// Unknown id, or an id not owned by the caller's tenant.
    #[error("{0}")]
    NotFound(String),

    /// Datastore call failed or timed out.
    #[error("datastore error: {0}")]
    Store(#[from] StoreError),

    /// Object storage call failed or timed out.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorKind {
    /// Stable machine-readable code for the JSON body.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::Validation(_) => "validation_error",
            Self::Conflict(_) => "conflict",
            Self::NotFound(_) => "not_found",
            Self::Store(_) | Self::Storage(_) => "upstream_failure",
            Self::Internal(_) => "internal_error",
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Storage(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A route-level error bound to the request's correlation id.
///
/// Every error payload echoes the id so client-visible failures can be
/// matched against server logs.
#[derive(Debug)]
pub struct ApiError {
    kind: ErrorKind,
    correlation_id: CorrelationId,
}

impl ApiError {
    /// Bind an error to the request's correlation id.
    pub fn new(correlation_id: CorrelationId, kind: impl Into<ErrorKind>) -> Self {
        Self {
            kind: kind.into(),
            correlation_id,
        }
    }

    /// The underlying taxonomy entry.
    #[must_use]
    pub const fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Capture server-side failures to Sentry; client errors are expected
        // traffic and stay out of the error tracker.
        if matches!(
            self.kind,
            ErrorKind::Store(_) | ErrorKind::Storage(_) | ErrorKind::Internal(_)
        ) {
            let event_id = sentry::capture_error(&self.kind);
            tracing::error!(
                error = %self.kind,
                request_id = %self.correlation_id,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.kind.status();

        // Don't expose internal error details to clients
        let message = match &self.kind {
            ErrorKind::Store(_) | ErrorKind::Storage(_) => "Upstream service error".to_string(),
            ErrorKind::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = json!({
            "error": self.kind.code(),
            "message": message,
            "requestId": self.correlation_id.as_str(),
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(kind: ErrorKind) -> ApiError {
        ApiError::new(CorrelationId::from("test-request-id"), kind)
    }

    #[test]
    fn test_error_kind_display() {
        let err = ErrorKind::NotFound("receipt not found".to_string());
        assert_eq!(err.to_string(), "receipt not found");

        let err = ErrorKind::Validation("centerName is required".to_string());
        assert_eq!(err.to_string(), "centerName is required");
    }

    #[test]
    fn test_status_codes() {
        fn get_status(kind: ErrorKind) -> StatusCode {
            api_error(kind).into_response().status()
        }

        assert_eq!(get_status(ErrorKind::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(get_status(ErrorKind::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            get_status(ErrorKind::Validation("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ErrorKind::Conflict("x".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(ErrorKind::NotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(ErrorKind::Internal("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_errors_map_to_bad_gateway() {
        let kind = ErrorKind::Store(StoreError::Timeout);
        assert_eq!(api_error(kind).into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ErrorKind::Unauthenticated.code(), "unauthenticated");
        assert_eq!(ErrorKind::Store(StoreError::Timeout).code(), "upstream_failure");
    }
}
