//! Signed-asset URL endpoint.
//!
//! Exchanges a stored media reference (or an explicit bucket/path pair) for
//! a short-lived signed retrieval URL, behind the same admin check as the
//! rest of the tenant's data.

use std::time::Duration;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ErrorKind};
use crate::middleware::{CorrelationId, RequireAdmin};
use crate::state::AppState;
use crate::storage::{DEFAULT_SIGNED_URL_TTL, resolve};

/// Query parameters: either `url` (a stored reference to resolve) or an
/// explicit `bucket` + `path` pair.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrlQuery {
    pub url: Option<String>,
    pub bucket: Option<String>,
    pub path: Option<String>,
    /// Lifetime in seconds; defaults to 180.
    pub expires_in: Option<u64>,
}

/// Signed URL response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrlResponse {
    pub request_id: String,
    pub signed_url: String,
}

/// Issue a short-lived signed URL for a stored object.
pub async fn signed_url(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    RequireAdmin(_principal): RequireAdmin,
    Query(query): Query<SignedUrlQuery>,
) -> Result<Json<SignedUrlResponse>, ApiError> {
    let expires_in = query
        .expires_in
        .map_or(DEFAULT_SIGNED_URL_TTL, Duration::from_secs);

    let (bucket, path) = match (&query.url, &query.bucket, &query.path) {
        // A stored reference: resolve the known URL shapes. References
        // matching neither shape are returned as-is rather than re-signed.
        (Some(raw), _, _) => match resolve(raw) {
            Some(object) => (object.bucket, object.path),
            None => {
                return Ok(Json(SignedUrlResponse {
                    request_id: correlation_id.to_string(),
                    signed_url: raw.clone(),
                }));
            }
        },
        (None, Some(bucket), Some(path)) if !bucket.is_empty() && !path.is_empty() => {
            (bucket.clone(), path.clone())
        }
        _ => {
            return Err(ApiError::new(
                correlation_id,
                ErrorKind::Validation("either url or bucket+path is required".to_string()),
            ));
        }
    };

    let signed_url = state
        .storage()
        .signed_url(&bucket, &path, expires_in)
        .await
        .map_err(|e| ApiError::new(correlation_id.clone(), e))?;

    Ok(Json(SignedUrlResponse {
        request_id: correlation_id.to_string(),
        signed_url,
    }))
}
