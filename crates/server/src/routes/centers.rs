//! Center listing for the approval workflow's center-selection step.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::error::ApiError;
use crate::middleware::{CorrelationId, RequireSuperAdmin};
use crate::models::Center;
use crate::state::AppState;

/// Center listing response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub request_id: String,
    pub centers: Vec<Center>,
}

/// List all centers. Superadmin only; a tenant admin has no business
/// enumerating other tenants.
pub async fn list(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    RequireSuperAdmin(_principal): RequireSuperAdmin,
) -> Result<Json<ListResponse>, ApiError> {
    let centers = state
        .store()
        .list_centers()
        .await
        .map_err(|e| ApiError::new(correlation_id.clone(), e))?;

    Ok(Json(ListResponse {
        request_id: correlation_id.to_string(),
        centers,
    }))
}
