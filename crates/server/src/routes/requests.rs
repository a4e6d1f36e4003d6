//! Account request route handlers.
//!
//! Submission is public self-service; listing and the decision endpoint are
//! superadmin-gated.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use centerdesk_core::{CenterId, RequestId, RequestStatus};

use crate::error::{ApiError, ErrorKind};
use crate::middleware::{CorrelationId, RequireSuperAdmin};
use crate::models::{AdminRequestView, PublicAdminUser};
use crate::state::AppState;
use crate::workflow::{DecisionAction, RequestWorkflow};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Submission body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitBody {
    pub center_name: String,
    pub username: String,
    pub password: String,
}

/// Submission response: the created pending request, without the hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub request_id: String,
    pub request: AdminRequestView,
}

/// Status filter for the listing endpoint.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<RequestStatus>,
}

/// Listing response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub request_id: String,
    pub requests: Vec<AdminRequestView>,
}

/// Decision body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecideBody {
    pub action: DecisionAction,
    pub center_id: Option<CenterId>,
}

/// Decision response: the finalized request, plus the created credential's
/// public fields on approval.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecideResponse {
    pub request_id: String,
    pub request: AdminRequestView,
    pub created_user: Option<PublicAdminUser>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Submit a new account request.
pub async fn submit(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    Json(body): Json<SubmitBody>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let workflow = RequestWorkflow::new(state.store());
    let request = workflow
        .submit(&body.center_name, &body.username, &body.password)
        .await
        .map_err(|e| ApiError::new(correlation_id.clone(), e))?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            request_id: correlation_id.to_string(),
            request: request.to_view(),
        }),
    ))
}

/// List account requests, optionally filtered by status.
pub async fn list(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    RequireSuperAdmin(_principal): RequireSuperAdmin,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let requests = state
        .store()
        .list_requests(query.status)
        .await
        .map_err(|e| ApiError::new(correlation_id.clone(), ErrorKind::from(e)))?;

    Ok(Json(ListResponse {
        request_id: correlation_id.to_string(),
        requests: requests.iter().map(crate::models::AdminRequest::to_view).collect(),
    }))
}

/// Decide a pending account request.
pub async fn decide(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    RequireSuperAdmin(principal): RequireSuperAdmin,
    Path(id): Path<RequestId>,
    Json(body): Json<DecideBody>,
) -> Result<Json<DecideResponse>, ApiError> {
    // The guard only admits principals with a live credential row.
    let decided_by = principal
        .id
        .ok_or_else(|| ApiError::new(correlation_id.clone(), ErrorKind::Forbidden))?;

    let workflow = RequestWorkflow::new(state.store());
    let decision = workflow
        .decide(decided_by, id, body.action, body.center_id)
        .await
        .map_err(|e| ApiError::new(correlation_id.clone(), e))?;

    Ok(Json(DecideResponse {
        request_id: correlation_id.to_string(),
        request: decision.request.to_view(),
        created_user: decision.created_user.map(|u| u.to_public()),
    }))
}
