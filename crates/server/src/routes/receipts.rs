//! Service receipt route handlers.
//!
//! The representative tenant-scoped resource. Every handler derives a
//! [`TenantScope`](crate::scope::TenantScope) from the principal and passes
//! it to the store; the owning center of a new receipt comes from the
//! scope, never from client input. A scoped miss is a 404, so cross-tenant
//! probing learns nothing about row existence.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use centerdesk_core::{CenterId, ReceiptId};

use crate::error::{ApiError, ErrorKind};
use crate::middleware::{CorrelationId, RequireAdmin};
use crate::models::{NewReceipt, ReceiptPatch, ReceiptView};
use crate::scope::TenantScope;
use crate::state::AppState;

const RECEIPT_NOT_FOUND: &str = "receipt not found";

// =============================================================================
// Request/Response Types
// =============================================================================

/// Creation body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
    pub customer_name: String,
    pub item: String,
    pub status: Option<String>,
    pub image_url: Option<String>,
    /// Only honored for superadmins; a tenant admin's receipts always land
    /// in their own center.
    pub center_id: Option<CenterId>,
}

/// Update body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
    pub customer_name: Option<String>,
    pub item: Option<String>,
    pub status: Option<String>,
    pub image_url: Option<String>,
}

/// Single-receipt response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    pub request_id: String,
    pub receipt: ReceiptView,
}

/// Listing response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub request_id: String,
    pub receipts: Vec<ReceiptView>,
}

/// Deletion response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub request_id: String,
    pub deleted: bool,
}

// =============================================================================
// Handlers
// =============================================================================

fn scope_for(principal: &crate::models::Principal, correlation_id: &CorrelationId) -> Result<TenantScope, ApiError> {
    principal
        .tenant_scope()
        .map_err(|e| ApiError::new(correlation_id.clone(), e))
}

/// List receipts visible to the caller.
pub async fn list(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    RequireAdmin(principal): RequireAdmin,
) -> Result<Json<ListResponse>, ApiError> {
    let scope = scope_for(&principal, &correlation_id)?;
    let receipts = state
        .store()
        .list_receipts(&scope)
        .await
        .map_err(|e| ApiError::new(correlation_id.clone(), e))?;

    Ok(Json(ListResponse {
        request_id: correlation_id.to_string(),
        receipts: receipts.iter().map(crate::models::Receipt::to_view).collect(),
    }))
}

/// Register a new receipt in the caller's center.
pub async fn create(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    RequireAdmin(principal): RequireAdmin,
    Json(body): Json<CreateBody>,
) -> Result<(StatusCode, Json<ReceiptResponse>), ApiError> {
    let scope = scope_for(&principal, &correlation_id)?;

    if body.customer_name.trim().is_empty() || body.item.trim().is_empty() {
        return Err(ApiError::new(
            correlation_id,
            ErrorKind::Validation("customerName and item are required".to_string()),
        ));
    }

    // The owning tenant comes from the principal; client input only matters
    // for superadmins, who have no center of their own.
    let center_id = match scope {
        TenantScope::Center(center_id) => center_id,
        TenantScope::Unrestricted => body.center_id.ok_or_else(|| {
            ApiError::new(
                correlation_id.clone(),
                ErrorKind::Validation("centerId is required".to_string()),
            )
        })?,
    };

    let receipt = state
        .store()
        .insert_receipt(NewReceipt {
            center_id,
            customer_name: body.customer_name.trim().to_string(),
            item: body.item.trim().to_string(),
            status: body.status.unwrap_or_else(|| "received".to_string()),
            image_url: body.image_url,
        })
        .await
        .map_err(|e| ApiError::new(correlation_id.clone(), e))?;

    Ok((
        StatusCode::CREATED,
        Json(ReceiptResponse {
            request_id: correlation_id.to_string(),
            receipt: receipt.to_view(),
        }),
    ))
}

/// Load one receipt.
pub async fn show(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    RequireAdmin(principal): RequireAdmin,
    Path(id): Path<ReceiptId>,
) -> Result<Json<ReceiptResponse>, ApiError> {
    let scope = scope_for(&principal, &correlation_id)?;
    let receipt = state
        .store()
        .receipt_by_id(id, &scope)
        .await
        .map_err(|e| ApiError::new(correlation_id.clone(), e))?
        .ok_or_else(|| {
            ApiError::new(
                correlation_id.clone(),
                ErrorKind::NotFound(RECEIPT_NOT_FOUND.to_string()),
            )
        })?;

    Ok(Json(ReceiptResponse {
        request_id: correlation_id.to_string(),
        receipt: receipt.to_view(),
    }))
}

/// Update one receipt, keyed on `(id, center_id)`.
pub async fn update(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    RequireAdmin(principal): RequireAdmin,
    Path(id): Path<ReceiptId>,
    Json(body): Json<UpdateBody>,
) -> Result<Json<ReceiptResponse>, ApiError> {
    let scope = scope_for(&principal, &correlation_id)?;

    let patch = ReceiptPatch {
        customer_name: body.customer_name,
        item: body.item,
        status: body.status,
        image_url: body.image_url,
    };
    if patch.is_empty() {
        return Err(ApiError::new(
            correlation_id,
            ErrorKind::Validation("nothing to update".to_string()),
        ));
    }

    let receipt = state
        .store()
        .update_receipt(id, &scope, patch)
        .await
        .map_err(|e| ApiError::new(correlation_id.clone(), e))?
        .ok_or_else(|| {
            ApiError::new(
                correlation_id.clone(),
                ErrorKind::NotFound(RECEIPT_NOT_FOUND.to_string()),
            )
        })?;

    Ok(Json(ReceiptResponse {
        request_id: correlation_id.to_string(),
        receipt: receipt.to_view(),
    }))
}

/// Delete one receipt, keyed on `(id, center_id)`.
pub async fn remove(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    RequireAdmin(principal): RequireAdmin,
    Path(id): Path<ReceiptId>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let scope = scope_for(&principal, &correlation_id)?;
    let deleted = state
        .store()
        .delete_receipt(id, &scope)
        .await
        .map_err(|e| ApiError::new(correlation_id.clone(), e))?;

    if !deleted {
        return Err(ApiError::new(
            correlation_id,
            ErrorKind::NotFound(RECEIPT_NOT_FOUND.to_string()),
        ));
    }

    Ok(Json(DeleteResponse {
        request_id: correlation_id.to_string(),
        deleted: true,
    }))
}
