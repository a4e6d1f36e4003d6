//! Credential store adapter.
//!
//! The persistent relational store is a remote row API consumed over HTTP;
//! this module defines the operations the server needs from it and two
//! implementations: [`RestStore`] for production and [`MemoryStore`] for
//! tests and local development.
//!
//! The adapter itself is schema-unaware plumbing. Tenant confinement is a
//! calling convention: every operation that touches a tenant-owned table
//! takes a [`TenantScope`] and applies it as a `center_id` filter, and
//! mutations key on the `(id, center_id)` compound so a caller cannot reach
//! another tenant's row by guessing an id.

mod memory;
mod rest;

pub use memory::MemoryStore;
pub use rest::RestStore;

use async_trait::async_trait;
use thiserror::Error;

use centerdesk_core::{AdminUserId, CenterId, ReceiptId, RequestId, RequestStatus, Username};

use crate::models::{
    AdminRequest, AdminUser, Center, NewAdminRequest, NewAdminUser, NewReceipt, Receipt,
    ReceiptPatch, RequestDecision,
};
use crate::scope::TenantScope;

/// Failures of the remote row API.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request could not be sent or the connection failed.
    #[error("row API request failed: {0}")]
    Request(String),

    /// The row API answered with a non-success status.
    #[error("row API returned status {status}")]
    Api { status: u16 },

    /// The response body could not be decoded.
    #[error("row API response could not be decoded: {0}")]
    Decode(String),

    /// The request exceeded the configured upstream timeout. Not retried
    /// automatically.
    #[error("row API request timed out")]
    Timeout,
}

/// Operations the access-control core needs from the credential store.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    // =========================================================================
    // Admin credentials
    // =========================================================================

    /// Look up a credential by id. Used by the superadmin guard to re-read
    /// live authorization flags on every privileged check.
    async fn admin_user_by_id(&self, id: AdminUserId) -> Result<Option<AdminUser>, StoreError>;

    /// Look up a credential by username.
    async fn admin_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<AdminUser>, StoreError>;

    /// Insert a new credential and return the stored row.
    async fn insert_admin_user(&self, new: NewAdminUser) -> Result<AdminUser, StoreError>;

    // =========================================================================
    // Account requests
    // =========================================================================

    /// Insert a new pending account request.
    async fn insert_request(&self, new: NewAdminRequest) -> Result<AdminRequest, StoreError>;

    /// Load a request by id.
    async fn request_by_id(&self, id: RequestId) -> Result<Option<AdminRequest>, StoreError>;

    /// List requests, optionally filtered by status, newest first.
    async fn list_requests(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<AdminRequest>, StoreError>;

    /// Apply a terminal decision to a request, guarded by the `pending`
    /// precondition. Returns `None` when the precondition fails (the row is
    /// missing or was already decided), in which case nothing was written.
    async fn finalize_request(
        &self,
        id: RequestId,
        decision: RequestDecision,
    ) -> Result<Option<AdminRequest>, StoreError>;

    // =========================================================================
    // Centers
    // =========================================================================

    /// Load a center by id.
    async fn center_by_id(&self, id: CenterId) -> Result<Option<Center>, StoreError>;

    /// List all centers.
    async fn list_centers(&self) -> Result<Vec<Center>, StoreError>;

    // =========================================================================
    // Receipts (tenant-owned)
    // =========================================================================

    /// Insert a receipt. The owning center comes from the caller's scope
    /// upstream, never from client input.
    async fn insert_receipt(&self, new: NewReceipt) -> Result<Receipt, StoreError>;

    /// List receipts visible under the scope, newest first.
    async fn list_receipts(&self, scope: &TenantScope) -> Result<Vec<Receipt>, StoreError>;

    /// Load a receipt by id, confined to the scope.
    async fn receipt_by_id(
        &self,
        id: ReceiptId,
        scope: &TenantScope,
    ) -> Result<Option<Receipt>, StoreError>;

    /// Update a receipt keyed on `(id, center_id)`. Returns `None` when no
    /// row matched under the scope.
    async fn update_receipt(
        &self,
        id: ReceiptId,
        scope: &TenantScope,
        patch: ReceiptPatch,
    ) -> Result<Option<Receipt>, StoreError>;

    /// Delete a receipt keyed on `(id, center_id)`. Returns whether a row
    /// was deleted.
    async fn delete_receipt(&self, id: ReceiptId, scope: &TenantScope)
    -> Result<bool, StoreError>;
}
