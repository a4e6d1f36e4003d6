//! In-memory credential store.
//!
//! Backs the integration tests and local development without a remote row
//! API. Semantics mirror [`super::RestStore`]: scope filters confine every
//! receipt operation, and `finalize_request` is a compare-and-set guarded
//! by the `pending` precondition.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use centerdesk_core::{
    AdminUserId, CenterId, ReceiptId, RequestId, RequestStatus, Username,
};
use chrono::Utc;

use crate::auth::hash_password;
use crate::models::{
    AdminRequest, AdminUser, Center, NewAdminRequest, NewAdminUser, NewReceipt, Receipt,
    ReceiptPatch, RequestDecision,
};
use crate::scope::TenantScope;

use super::{CredentialStore, StoreError};

#[derive(Default)]
struct Inner {
    users: Vec<AdminUser>,
    requests: Vec<AdminRequest>,
    centers: Vec<Center>,
    receipts: Vec<Receipt>,
}

/// In-memory [`CredentialStore`] implementation.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with [`StoreError::Timeout`], simulating an
    /// unreachable row API.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Timeout);
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store mutex poisoned")
    }

    // =========================================================================
    // Seed helpers
    // =========================================================================

    /// Seed a center and return its id.
    pub fn seed_center(&self, name: &str, code: &str) -> CenterId {
        let center = Center {
            id: CenterId::random(),
            name: name.to_string(),
            code: code.to_string(),
        };
        let id = center.id;
        self.lock().centers.push(center);
        id
    }

    /// Seed an admin credential with a freshly hashed password.
    ///
    /// # Panics
    ///
    /// Panics on an invalid username or hashing failure; seeding is test
    /// setup, not request handling.
    pub fn seed_admin_user(
        &self,
        username: &str,
        password: &str,
        center_id: Option<CenterId>,
        is_active: bool,
        is_superadmin: bool,
    ) -> AdminUser {
        let user = AdminUser {
            id: AdminUserId::random(),
            username: Username::parse(username).expect("seed username must be valid"),
            password_hash: hash_password(password).expect("seed password must hash"),
            center_id,
            is_active,
            is_superadmin,
            created_at: Utc::now(),
        };
        self.lock().users.push(user.clone());
        user
    }

    /// Number of credentials carrying a username. Convergence assertions
    /// need to see duplicates that `admin_user_by_username` would hide.
    #[must_use]
    pub fn count_admin_users(&self, username: &str) -> usize {
        self.lock()
            .users
            .iter()
            .filter(|u| u.username.as_str() == username)
            .count()
    }

    /// Flip a credential's active flag in place, as an operator would.
    pub fn set_user_active(&self, id: AdminUserId, is_active: bool) {
        if let Some(user) = self.lock().users.iter_mut().find(|u| u.id == id) {
            user.is_active = is_active;
        }
    }

    /// Seed a receipt owned by a center.
    pub fn seed_receipt(&self, center_id: CenterId, customer_name: &str, item: &str) -> Receipt {
        let receipt = Receipt {
            id: ReceiptId::random(),
            center_id,
            customer_name: customer_name.to_string(),
            item: item.to_string(),
            status: "received".to_string(),
            image_url: None,
            created_at: Utc::now(),
        };
        self.lock().receipts.push(receipt.clone());
        receipt
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn admin_user_by_id(&self, id: AdminUserId) -> Result<Option<AdminUser>, StoreError> {
        self.check_available()?;
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn admin_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<AdminUser>, StoreError> {
        self.check_available()?;
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| &u.username == username)
            .cloned())
    }

    async fn insert_admin_user(&self, new: NewAdminUser) -> Result<AdminUser, StoreError> {
        self.check_available()?;
        let user = AdminUser {
            id: AdminUserId::random(),
            username: new.username,
            password_hash: new.password_hash,
            center_id: new.center_id,
            is_active: new.is_active,
            is_superadmin: new.is_superadmin,
            created_at: Utc::now(),
        };
        self.lock().users.push(user.clone());
        Ok(user)
    }

    async fn insert_request(&self, new: NewAdminRequest) -> Result<AdminRequest, StoreError> {
        self.check_available()?;
        let request = AdminRequest {
            id: RequestId::random(),
            username: new.username,
            password_hash: new.password_hash,
            center_name: new.center_name,
            status: new.status,
            requested_at: new.requested_at,
            approved_at: None,
            approved_by: None,
            center_id: None,
        };
        self.lock().requests.push(request.clone());
        Ok(request)
    }

    async fn request_by_id(&self, id: RequestId) -> Result<Option<AdminRequest>, StoreError> {
        self.check_available()?;
        Ok(self.lock().requests.iter().find(|r| r.id == id).cloned())
    }

    async fn list_requests(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<AdminRequest>, StoreError> {
        self.check_available()?;
        let mut rows: Vec<AdminRequest> = self
            .lock()
            .requests
            .iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        Ok(rows)
    }

    async fn finalize_request(
        &self,
        id: RequestId,
        decision: RequestDecision,
    ) -> Result<Option<AdminRequest>, StoreError> {
        self.check_available()?;
        let mut inner = self.lock();
        let Some(request) = inner
            .requests
            .iter_mut()
            .find(|r| r.id == id && r.status == RequestStatus::Pending)
        else {
            return Ok(None);
        };

        request.status = decision.status;
        request.approved_at = Some(decision.approved_at);
        request.approved_by = Some(decision.approved_by);
        if decision.center_id.is_some() {
            request.center_id = decision.center_id;
        }
        Ok(Some(request.clone()))
    }

    async fn center_by_id(&self, id: CenterId) -> Result<Option<Center>, StoreError> {
        self.check_available()?;
        Ok(self.lock().centers.iter().find(|c| c.id == id).cloned())
    }

    async fn list_centers(&self) -> Result<Vec<Center>, StoreError> {
        self.check_available()?;
        let mut rows = self.lock().centers.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn insert_receipt(&self, new: NewReceipt) -> Result<Receipt, StoreError> {
        self.check_available()?;
        let receipt = Receipt {
            id: ReceiptId::random(),
            center_id: new.center_id,
            customer_name: new.customer_name,
            item: new.item,
            status: new.status,
            image_url: new.image_url,
            created_at: Utc::now(),
        };
        self.lock().receipts.push(receipt.clone());
        Ok(receipt)
    }

    async fn list_receipts(&self, scope: &TenantScope) -> Result<Vec<Receipt>, StoreError> {
        self.check_available()?;
        let mut rows: Vec<Receipt> = self
            .lock()
            .receipts
            .iter()
            .filter(|r| scope.permits(r.center_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn receipt_by_id(
        &self,
        id: ReceiptId,
        scope: &TenantScope,
    ) -> Result<Option<Receipt>, StoreError> {
        self.check_available()?;
        Ok(self
            .lock()
            .receipts
            .iter()
            .find(|r| r.id == id && scope.permits(r.center_id))
            .cloned())
    }

    async fn update_receipt(
        &self,
        id: ReceiptId,
        scope: &TenantScope,
        patch: ReceiptPatch,
    ) -> Result<Option<Receipt>, StoreError> {
        self.check_available()?;
        let mut inner = self.lock();
        let Some(receipt) = inner
            .receipts
            .iter_mut()
            .find(|r| r.id == id && scope.permits(r.center_id))
        else {
            return Ok(None);
        };

        if let Some(customer_name) = patch.customer_name {
            receipt.customer_name = customer_name;
        }
        if let Some(item) = patch.item {
            receipt.item = item;
        }
        if let Some(status) = patch.status {
            receipt.status = status;
        }
        if let Some(image_url) = patch.image_url {
            receipt.image_url = Some(image_url);
        }
        Ok(Some(receipt.clone()))
    }

    async fn delete_receipt(
        &self,
        id: ReceiptId,
        scope: &TenantScope,
    ) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut inner = self.lock();
        let before = inner.receipts.len();
        inner
            .receipts
            .retain(|r| !(r.id == id && scope.permits(r.center_id)));
        Ok(inner.receipts.len() < before)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scope_confines_receipts() {
        let store = MemoryStore::new();
        let north = store.seed_center("North", "N01");
        let south = store.seed_center("South", "S01");
        let north_receipt = store.seed_receipt(north, "Kim", "phone");
        let south_receipt = store.seed_receipt(south, "Lee", "tablet");

        let scope = TenantScope::Center(north);
        let visible = store.list_receipts(&scope).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, north_receipt.id);

        // A cross-tenant id lookup misses entirely.
        let miss = store.receipt_by_id(south_receipt.id, &scope).await.unwrap();
        assert!(miss.is_none());

        // Unrestricted sees both.
        let all = store.list_receipts(&TenantScope::Unrestricted).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_cross_tenant_delete_is_a_miss() {
        let store = MemoryStore::new();
        let north = store.seed_center("North", "N01");
        let south = store.seed_center("South", "S01");
        let south_receipt = store.seed_receipt(south, "Lee", "tablet");

        let deleted = store
            .delete_receipt(south_receipt.id, &TenantScope::Center(north))
            .await
            .unwrap();
        assert!(!deleted);

        // The row survived.
        let still_there = store
            .receipt_by_id(south_receipt.id, &TenantScope::Unrestricted)
            .await
            .unwrap();
        assert!(still_there.is_some());
    }

    #[tokio::test]
    async fn test_finalize_request_is_pending_guarded() {
        let store = MemoryStore::new();
        let request = store
            .insert_request(NewAdminRequest {
                username: Username::parse("alice").unwrap(),
                password_hash: "hash".to_string(),
                center_name: "North".to_string(),
                status: RequestStatus::Pending,
                requested_at: Utc::now(),
            })
            .await
            .unwrap();

        let decision = RequestDecision {
            status: RequestStatus::Rejected,
            approved_at: Utc::now(),
            approved_by: AdminUserId::random(),
            center_id: None,
        };

        let first = store
            .finalize_request(request.id, decision.clone())
            .await
            .unwrap();
        assert!(first.is_some());

        // The precondition fails the second time; nothing is written.
        let second = store.finalize_request(request.id, decision).await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_unavailable_store_times_out() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        let err = store.list_centers().await.unwrap_err();
        assert!(matches!(err, StoreError::Timeout));
    }
}
