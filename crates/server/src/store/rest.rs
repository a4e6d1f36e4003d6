//! Row API client.
//!
//! Talks to a PostgREST-style row API: tables under `rest/v1/`, horizontal
//! filters as `column=eq.value` query parameters, inserts returning the
//! stored representation. The client knows nothing about tenancy beyond the
//! filters its callers hand it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use centerdesk_core::{AdminUserId, CenterId, ReceiptId, RequestId, RequestStatus, Username};

use crate::config::DatastoreConfig;
use crate::models::{
    AdminRequest, AdminUser, Center, NewAdminRequest, NewAdminUser, NewReceipt, Receipt,
    ReceiptPatch, RequestDecision,
};
use crate::scope::TenantScope;

use super::{CredentialStore, StoreError};

const ADMIN_USERS: &str = "admin_users";
const ADMIN_REQUESTS: &str = "admin_requests";
const CENTERS: &str = "centers";
const RECEIPTS: &str = "receipts";

/// Row API client.
#[derive(Clone)]
pub struct RestStore {
    client: Client,
    base_url: Url,
    service_key: SecretString,
}

impl std::fmt::Debug for RestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStore")
            .field("base_url", &self.base_url.as_str())
            .field("service_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl RestStore {
    /// Create a client with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Request` if the HTTP client cannot be built.
    pub fn new(config: &DatastoreConfig, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            service_key: config.service_key.clone(),
        })
    }

    fn table_url(&self, table: &str, filters: &[(String, String)]) -> Result<Url, StoreError> {
        let mut url = self
            .base_url
            .join(&format!("rest/v1/{table}"))
            .map_err(|e| StoreError::Request(e.to_string()))?;
        for (key, value) in filters {
            url.query_pairs_mut().append_pair(key, value);
        }
        Ok(url)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", self.service_key.expose_secret())
            .bearer_auth(self.service_key.expose_secret())
    }

    async fn read_rows<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Vec<T>, StoreError> {
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Api {
                status: status.as_u16(),
            });
        }
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(String, String)],
    ) -> Result<Vec<T>, StoreError> {
        let url = self.table_url(table, filters)?;
        let response = self
            .authed(self.client.get(url))
            .send()
            .await
            .map_err(map_send_error)?;
        Self::read_rows(response).await
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(String, String)],
    ) -> Result<Option<T>, StoreError> {
        let rows = self.select::<T>(table, filters).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<T, StoreError> {
        let url = self.table_url(table, &[])?;
        let response = self
            .authed(self.client.post(url))
            .header("Prefer", "return=representation")
            // The row API accepts a batch; a single insert is a one-row batch.
            .json(&[body])
            .send()
            .await
            .map_err(map_send_error)?;
        let rows: Vec<T> = Self::read_rows(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no rows".to_string()))
    }

    async fn patch_rows<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        table: &str,
        filters: &[(String, String)],
        body: &B,
    ) -> Result<Vec<T>, StoreError> {
        let url = self.table_url(table, filters)?;
        let response = self
            .authed(self.client.patch(url))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .map_err(map_send_error)?;
        Self::read_rows(response).await
    }

    async fn delete_rows(
        &self,
        table: &str,
        filters: &[(String, String)],
    ) -> Result<u64, StoreError> {
        let url = self.table_url(table, filters)?;
        let response = self
            .authed(self.client.delete(url))
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(map_send_error)?;
        let rows: Vec<serde_json::Value> = Self::read_rows(response).await?;
        Ok(rows.len() as u64)
    }
}

/// Build a `column=eq.value` filter pair.
fn eq(column: &str, value: impl std::fmt::Display) -> (String, String) {
    (column.to_string(), format!("eq.{value}"))
}

/// Append the tenant filter a scope requires. `Unrestricted` adds nothing.
fn apply_scope(scope: &TenantScope, filters: &mut Vec<(String, String)>) {
    if let TenantScope::Center(center_id) = scope {
        filters.push(eq("center_id", center_id));
    }
}

fn map_send_error(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout
    } else {
        StoreError::Request(e.to_string())
    }
}

#[async_trait]
impl CredentialStore for RestStore {
    async fn admin_user_by_id(&self, id: AdminUserId) -> Result<Option<AdminUser>, StoreError> {
        self.select_one(ADMIN_USERS, &[eq("id", id)]).await
    }

    async fn admin_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<AdminUser>, StoreError> {
        self.select_one(ADMIN_USERS, &[eq("username", username)])
            .await
    }

    #[instrument(skip(self, new), fields(username = %new.username))]
    async fn insert_admin_user(&self, new: NewAdminUser) -> Result<AdminUser, StoreError> {
        self.insert(ADMIN_USERS, &new).await
    }

    #[instrument(skip(self, new), fields(username = %new.username))]
    async fn insert_request(&self, new: NewAdminRequest) -> Result<AdminRequest, StoreError> {
        self.insert(ADMIN_REQUESTS, &new).await
    }

    async fn request_by_id(&self, id: RequestId) -> Result<Option<AdminRequest>, StoreError> {
        self.select_one(ADMIN_REQUESTS, &[eq("id", id)]).await
    }

    async fn list_requests(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<AdminRequest>, StoreError> {
        let mut filters = vec![("order".to_string(), "requested_at.desc".to_string())];
        if let Some(status) = status {
            filters.push(eq("status", status));
        }
        self.select(ADMIN_REQUESTS, &filters).await
    }

    #[instrument(skip(self, decision), fields(request_id = %id, status = %decision.status))]
    async fn finalize_request(
        &self,
        id: RequestId,
        decision: RequestDecision,
    ) -> Result<Option<AdminRequest>, StoreError> {
        // Compare-and-set: the status filter makes the pending precondition
        // part of the update itself, so a lost race writes nothing.
        let filters = vec![eq("id", id), eq("status", RequestStatus::Pending)];
        let rows: Vec<AdminRequest> = self
            .patch_rows(ADMIN_REQUESTS, &filters, &decision)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn center_by_id(&self, id: CenterId) -> Result<Option<Center>, StoreError> {
        self.select_one(CENTERS, &[eq("id", id)]).await
    }

    async fn list_centers(&self) -> Result<Vec<Center>, StoreError> {
        self.select(CENTERS, &[("order".to_string(), "name.asc".to_string())])
            .await
    }

    async fn insert_receipt(&self, new: NewReceipt) -> Result<Receipt, StoreError> {
        self.insert(RECEIPTS, &new).await
    }

    async fn list_receipts(&self, scope: &TenantScope) -> Result<Vec<Receipt>, StoreError> {
        let mut filters = vec![("order".to_string(), "created_at.desc".to_string())];
        apply_scope(scope, &mut filters);
        self.select(RECEIPTS, &filters).await
    }

    async fn receipt_by_id(
        &self,
        id: ReceiptId,
        scope: &TenantScope,
    ) -> Result<Option<Receipt>, StoreError> {
        let mut filters = vec![eq("id", id)];
        apply_scope(scope, &mut filters);
        self.select_one(RECEIPTS, &filters).await
    }

    async fn update_receipt(
        &self,
        id: ReceiptId,
        scope: &TenantScope,
        patch: ReceiptPatch,
    ) -> Result<Option<Receipt>, StoreError> {
        let mut filters = vec![eq("id", id)];
        apply_scope(scope, &mut filters);
        let rows: Vec<Receipt> = self.patch_rows(RECEIPTS, &filters, &patch).await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_receipt(
        &self,
        id: ReceiptId,
        scope: &TenantScope,
    ) -> Result<bool, StoreError> {
        let mut filters = vec![eq("id", id)];
        apply_scope(scope, &mut filters);
        Ok(self.delete_rows(RECEIPTS, &filters).await? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eq_filter_format() {
        let id = CenterId::random();
        let (column, value) = eq("center_id", id);
        assert_eq!(column, "center_id");
        assert_eq!(value, format!("eq.{id}"));
    }

    #[test]
    fn test_apply_scope_adds_center_filter() {
        let center_id = CenterId::random();
        let mut filters = Vec::new();
        apply_scope(&TenantScope::Center(center_id), &mut filters);
        assert_eq!(filters, vec![eq("center_id", center_id)]);
    }

    #[test]
    fn test_apply_scope_unrestricted_adds_nothing() {
        let mut filters = Vec::new();
        apply_scope(&TenantScope::Unrestricted, &mut filters);
        assert!(filters.is_empty());
    }
}
