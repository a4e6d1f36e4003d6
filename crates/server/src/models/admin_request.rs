//! Account request row types.
//!
//! A request leaves `pending` exactly once; the decision patch is applied
//! with a compare-and-set guarded by the `pending` precondition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use centerdesk_core::{AdminUserId, CenterId, RequestId, RequestStatus, Username};

/// A credential request as stored in the remote `admin_requests` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminRequest {
    /// Unique request ID.
    pub id: RequestId,
    /// Requested login username.
    pub username: Username,
    /// Argon2id hash of the requested password, hashed at submission time.
    pub password_hash: String,
    /// Free-text center name supplied by the requester. The reviewer binds
    /// the request to a real center at approval time.
    pub center_name: String,
    /// Lifecycle status.
    pub status: RequestStatus,
    /// When the request was submitted.
    pub requested_at: DateTime<Utc>,
    /// Decision timestamp (set for both approve and reject).
    pub approved_at: Option<DateTime<Utc>>,
    /// The superadmin who decided the request.
    pub approved_by: Option<AdminUserId>,
    /// Tenant bound at approval time.
    pub center_id: Option<CenterId>,
}

impl AdminRequest {
    /// Client-facing view without the password hash.
    #[must_use]
    pub fn to_view(&self) -> AdminRequestView {
        AdminRequestView {
            id: self.id,
            username: self.username.clone(),
            center_name: self.center_name.clone(),
            status: self.status,
            requested_at: self.requested_at,
            approved_at: self.approved_at,
            approved_by: self.approved_by,
            center_id: self.center_id,
        }
    }
}

/// Insert body for a new account request; the row API assigns the id.
#[derive(Debug, Clone, Serialize)]
pub struct NewAdminRequest {
    pub username: Username,
    pub password_hash: String,
    pub center_name: String,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
}

/// Terminal-decision patch for a pending request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestDecision {
    pub status: RequestStatus,
    pub approved_at: DateTime<Utc>,
    pub approved_by: AdminUserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_id: Option<CenterId>,
}

/// The fields of an account request safe to return to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRequestView {
    pub id: RequestId,
    pub username: Username,
    pub center_name: String,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<AdminUserId>,
    pub center_id: Option<CenterId>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_view_drops_hash() {
        let request = AdminRequest {
            id: RequestId::random(),
            username: Username::parse("alice").unwrap(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".to_string(),
            center_name: "North".to_string(),
            status: RequestStatus::Pending,
            requested_at: Utc::now(),
            approved_at: None,
            approved_by: None,
            center_id: None,
        };

        let json = serde_json::to_string(&request.to_view()).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("\"centerName\":\"North\""));
        assert!(json.contains("\"status\":\"pending\""));
    }
}
