//! Admin credential row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use centerdesk_core::{AdminUserId, CenterId, Username};

/// An admin credential as stored in the remote `admin_users` table.
///
/// The serde field names match the table columns, so this type doubles as
/// the wire row for the row API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    /// Unique credential ID.
    pub id: AdminUserId,
    /// Login username.
    pub username: Username,
    /// Argon2id password hash. Never leaves the server.
    pub password_hash: String,
    /// Tenant the credential is confined to. Superadmins may have none.
    pub center_id: Option<CenterId>,
    /// Deactivated credentials cannot log in or pass privileged checks.
    pub is_active: bool,
    /// Cross-tenant role flag, always re-read live from this row.
    pub is_superadmin: bool,
    /// When the credential was created.
    pub created_at: DateTime<Utc>,
}

impl AdminUser {
    /// Public projection without the password hash.
    #[must_use]
    pub fn to_public(&self) -> PublicAdminUser {
        PublicAdminUser {
            id: self.id,
            username: self.username.clone(),
            center_id: self.center_id,
            is_active: self.is_active,
            is_superadmin: self.is_superadmin,
            created_at: self.created_at,
        }
    }
}

/// Insert body for a new admin credential; the row API assigns the id.
#[derive(Debug, Clone, Serialize)]
pub struct NewAdminUser {
    pub username: Username,
    pub password_hash: String,
    pub center_id: Option<CenterId>,
    pub is_active: bool,
    pub is_superadmin: bool,
}

/// The fields of an admin credential safe to return to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAdminUser {
    pub id: AdminUserId,
    pub username: Username,
    pub center_id: Option<CenterId>,
    pub is_active: bool,
    pub is_superadmin: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_public_projection_drops_hash() {
        let user = AdminUser {
            id: AdminUserId::random(),
            username: Username::parse("alice").unwrap(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".to_string(),
            center_id: Some(CenterId::random()),
            is_active: true,
            is_superadmin: false,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&user.to_public()).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("\"username\":\"alice\""));
    }
}
