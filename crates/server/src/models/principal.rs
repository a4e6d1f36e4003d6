//! The authenticated principal resolved for one request.

use centerdesk_core::{AdminRole, AdminUserId, CenterId, Username};

use crate::scope::{MissingTenant, TenantScope};

/// Identity, role, and tenant resolved from a verified session token.
///
/// Constructed fresh per request by the authorization guard; never
/// persisted. The role starts as [`AdminRole::Admin`] straight from the
/// token and is upgraded to [`AdminRole::SuperAdmin`] only after the guard
/// re-reads the live credential row.
#[derive(Debug, Clone)]
pub struct Principal {
    /// Credential record id; absent for the legacy shared-code flow.
    pub id: Option<AdminUserId>,
    /// Effective role for this request.
    pub role: AdminRole,
    /// Tenant the principal is confined to. Required for tenant-scoped
    /// operations; informational for superadmins.
    pub center_id: Option<CenterId>,
    /// Display-only username, populated when the credential row was loaded.
    pub username: Option<Username>,
}

impl Principal {
    /// Whether this principal passed the live superadmin check.
    #[must_use]
    pub fn is_superadmin(&self) -> bool {
        self.role == AdminRole::SuperAdmin
    }

    /// Derive the tenant scope this principal's data access is confined to.
    ///
    /// # Errors
    ///
    /// Returns [`MissingTenant`] for an admin session with no `center_id`
    /// (the legacy shared-code flow); such a session cannot touch any
    /// tenant-scoped resource.
    pub fn tenant_scope(&self) -> Result<TenantScope, MissingTenant> {
        if self.is_superadmin() {
            return Ok(TenantScope::Unrestricted);
        }
        self.center_id.map(TenantScope::Center).ok_or(MissingTenant)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_scope_is_own_center() {
        let center = CenterId::random();
        let principal = Principal {
            id: Some(AdminUserId::random()),
            role: AdminRole::Admin,
            center_id: Some(center),
            username: None,
        };

        assert_eq!(principal.tenant_scope().unwrap(), TenantScope::Center(center));
    }

    #[test]
    fn test_superadmin_scope_is_unrestricted() {
        let principal = Principal {
            id: Some(AdminUserId::random()),
            role: AdminRole::SuperAdmin,
            center_id: None,
            username: None,
        };

        assert_eq!(principal.tenant_scope().unwrap(), TenantScope::Unrestricted);
    }

    #[test]
    fn test_legacy_session_has_no_scope() {
        let principal = Principal {
            id: None,
            role: AdminRole::Admin,
            center_id: None,
            username: None,
        };

        assert!(principal.tenant_scope().is_err());
    }
}
