//! The tenant scoping rule.
//!
//! Every data operation against a tenant-owned table takes a [`TenantScope`]
//! and applies it as an equality filter on `center_id`. The scope is derived
//! from the request's principal, never from client input. A scoped miss is
//! reported as not-found so tenant isolation cannot leak row existence.

use centerdesk_core::CenterId;

use crate::error::ErrorKind;

/// The tenant filter a principal's data access is confined to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantScope {
    /// Confined to a single center: every read and write filters on
    /// `center_id`, and mutations key on the `(id, center_id)` compound.
    Center(CenterId),
    /// Superadmin access: no tenant filter is applied.
    Unrestricted,
}

impl TenantScope {
    /// Whether a row owned by `center_id` is visible under this scope.
    #[must_use]
    pub fn permits(&self, center_id: CenterId) -> bool {
        match self {
            Self::Center(own) => *own == center_id,
            Self::Unrestricted => true,
        }
    }
}

/// An otherwise-valid admin session with no tenant attached.
///
/// Minted by the legacy shared-code login; such a session is unauthorized
/// for every tenant-scoped resource.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("session is not bound to a center")]
pub struct MissingTenant;

impl From<MissingTenant> for ErrorKind {
    fn from(_: MissingTenant) -> Self {
        Self::Forbidden
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_scope_permits_own_rows_only() {
        let own = CenterId::random();
        let other = CenterId::random();
        let scope = TenantScope::Center(own);

        assert!(scope.permits(own));
        assert!(!scope.permits(other));
    }

    #[test]
    fn test_unrestricted_scope_permits_everything() {
        assert!(TenantScope::Unrestricted.permits(CenterId::random()));
    }
}
