//! Center (tenant) row type.

use serde::{Deserialize, Serialize};

use centerdesk_core::CenterId;

/// A physical center: the tenant isolation boundary.
///
/// This server only reads centers, for scoping checks and the approval
/// workflow's center-selection step; center lifecycle is managed elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Center {
    /// Unique center ID. Every tenant-owned row carries it as a foreign key.
    pub id: CenterId,
    /// Display name.
    pub name: String,
    /// Short operator-facing code.
    pub code: String,
}
