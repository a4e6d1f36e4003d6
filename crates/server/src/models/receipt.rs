//! Service receipt row types.
//!
//! Receipts are the representative tenant-owned table in this crate;
//! inquiries, tickets, and forum posts follow the identical scoping calling
//! convention and are handled by the same store machinery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use centerdesk_core::{CenterId, ReceiptId};

/// A service receipt as stored in the remote `receipts` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    /// Unique receipt ID. Insufficient on its own for a correct lookup: all
    /// mutations key on the `(id, center_id)` compound.
    pub id: ReceiptId,
    /// Owning tenant.
    pub center_id: CenterId,
    /// Customer the service was performed for.
    pub customer_name: String,
    /// The serviced item.
    pub item: String,
    /// Free-form processing status maintained by staff.
    pub status: String,
    /// Stored media reference; resolved through the signed-asset proxy when
    /// rendered.
    pub image_url: Option<String>,
    /// When the receipt was registered.
    pub created_at: DateTime<Utc>,
}

impl Receipt {
    /// Client-facing view.
    #[must_use]
    pub fn to_view(&self) -> ReceiptView {
        ReceiptView {
            id: self.id,
            center_id: self.center_id,
            customer_name: self.customer_name.clone(),
            item: self.item.clone(),
            status: self.status.clone(),
            image_url: self.image_url.clone(),
            created_at: self.created_at,
        }
    }
}

/// The fields of a receipt as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptView {
    pub id: ReceiptId,
    pub center_id: CenterId,
    pub customer_name: String,
    pub item: String,
    pub status: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert body for a new receipt; the row API assigns the id.
#[derive(Debug, Clone, Serialize)]
pub struct NewReceipt {
    pub center_id: CenterId,
    pub customer_name: String,
    pub item: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Partial update for a receipt. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReceiptPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ReceiptPatch {
    /// Whether the patch changes anything at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.customer_name.is_none()
            && self.item.is_none()
            && self.status.is_none()
            && self.image_url.is_none()
    }
}
