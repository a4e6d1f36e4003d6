//! Domain types for the server.

pub mod admin_request;
pub mod admin_user;
pub mod center;
pub mod principal;
pub mod receipt;

pub use admin_request::{AdminRequest, AdminRequestView, NewAdminRequest, RequestDecision};
pub use admin_user::{AdminUser, NewAdminUser, PublicAdminUser};
pub use center::Center;
pub use principal::Principal;
pub use receipt::{NewReceipt, Receipt, ReceiptPatch, ReceiptView};
