//! HTTP middleware: correlation ids, session cookies, authorization guards,
//! and rate limiting.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{RequireAdmin, RequireSuperAdmin};
pub use rate_limit::auth_rate_limiter;
pub use request_id::{CorrelationId, REQUEST_ID_HEADER, request_id_middleware};
pub use session::{SESSION_COOKIE_NAME, expired_session_cookie, session_cookie};
