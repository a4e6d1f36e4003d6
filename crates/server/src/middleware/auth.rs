//! Authorization guard extractors.
//!
//! Every protected route names one of these extractors; there is no ambient
//! authentication state, each request independently re-verifies the session
//! cookie. Verification failures never propagate past this boundary: every
//! failure mode, expired or tampered or absent, collapses into the same
//! rejection.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;

use centerdesk_core::AdminRole;

use crate::error::{ApiError, ErrorKind};
use crate::models::Principal;
use crate::state::AppState;

use super::request_id::correlation_from_parts;
use super::session::SESSION_COOKIE_NAME;

/// Extractor that requires a valid admin session.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdmin(principal): RequireAdmin,
/// ) -> impl IntoResponse {
///     format!("center: {:?}", principal.center_id)
/// }
/// ```
pub struct RequireAdmin(pub Principal);

/// Extractor that requires a live superadmin credential.
///
/// The token never carries the superadmin bit; it is re-read from the
/// credential store on every check so revocation takes effect on the next
/// request, not at token expiry. Any lookup failure yields a rejection,
/// never a default-allow.
pub struct RequireSuperAdmin(pub Principal);

/// Resolve the session cookie to an admin principal.
///
/// Absent cookie, failed verification, whatever the cause: `None`.
fn resolve_admin(parts: &Parts, state: &AppState) -> Option<Principal> {
    let jar = CookieJar::from_headers(&parts.headers);
    let token = jar.get(SESSION_COOKIE_NAME)?.value();

    let claims = match state.tokens().verify(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(reason = %e, "session token rejected");
            return None;
        }
    };

    Some(Principal {
        id: claims.user_id,
        role: AdminRole::Admin,
        center_id: claims.center_id,
        username: None,
    })
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = resolve_admin(parts, state).ok_or_else(|| {
            ApiError::new(correlation_from_parts(parts), ErrorKind::Unauthenticated)
        })?;
        Ok(Self(principal))
    }
}

impl FromRequestParts<AppState> for RequireSuperAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let correlation_id = correlation_from_parts(parts);

        let principal = resolve_admin(parts, state)
            .ok_or_else(|| ApiError::new(correlation_id.clone(), ErrorKind::Unauthenticated))?;

        // Legacy shared-code sessions have no credential to check against.
        let user_id = principal
            .id
            .ok_or_else(|| ApiError::new(correlation_id.clone(), ErrorKind::Forbidden))?;

        let user = match state.store().admin_user_by_id(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                return Err(ApiError::new(correlation_id, ErrorKind::Forbidden));
            }
            Err(e) => {
                // Fail closed: an unreachable store must not grant access.
                tracing::warn!(error = %e, "superadmin check failed; denying");
                return Err(ApiError::new(correlation_id, ErrorKind::Forbidden));
            }
        };

        if !user.is_superadmin || !user.is_active {
            return Err(ApiError::new(correlation_id, ErrorKind::Forbidden));
        }

        Ok(Self(Principal {
            id: Some(user.id),
            role: AdminRole::SuperAdmin,
            center_id: user.center_id,
            username: Some(user.username),
        }))
    }
}
