//! Authentication route handlers.
//!
//! Login, logout, the legacy shared-code bootstrap flow, and the session
//! whoami endpoint.

use axum::{Json, extract::State};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use centerdesk_core::{AdminUserId, CenterId};

use crate::auth::AuthService;
use crate::error::ApiError;
use crate::middleware::{CorrelationId, RequireAdmin, expired_session_cookie, session_cookie};
use crate::models::PublicAdminUser;
use crate::state::AppState;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Login request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginBody {
    pub username: String,
    pub password: String,
    /// Extends the session from 7 to 30 days.
    #[serde(default)]
    pub remember: bool,
}

/// Login response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub request_id: String,
    pub user: PublicAdminUser,
}

/// Legacy shared-code request body.
#[derive(Debug, Deserialize)]
pub struct AccessCodeBody {
    pub code: String,
}

/// Response carrying only the correlation id.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AckResponse {
    pub request_id: String,
}

/// Session whoami response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub request_id: String,
    pub role: String,
    pub user_id: Option<AdminUserId>,
    pub center_id: Option<CenterId>,
    /// True for shared-code sessions, which carry no credential and cannot
    /// touch tenant-scoped resources.
    pub legacy: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle login with username and password.
///
/// Sets the session cookie and returns the credential's public fields.
pub async fn login(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    jar: CookieJar,
    Json(body): Json<LoginBody>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let auth = AuthService::new(state.store(), state.tokens());
    let (user, token) = auth
        .login(&body.username, &body.password, body.remember)
        .await
        .map_err(|e| ApiError::new(correlation_id.clone(), e))?;

    let jar = jar.add(session_cookie(token, body.remember, state.config().is_secure()));
    tracing::info!(user_id = %user.id, "admin logged in");

    Ok((
        jar,
        Json(LoginResponse {
            request_id: correlation_id.to_string(),
            user: user.to_public(),
        }),
    ))
}

/// Handle the legacy shared-code bootstrap login.
///
/// The issued session has no identity and no tenant; it exists so a fresh
/// deployment can be reached before any credential is provisioned.
pub async fn access_code(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    jar: CookieJar,
    Json(body): Json<AccessCodeBody>,
) -> Result<(CookieJar, Json<AckResponse>), ApiError> {
    let auth = AuthService::new(state.store(), state.tokens());
    let token = auth
        .login_with_code(&body.code, state.config().access_code.as_ref())
        .map_err(|e| ApiError::new(correlation_id.clone(), e))?;

    let jar = jar.add(session_cookie(token, false, state.config().is_secure()));
    tracing::info!("shared-code session issued");

    Ok((
        jar,
        Json(AckResponse {
            request_id: correlation_id.to_string(),
        }),
    ))
}

/// Handle logout by overwriting the cookie with an expired empty value.
pub async fn logout(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    jar: CookieJar,
) -> (CookieJar, Json<AckResponse>) {
    let jar = jar.add(expired_session_cookie(state.config().is_secure()));
    (
        jar,
        Json(AckResponse {
            request_id: correlation_id.to_string(),
        }),
    )
}

/// Describe the current session.
pub async fn session(
    correlation_id: CorrelationId,
    RequireAdmin(principal): RequireAdmin,
) -> Json<SessionResponse> {
    Json(SessionResponse {
        request_id: correlation_id.to_string(),
        role: principal.role.to_string(),
        user_id: principal.id,
        center_id: principal.center_id,
        legacy: principal.id.is_none(),
    })
}
