//! Session token issuing and verification.
//!
//! Tokens are HS256-signed JWTs carrying identity and tenant only. Mutable
//! authorization state (superadmin bit, active flag) is deliberately kept
//! out of the token and re-read from the credential store on every
//! privileged check, so a revoked credential dies with the next request
//! rather than at token expiry.
//!
//! The signing secret is injected through the constructor and held for the
//! process lifetime; there is no ambient key lookup and no rotation.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use centerdesk_core::{AdminUserId, CenterId};

/// Standard session lifetime.
const SESSION_TTL_DAYS: i64 = 7;

/// Extended lifetime for "remember me" sessions.
const REMEMBER_TTL_DAYS: i64 = 30;

/// The only role a session token may carry. Superadmin status is never
/// embedded in the token.
const ROLE_ADMIN: &str = "admin";

/// Why a token failed verification.
///
/// The set is closed on purpose: the guard maps every variant to the same
/// "no principal" outcome, so no failure mode can be mistaken for success
/// and no caller can branch on the cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The expiry has elapsed.
    #[error("token has expired")]
    Expired,
    /// The signature does not match the signing secret.
    #[error("token signature is invalid")]
    BadSignature,
    /// The token could not be decoded at all.
    #[error("token is malformed")]
    Malformed,
    /// The decoded role claim is not `admin`.
    #[error("token role is not admin")]
    WrongRole,
    /// Signing failed; an unusable key is a configuration error, not a
    /// per-request condition.
    #[error("token signing failed")]
    Signing,
}

/// The verified contents of a session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClaims {
    /// Credential record id; `None` for legacy shared-code sessions.
    pub user_id: Option<AdminUserId>,
    /// Tenant the session is confined to; `None` for legacy sessions and
    /// unassigned superadmins.
    pub center_id: Option<CenterId>,
}

/// JWT payload. Field names are the wire format.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(skip_serializing_if = "Option::is_none")]
    sub: Option<AdminUserId>,
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    center_id: Option<CenterId>,
    iat: i64,
    exp: i64,
}

/// Issues and verifies signed session tokens.
///
/// Pure CPU-bound work; safe to share across requests without locking.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService").finish_non_exhaustive()
    }
}

impl TokenService {
    /// Create a token service from the process-wide signing secret.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }

    /// Issue a signed session token for a credential.
    ///
    /// `remember` extends the expiry from 7 to 30 days.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Signing`] if the key cannot sign; this is a
    /// fatal configuration problem, not a per-request condition.
    pub fn issue(
        &self,
        user_id: AdminUserId,
        center_id: Option<CenterId>,
        remember: bool,
    ) -> Result<String, TokenError> {
        self.issue_at(Some(user_id), center_id, remember, Utc::now().timestamp())
    }

    /// Issue the legacy shared-code token: role only, no identity, no
    /// tenant. Downstream tenant-scoped operations reject such sessions.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Signing`] if the key cannot sign.
    pub fn issue_legacy(&self) -> Result<String, TokenError> {
        self.issue_at(None, None, false, Utc::now().timestamp())
    }

    fn issue_at(
        &self,
        sub: Option<AdminUserId>,
        center_id: Option<CenterId>,
        remember: bool,
        iat: i64,
    ) -> Result<String, TokenError> {
        let ttl_days = if remember {
            REMEMBER_TTL_DAYS
        } else {
            SESSION_TTL_DAYS
        };
        let claims = Claims {
            sub,
            role: ROLE_ADMIN.to_string(),
            center_id,
            iat,
            exp: iat + Duration::days(ttl_days).num_seconds(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| TokenError::Signing)
    }

    /// Verify a token's signature, expiry, and role claim.
    ///
    /// # Errors
    ///
    /// Returns one of the closed [`TokenError`] variants; callers must treat
    /// every variant identically (no session).
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed,
            }
        })?;

        if data.claims.role != ROLE_ADMIN {
            return Err(TokenError::WrongRole);
        }

        Ok(SessionClaims {
            user_id: data.claims.sub,
            center_id: data.claims.center_id,
        })
    }
}
