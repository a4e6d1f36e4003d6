//! Login service.
//!
//! Verifies credentials against the remote store and issues session tokens.
//! Unknown usernames, wrong passwords, and deactivated credentials all
//! collapse into [`AuthError::InvalidCredentials`] so a caller learns
//! nothing about which part failed.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use centerdesk_core::Username;

use crate::models::AdminUser;
use crate::store::{CredentialStore, StoreError};

use super::{TokenError, TokenService};

/// Authentication failures.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username, wrong password, or deactivated credential.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password could not be hashed.
    #[error("password hashing failed")]
    PasswordHash,

    /// The credential store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Token issuance failed.
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl From<AuthError> for crate::error::ErrorKind {
    fn from(err: AuthError) -> Self {
        match err {
            // Unknown user, bad password, bad code: one indistinguishable 401.
            AuthError::InvalidCredentials => Self::Unauthenticated,
            AuthError::PasswordHash => Self::Internal("password hashing failed".to_string()),
            AuthError::Token(_) => Self::Internal("token signing failed".to_string()),
            AuthError::Store(e) => Self::Store(e),
        }
    }
}

/// Authentication service.
///
/// Borrowed per request; holds no state of its own.
pub struct AuthService<'a> {
    store: &'a dyn CredentialStore,
    tokens: &'a TokenService,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn CredentialStore, tokens: &'a TokenService) -> Self {
        Self { store, tokens }
    }

    /// Login with username and password.
    ///
    /// Returns the credential row and a signed session token bound to the
    /// credential's center.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if the username is unknown,
    /// the password is wrong, or the credential is deactivated.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        remember: bool,
    ) -> Result<(AdminUser, String), AuthError> {
        let username =
            Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .store
            .admin_user_by_username(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        verify_password(password, &user.password_hash)?;

        let token = self.tokens.issue(user.id, user.center_id, remember)?;
        Ok((user, token))
    }

    /// Legacy bootstrap login with the configured shared code.
    ///
    /// The issued token carries no identity and no tenant; tenant-scoped
    /// operations reject it downstream.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if the flow is disabled or
    /// the code does not match.
    pub fn login_with_code(
        &self,
        code: &str,
        configured: Option<&SecretString>,
    ) -> Result<String, AuthError> {
        let configured = configured.ok_or(AuthError::InvalidCredentials)?;
        if !constant_time_eq(code.as_bytes(), configured.expose_secret().as_bytes()) {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(self.tokens.issue_legacy()?)
    }
}

/// Hash a password using Argon2id.
///
/// Used at submission time by the account request workflow and at bootstrap
/// by the CLI; plaintext never reaches the store.
///
/// # Errors
///
/// Returns [`AuthError::PasswordHash`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
///
/// # Errors
///
/// Returns [`AuthError::InvalidCredentials`] if the hash is unreadable or
/// the password does not match.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Compare two byte strings without short-circuiting on the first mismatch.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn tokens() -> TokenService {
        TokenService::new(&SecretString::from("kJ8#mP2$vN5^qR9!wX3@zL6&yB4*tD7%"))
    }

    #[test]
    fn test_hash_verify_roundtrip() {
        let hash = hash_password("p4ssw0rd").unwrap();
        assert!(verify_password("p4ssw0rd", &hash).is_ok());
        assert!(verify_password("wrong", &hash).is_err());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("p4ssw0rd").unwrap();
        let b = hash_password("p4ssw0rd").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"code", b"code"));
        assert!(!constant_time_eq(b"code", b"c0de"));
        assert!(!constant_time_eq(b"code", b"codes"));
        assert!(constant_time_eq(b"", b""));
    }

    #[tokio::test]
    async fn test_login_success_binds_center() {
        let store = MemoryStore::new();
        let center_id = store.seed_center("North", "N01");
        let user = store.seed_admin_user("alice", "p1", Some(center_id), true, false);
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);

        let (logged_in, token) = auth.login("alice", "p1", false).await.unwrap();
        assert_eq!(logged_in.id, user.id);

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.user_id, Some(user.id));
        assert_eq!(claims.center_id, Some(center_id));
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let store = MemoryStore::new();
        let center_id = store.seed_center("North", "N01");
        store.seed_admin_user("alice", "p1", Some(center_id), true, false);
        store.seed_admin_user("bob", "p2", Some(center_id), false, false);
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);

        // Unknown user, wrong password, deactivated user: same error.
        for (username, password) in [("carol", "p1"), ("alice", "wrong"), ("bob", "p2")] {
            let err = auth.login(username, password, false).await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
        }
    }

    #[tokio::test]
    async fn test_code_login() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);
        let code = SecretString::from("bootstrap-code");

        let token = auth.login_with_code("bootstrap-code", Some(&code)).unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.user_id, None);

        assert!(auth.login_with_code("wrong", Some(&code)).is_err());
        assert!(auth.login_with_code("bootstrap-code", None).is_err());
    }
}
