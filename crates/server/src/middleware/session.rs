//! Session cookie construction.
//!
//! The session is stateless: the cookie value is the signed token itself,
//! there is no server-side session table. Logout overwrites the cookie with
//! an empty, immediately-expired value.

use axum_extra::extract::cookie::{Cookie, SameSite};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "admin_session";

/// Standard cookie lifetime in days; matches the token expiry.
const SESSION_COOKIE_DAYS: i64 = 7;

/// Extended cookie lifetime for "remember me" sessions.
const REMEMBER_COOKIE_DAYS: i64 = 30;

/// Build the session cookie carrying a signed token.
///
/// HTTP-only, `SameSite=Lax`, path `/`; `Secure` when the public base URL
/// is served over HTTPS.
#[must_use]
pub fn session_cookie(token: String, remember: bool, secure: bool) -> Cookie<'static> {
    let days = if remember {
        REMEMBER_COOKIE_DAYS
    } else {
        SESSION_COOKIE_DAYS
    };

    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, token);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie.set_path("/");
    cookie.set_max_age(time::Duration::days(days));
    cookie
}

/// Build the logout cookie: empty value, expired in the past, so the client
/// drops the session immediately.
#[must_use]
pub fn expired_session_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, "");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie.set_path("/");
    cookie.set_max_age(time::Duration::ZERO);
    cookie.set_expires(time::OffsetDateTime::UNIX_EPOCH);
    cookie
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("token-value".to_string(), false, true);

        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.value(), "token-value");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(7)));
    }

    #[test]
    fn test_remember_extends_cookie() {
        let cookie = session_cookie("token-value".to_string(), true, false);
        assert_eq!(cookie.max_age(), Some(time::Duration::days(30)));
        assert_eq!(cookie.secure(), Some(false));
    }

    #[test]
    fn test_expired_cookie_clears_session() {
        let cookie = expired_session_cookie(true);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }
}
