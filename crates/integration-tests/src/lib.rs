//! Test harness for driving the full router in-process.
//!
//! Builds the application against the in-memory store and storage, and
//! provides small helpers for JSON requests and session cookies.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use http_body_util::BodyExt;
use secrecy::SecretString;
use tower::ServiceExt;
use url::Url;

use centerdesk_server::app;
use centerdesk_server::config::{DatastoreConfig, ServerConfig, StorageConfig};
use centerdesk_server::state::AppState;
use centerdesk_server::storage::MemoryStorage;
use centerdesk_server::store::MemoryStore;

/// The shared code configured for the legacy bootstrap flow in tests.
pub const TEST_ACCESS_CODE: &str = "e2e-bootstrap-code";

/// A fully wired application over in-memory backends.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub storage: Arc<MemoryStorage>,
    pub state: AppState,
}

/// Configuration fixture; the signing secret is a test key injected the
/// same way production injects its own.
#[must_use]
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        session_secret: SecretString::from("kJ8#mP2$vN5^qR9!wX3@zL6&yB4*tD7%"),
        access_code: Some(SecretString::from(TEST_ACCESS_CODE)),
        upstream_timeout: Duration::from_secs(2),
        datastore: DatastoreConfig {
            base_url: Url::parse("http://datastore.invalid").unwrap(),
            service_key: SecretString::from("unused-in-tests"),
        },
        storage: StorageConfig {
            base_url: Url::parse("http://storage.invalid").unwrap(),
            service_key: SecretString::from("unused-in-tests"),
        },
        sentry_dsn: None,
    }
}

/// Build the application over fresh in-memory backends.
#[must_use]
pub fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let storage = Arc::new(MemoryStorage::new());
    let state = AppState::from_parts(test_config(), store.clone(), storage.clone());
    TestApp {
        router: app(state.clone()),
        store,
        storage,
        state,
    }
}

/// Send a request and collect `(status, headers, json_body)`.
///
/// Always sets `x-forwarded-for` so the rate limiter can key the request,
/// exactly as the production reverse proxy would.
pub async fn send(
    app: &TestApp,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, HeaderMap, serde_json::Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", "203.0.113.10");

    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, headers, json)
}

/// Extract the `admin_session` cookie pair from a `Set-Cookie` header, for
/// replay on subsequent requests.
#[must_use]
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(str::to_string)
}

/// Login and return the session cookie pair.
pub async fn login(app: &TestApp, username: &str, password: &str) -> String {
    let (status, headers, _) = send(
        app,
        "POST",
        "/api/login",
        None,
        Some(serde_json::json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login should succeed");
    session_cookie(&headers).expect("login sets the session cookie")
}
