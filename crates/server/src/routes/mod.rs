//! Route handlers.
//!
//! Thin JSON plumbing over the access-control core: every protected handler
//! names a guard extractor, derives its tenant scope from the principal,
//! and echoes the request's correlation id in the payload.

pub mod assets;
pub mod auth;
pub mod centers;
pub mod receipts;
pub mod requests;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Assemble the API router.
#[must_use]
pub fn router() -> Router<AppState> {
    // Credential-accepting endpoints get the strict limiter.
    let limited = Router::new()
        .route("/api/login", post(auth::login))
        .route("/api/access-code", post(auth::access_code))
        .layer(auth_rate_limiter());

    Router::new()
        .merge(limited)
        .route("/api/logout", post(auth::logout))
        .route("/api/session", get(auth::session))
        .route(
            "/api/account-requests",
            post(requests::submit).get(requests::list),
        )
        .route("/api/account-requests/{id}/decision", post(requests::decide))
        .route("/api/centers", get(centers::list))
        .route("/api/assets/signed-url", get(assets::signed_url))
        .route("/api/receipts", get(receipts::list).post(receipts::create))
        .route(
            "/api/receipts/{id}",
            get(receipts::show)
                .put(receipts::update)
                .delete(receipts::remove),
        )
}
