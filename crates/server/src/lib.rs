//! CenterDesk server library.
//!
//! Multi-tenant shop-management backend: staff register service receipts,
//! inquiries, and tickets scoped to a physical center; administrators
//! review and edit them. The core of the crate is the access control and
//! tenant isolation layer; the HTTP surface is thin JSON plumbing on top.
//!
//! # Modules
//!
//! - [`auth`] - Session token service and login service
//! - [`middleware`] - Guards, session cookie, correlation ids, rate limits
//! - [`scope`] - The tenant scoping rule
//! - [`store`] - Credential store adapter (remote row API)
//! - [`storage`] - Signed-asset access proxy
//! - [`workflow`] - Account request approval state machine

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod scope;
pub mod state;
pub mod storage;
pub mod store;
pub mod workflow;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Assemble the full application: API routes, health endpoints, and the
/// middleware stack.
#[must_use]
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::router())
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies datastore connectivity before returning OK.
/// Returns 503 Service Unavailable if the row API is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().list_centers().await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
