//! Tenant isolation scenarios.
//!
//! An admin is confined to their own center; cross-tenant probes read as
//! not-found, never as forbidden, so row existence does not leak.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use centerdesk_core::ReceiptId;
use centerdesk_integration_tests::{TEST_ACCESS_CODE, login, send, session_cookie, spawn_app};
use centerdesk_server::scope::TenantScope;
use centerdesk_server::store::CredentialStore;

#[tokio::test]
async fn test_cross_tenant_read_is_not_found() {
    let app = spawn_app();
    let north = app.store.seed_center("North", "N01");
    let south = app.store.seed_center("South", "S01");
    app.store.seed_admin_user("alice", "p1", Some(north), true, false);
    let south_receipt = app.store.seed_receipt(south, "Lee", "tablet");

    let cookie = login(&app, "alice", "p1").await;

    // Existence must not leak: 404, not 403.
    let (status, _, body) = send(
        &app,
        "GET",
        &format!("/api/receipts/{}", south_receipt.id),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_listing_is_confined_to_own_center() {
    let app = spawn_app();
    let north = app.store.seed_center("North", "N01");
    let south = app.store.seed_center("South", "S01");
    app.store.seed_admin_user("alice", "p1", Some(north), true, false);
    app.store.seed_admin_user("root", "rootpw", None, true, true);
    let north_receipt = app.store.seed_receipt(north, "Kim", "phone");
    app.store.seed_receipt(south, "Lee", "tablet");

    let cookie = login(&app, "alice", "p1").await;
    let (status, _, body) = send(&app, "GET", "/api/receipts", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    let receipts = body["receipts"].as_array().unwrap();
    assert_eq!(receipts.len(), 1);
    assert_eq!(
        receipts[0]["id"].as_str().unwrap(),
        north_receipt.id.to_string()
    );

    // A superadmin is exempt from the tenant filter.
    let root_cookie = login(&app, "root", "rootpw").await;
    let (_, _, body) = send(&app, "GET", "/api/receipts", Some(&root_cookie), None).await;
    assert_eq!(body["receipts"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_cross_tenant_mutation_is_a_miss() {
    let app = spawn_app();
    let north = app.store.seed_center("North", "N01");
    let south = app.store.seed_center("South", "S01");
    app.store.seed_admin_user("alice", "p1", Some(north), true, false);
    let south_receipt = app.store.seed_receipt(south, "Lee", "tablet");

    let cookie = login(&app, "alice", "p1").await;
    let uri = format!("/api/receipts/{}", south_receipt.id);

    let (status, _, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&cookie),
        Some(json!({ "status": "stolen" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(&app, "DELETE", &uri, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The row survived, untouched.
    let survivor = app
        .store
        .receipt_by_id(south_receipt.id, &TenantScope::Unrestricted)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(survivor.status, "received");
}

#[tokio::test]
async fn test_created_receipts_land_in_own_center() {
    let app = spawn_app();
    let north = app.store.seed_center("North", "N01");
    let south = app.store.seed_center("South", "S01");
    app.store.seed_admin_user("alice", "p1", Some(north), true, false);

    let cookie = login(&app, "alice", "p1").await;

    // The client-supplied centerId is ignored for tenant admins.
    let (status, _, body) = send(
        &app,
        "POST",
        "/api/receipts",
        Some(&cookie),
        Some(json!({ "customerName": "Kim", "item": "phone", "centerId": south })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body["receipt"]["centerId"].as_str().unwrap(),
        north.to_string()
    );

    let id: ReceiptId = body["receipt"]["id"].as_str().unwrap().parse().unwrap();
    let stored = app
        .store
        .receipt_by_id(id, &TenantScope::Unrestricted)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.center_id, north);
}

#[tokio::test]
async fn test_legacy_session_cannot_touch_tenant_data() {
    let app = spawn_app();
    let north = app.store.seed_center("North", "N01");
    app.store.seed_receipt(north, "Kim", "phone");

    // Bootstrap via the shared code: a session with no center.
    let (status, headers, _) = send(
        &app,
        "POST",
        "/api/access-code",
        None,
        Some(json!({ "code": TEST_ACCESS_CODE })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let cookie = session_cookie(&headers).unwrap();

    // The session itself is valid...
    let (status, _, body) = send(&app, "GET", "/api/session", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["legacy"], true);

    // ...but unauthorized for every tenant-scoped resource.
    let (status, _, body) = send(&app, "GET", "/api/receipts", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _, _) = send(
        &app,
        "POST",
        "/api/receipts",
        Some(&cookie),
        Some(json!({ "customerName": "Kim", "item": "phone" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_wrong_access_code_is_unauthorized() {
    let app = spawn_app();

    let (status, headers, _) = send(
        &app,
        "POST",
        "/api/access-code",
        None,
        Some(json!({ "code": "guessed-wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&headers).is_none());
}
