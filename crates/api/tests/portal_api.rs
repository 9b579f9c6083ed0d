//! Design upload, client approval through the portal, and locking.

mod common;

use axum::http::StatusCode;
use common::{
    client_and_brand, expect_json, get, get_auth, order, post_auth, post_json, post_json_auth,
    put_json_auth, register, Tenant,
};
use serde_json::{json, Value};
use sqlx::PgPool;

/// Upload a design for a fresh order in `intake` and send version 1 to the
/// client. Returns `(design_id, client_id, order_id, portal_token)`.
async fn sent_design(app: &axum::Router, tenant: &Tenant) -> (i64, i64, i64, String) {
    let (client_id, brand_id) = client_and_brand(app, &tenant.token).await;
    let created = order(app, &tenant.token, client_id, brand_id).await;
    let order_id = created["id"].as_i64().unwrap();
    expect_json(
        put_json_auth(
            app,
            &format!("/api/v1/orders/{order_id}"),
            &tenant.token,
            json!({ "status": "intake" }),
        )
        .await,
        StatusCode::OK,
    )
    .await;

    let upload = expect_json(
        post_json_auth(
            app,
            "/api/v1/designs",
            &tenant.token,
            json!({
                "order_id": order_id,
                "name": "Front chest logo",
                "method": "silkscreen",
                "files": { "mockup": "https://cdn.test/front.png" },
                "palette": ["#000000", "#ffffff"],
            }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(upload["data"]["version"]["version"], 1);
    let design_id = upload["data"]["asset"]["id"].as_i64().unwrap();

    let sent = expect_json(
        post_json_auth(
            app,
            &format!("/api/v1/designs/{design_id}/send-approval"),
            &tenant.token,
            json!({ "version": 1, "client_id": client_id }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(sent["data"]["status"], "SENT");
    let token = sent["data"]["portal_token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 64);

    (design_id, client_id, order_id, token)
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn client_approves_and_design_can_be_locked(pool: PgPool) {
    let app = common::build_test_app(pool);
    let tenant = register(&app, "portal").await;
    let (design_id, _, order_id, token) = sent_design(&app, &tenant).await;

    // Locking before approval is refused.
    let response = post_auth(&app, &format!("/api/v1/designs/{design_id}/lock"), &tenant.token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let view = expect_json(get(&app, &format!("/api/v1/portal/approval/{token}")).await, StatusCode::OK).await;
    assert_eq!(view["data"]["design"]["name"], "Front chest logo");
    assert_eq!(view["data"]["version"]["version"], 1);
    assert!(view["data"]["approval"].get("portal_token").is_none());

    let approved = expect_json(
        post_json(
            &app,
            &format!("/api/v1/portal/approval/{token}/approve"),
            json!({ "approver_name": "Coach Reyes", "comments": "Looks great" }),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(approved["data"]["status"], "APPROVED");
    assert_eq!(approved["data"]["approver_name"], "Coach Reyes");

    // The order moves into design approval.
    let detail = expect_json(
        get_auth(&app, &format!("/api/v1/orders/{order_id}"), &tenant.token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(detail["data"]["status"], "design_approval");

    // An answered token is dead.
    let response = get(&app, &format!("/api/v1/portal/approval/{token}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let locked = expect_json(
        post_auth(&app, &format!("/api/v1/designs/{design_id}/lock"), &tenant.token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(locked["data"]["status"], "LOCKED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn change_requests_need_comments(pool: PgPool) {
    let app = common::build_test_app(pool);
    let tenant = register(&app, "changes").await;
    let (design_id, _, _, token) = sent_design(&app, &tenant).await;
    let uri = format!("/api/v1/portal/approval/{token}/request-changes");

    let response = post_json(&app, &uri, json!({ "comments": "  " })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let changed = expect_json(
        post_json(&app, &uri, json!({ "comments": "Make the logo bigger" })).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(changed["data"]["status"], "CHANGES_REQUESTED");

    let detail = expect_json(
        get_auth(&app, &format!("/api/v1/designs/{design_id}"), &tenant.token).await,
        StatusCode::OK,
    )
    .await;
    let approvals: &Vec<Value> = detail["data"]["approvals"].as_array().unwrap();
    assert_eq!(approvals.len(), 1);
    assert_eq!(approvals[0]["comments"], "Make the logo bigger");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn portal_orders_are_token_scoped(pool: PgPool) {
    let app = common::build_test_app(pool);
    let tenant = register(&app, "scoped").await;
    let (_, client_id, order_id, token) = sent_design(&app, &tenant).await;

    let orders = expect_json(
        get(&app, &format!("/api/v1/portal/clients/{client_id}/orders?token={token}")).await,
        StatusCode::OK,
    )
    .await;
    let listed = orders["data"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], order_id);

    let other_client = client_id + 1000;
    let response = get(
        &app,
        &format!("/api/v1/portal/clients/{other_client}/orders?token={token}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(
        &app,
        &format!("/api/v1/portal/clients/{client_id}/orders?token=deadbeef"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn approval_must_target_the_order_client(pool: PgPool) {
    let app = common::build_test_app(pool);
    let tenant = register(&app, "mismatch").await;
    let (design_id, client_id, _, _) = sent_design(&app, &tenant).await;

    let response = post_json_auth(
        &app,
        &format!("/api/v1/designs/{design_id}/send-approval"),
        &tenant.token,
        json!({ "version": 1, "client_id": client_id + 1000 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        &app,
        &format!("/api/v1/designs/{design_id}/send-approval"),
        &tenant.token,
        json!({ "version": 9, "client_id": client_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn only_the_token_hash_is_stored(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let tenant = register(&app, "hashed").await;
    let (_, _, _, token) = sent_design(&app, &tenant).await;

    let stored: String = sqlx::query_scalar("SELECT token_hash FROM design_approvals")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_ne!(stored, token);

    // A leaked row is not a usable credential.
    let response = get(&app, &format!("/api/v1/portal/approval/{stored}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = get(&app, &format!("/api/v1/portal/approval/{token}")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_answers_settle_once(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let tenant = register(&app, "race").await;
    let (design_id, _, _, token) = sent_design(&app, &tenant).await;

    let approve_uri = format!("/api/v1/portal/approval/{token}/approve");
    let changes_uri = format!("/api/v1/portal/approval/{token}/request-changes");
    let (approved, changed) = tokio::join!(
        post_json(&app, &approve_uri, json!({ "approver_name": "Coach Reyes" })),
        post_json(&app, &changes_uri, json!({ "comments": "Swap the colours" })),
    );
    let mut statuses = [approved.status(), changed.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::NOT_FOUND]);

    let answered: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM design_approvals WHERE status <> 'SENT' AND responded_at IS NOT NULL",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(answered, 1);

    let detail = expect_json(
        get_auth(&app, &format!("/api/v1/designs/{design_id}"), &tenant.token).await,
        StatusCode::OK,
    )
    .await;
    let approval_status = detail["data"]["approvals"][0]["status"].as_str().unwrap();
    let expected_asset = if approval_status == "APPROVED" { "APPROVED" } else { "DRAFT" };
    assert_eq!(detail["data"]["status"], expected_asset);
}
