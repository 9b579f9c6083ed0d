//! Assets, preventive schedules and work orders.

mod common;

use axum::http::StatusCode;
use chrono::{Datelike, Duration, Months, Utc};
use common::{delete_auth, expect_json, get_auth, post_json_auth, put_json_auth, register};
use serde_json::json;
use sqlx::PgPool;

async fn asset(app: &axum::Router, token: &str) -> i64 {
    let json = expect_json(
        post_json_auth(
            app,
            "/api/v1/maintenance/assets",
            token,
            json!({ "asset_number": "PR-01", "name": "6-colour press", "asset_type": "printer" }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(json["data"]["status"], "ACTIVE");
    json["data"]["id"].as_i64().unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn schedules_default_their_due_date(pool: PgPool) {
    let app = common::build_test_app(pool);
    let tenant = register(&app, "sched").await;
    let asset_id = asset(&app, &tenant.token).await;
    let today = Utc::now().date_naive();

    let monthly = expect_json(
        post_json_auth(
            &app,
            "/api/v1/maintenance/schedules",
            &tenant.token,
            json!({
                "asset_id": asset_id,
                "name": "Screen tension check",
                "maintenance_type": "PREVENTIVE",
                "frequency_type": "MONTHLY",
            }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let expected = today.checked_add_months(Months::new(1)).unwrap();
    assert_eq!(monthly["data"]["next_due_date"], expected.to_string());
    assert_eq!(monthly["data"]["priority"], "MEDIUM");
    assert_eq!(monthly["data"]["due_status"], "SCHEDULED");

    let soon = today + Duration::days(3);
    expect_json(
        post_json_auth(
            &app,
            "/api/v1/maintenance/schedules",
            &tenant.token,
            json!({
                "asset_id": asset_id,
                "name": "Lubricate platens",
                "maintenance_type": "PREVENTIVE",
                "frequency_type": "WEEKLY",
                "frequency_value": 2,
                "next_due_date": soon,
            }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;

    let list = expect_json(
        get_auth(
            &app,
            &format!("/api/v1/maintenance/schedules?asset_id={asset_id}"),
            &tenant.token,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    let statuses: Vec<&str> = list["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["due_status"].as_str().unwrap())
        .collect();
    assert!(statuses.contains(&"DUE_SOON"));
    assert!(statuses.contains(&"SCHEDULED"));

    let response = post_json_auth(
        &app,
        "/api/v1/maintenance/schedules",
        &tenant.token,
        json!({
            "asset_id": asset_id,
            "name": "Bad",
            "maintenance_type": "PREVENTIVE",
            "frequency_type": "HOURLY",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn completing_a_work_order_advances_its_schedule(pool: PgPool) {
    let app = common::build_test_app(pool);
    let tenant = register(&app, "workorders").await;
    let asset_id = asset(&app, &tenant.token).await;
    let today = Utc::now().date_naive();

    let schedule = expect_json(
        post_json_auth(
            &app,
            "/api/v1/maintenance/schedules",
            &tenant.token,
            json!({
                "asset_id": asset_id,
                "name": "Quarterly service",
                "maintenance_type": "INSPECTION",
                "frequency_type": "QUARTERLY",
                "priority": "HIGH",
                "next_due_date": today,
            }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let schedule_id = schedule["data"]["id"].as_i64().unwrap();

    let wo = expect_json(
        post_json_auth(
            &app,
            "/api/v1/maintenance/work-orders",
            &tenant.token,
            json!({ "schedule_id": schedule_id }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(wo["data"]["wo_number"], format!("WO-{}-0001", today.year()));
    assert_eq!(wo["data"]["title"], "Quarterly service");
    assert_eq!(wo["data"]["priority"], "HIGH");
    assert_eq!(wo["data"]["asset_id"], asset_id);
    assert_eq!(wo["data"]["status"], "OPEN");
    let wo_uri = format!("/api/v1/maintenance/work-orders/{}/status", wo["data"]["id"]);

    // Open work orders block deleting the schedule.
    let json = expect_json(
        delete_auth(
            &app,
            &format!("/api/v1/maintenance/schedules/{schedule_id}"),
            &tenant.token,
        )
        .await,
        StatusCode::CONFLICT,
    )
    .await;
    assert_eq!(json["code"], "CONFLICT");

    expect_json(
        put_json_auth(&app, &wo_uri, &tenant.token, json!({ "status": "IN_PROGRESS" })).await,
        StatusCode::OK,
    )
    .await;
    let done = expect_json(
        put_json_auth(
            &app,
            &wo_uri,
            &tenant.token,
            json!({ "status": "COMPLETED", "completion_notes": "Replaced belts" }),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(done["data"]["work_order"]["status"], "COMPLETED");
    assert_eq!(done["data"]["work_order"]["completion_notes"], "Replaced belts");
    let expected = today.checked_add_months(Months::new(3)).unwrap();
    assert_eq!(done["data"]["schedule"]["last_completed_date"], today.to_string());
    assert_eq!(done["data"]["schedule"]["next_due_date"], expected.to_string());

    // Completed work orders are final.
    let response = put_json_auth(&app, &wo_uri, &tenant.token, json!({ "status": "OPEN" })).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = delete_auth(
        &app,
        &format!("/api/v1/maintenance/schedules/{schedule_id}"),
        &tenant.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn work_orders_need_an_asset(pool: PgPool) {
    let app = common::build_test_app(pool);
    let tenant = register(&app, "noasset").await;

    let response = post_json_auth(
        &app,
        "/api/v1/maintenance/work-orders",
        &tenant.token,
        json!({ "title": "Fix it" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        &app,
        "/api/v1/maintenance/work-orders",
        &tenant.token,
        json!({ "asset_id": 424_242, "title": "Fix it" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn asset_status_updates_are_validated(pool: PgPool) {
    let app = common::build_test_app(pool);
    let tenant = register(&app, "assetupd").await;
    let asset_id = asset(&app, &tenant.token).await;
    let uri = format!("/api/v1/maintenance/assets/{asset_id}");

    let updated = expect_json(
        put_json_auth(&app, &uri, &tenant.token, json!({ "status": "MAINTENANCE" })).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(updated["data"]["status"], "MAINTENANCE");

    let response = put_json_auth(&app, &uri, &tenant.token, json!({ "status": "BROKEN" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let list = expect_json(
        get_auth(&app, "/api/v1/maintenance/assets?status=MAINTENANCE", &tenant.token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
}
