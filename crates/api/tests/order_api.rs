//! Clients, orders, routing and the audit trail they leave behind.

mod common;

use axum::http::StatusCode;
use chrono::{Datelike, Utc};
use common::{
    client_and_brand, delete_auth, expect_json, get_auth, order, post_auth, post_json_auth,
    put_json_auth, register,
};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn order_numbers_use_the_brand_code(pool: PgPool) {
    let app = common::build_test_app(pool);
    let tenant = register(&app, "numbers").await;
    let (client_id, brand_id) = client_and_brand(&app, &tenant.token).await;

    let first = order(&app, &tenant.token, client_id, brand_id).await;
    let second = order(&app, &tenant.token, client_id, brand_id).await;

    let year = Utc::now().year();
    assert_eq!(first["order_number"], format!("ACM-{year}-000001"));
    assert_eq!(second["order_number"], format!("ACM-{year}-000002"));
    assert_eq!(first["status"], "draft");
    assert_eq!(first["total_amount"], 25000.0);
    assert_eq!(first["currency"], "PHP");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn order_validation_errors_are_400(pool: PgPool) {
    let app = common::build_test_app(pool);
    let tenant = register(&app, "invalid").await;
    let (client_id, brand_id) = client_and_brand(&app, &tenant.token).await;

    let no_lines = json!({ "client_id": client_id, "brand_id": brand_id, "line_items": [] });
    let json = expect_json(
        post_json_auth(&app, "/api/v1/orders", &tenant.token, no_lines).await,
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert!(json["error"].as_str().unwrap().contains("line_items"));

    let bad_method = json!({
        "client_id": client_id,
        "brand_id": brand_id,
        "line_items": [{
            "description": "x", "product_type": "tee", "printing_method": "airbrush",
            "quantity": 1, "unit_price": 1.0
        }]
    });
    let response = post_json_auth(&app, "/api/v1/orders", &tenant.token, bad_method).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn order_detail_and_update(pool: PgPool) {
    let app = common::build_test_app(pool);
    let tenant = register(&app, "detail").await;
    let (client_id, brand_id) = client_and_brand(&app, &tenant.token).await;
    let created = order(&app, &tenant.token, client_id, brand_id).await;
    let uri = format!("/api/v1/orders/{}", created["id"]);

    let detail = expect_json(get_auth(&app, &uri, &tenant.token).await, StatusCode::OK).await;
    assert_eq!(detail["data"]["line_items"].as_array().unwrap().len(), 1);
    assert_eq!(detail["data"]["client"]["id"], client_id);

    let updated = expect_json(
        put_json_auth(&app, &uri, &tenant.token, json!({ "status": "intake", "notes": "rush" })).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(updated["data"]["status"], "intake");
    assert_eq!(updated["data"]["notes"], "rush");

    let response = put_json_auth(&app, &uri, &tenant.token, json!({ "status": "shipped" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn routing_is_generated_once(pool: PgPool) {
    let app = common::build_test_app(pool);
    let tenant = register(&app, "routing").await;
    let (client_id, brand_id) = client_and_brand(&app, &tenant.token).await;
    let created = order(&app, &tenant.token, client_id, brand_id).await;
    let uri = format!("/api/v1/orders/{}/routing", created["id"]);

    let steps = expect_json(post_auth(&app, &uri, &tenant.token).await, StatusCode::CREATED).await;
    let names: Vec<&str> = steps["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        [
            "Order Processing",
            "Cutting",
            "Silkscreen Printing",
            "Sewing",
            "Quality Control",
            "Finishing & Packing"
        ]
    );

    let response = post_auth(&app, &uri, &tenant.token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let listed = expect_json(get_auth(&app, &uri, &tenant.token).await, StatusCode::OK).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 6);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn client_with_open_orders_cannot_be_deleted(pool: PgPool) {
    let app = common::build_test_app(pool);
    let tenant = register(&app, "blocked").await;
    let (client_id, brand_id) = client_and_brand(&app, &tenant.token).await;
    order(&app, &tenant.token, client_id, brand_id).await;

    let json = expect_json(
        delete_auth(&app, &format!("/api/v1/clients/{client_id}"), &tenant.token).await,
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert!(json["error"].as_str().unwrap().contains("active order"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn mutations_are_audited(pool: PgPool) {
    let app = common::build_test_app(pool);
    let tenant = register(&app, "audited").await;
    let (client_id, brand_id) = client_and_brand(&app, &tenant.token).await;
    let created = order(&app, &tenant.token, client_id, brand_id).await;

    let logs = expect_json(
        get_auth(&app, "/api/v1/audit-logs?resource=order", &tenant.token).await,
        StatusCode::OK,
    )
    .await;
    let entries = logs["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "create");
    assert_eq!(entries[0]["resource_id"], created["id"]);
    assert_eq!(entries[0]["user_id"], tenant.user_id);
    assert_eq!(entries[0]["new_values"]["order_number"], created["order_number"]);

    let response = get_auth(&app, "/api/v1/audit-logs?action=explode", &tenant.token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
