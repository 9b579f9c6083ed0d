//! Invoicing and payments.

mod common;

use axum::http::StatusCode;
use common::{
    client_and_brand, expect_json, get_auth, order, post_auth, post_json_auth, register, Tenant,
};
use serde_json::{json, Value};
use sqlx::PgPool;

async fn invoiced_order(app: &axum::Router, tenant: &Tenant) -> Value {
    let (client_id, brand_id) = client_and_brand(app, &tenant.token).await;
    let created = order(app, &tenant.token, client_id, brand_id).await;
    let json = expect_json(
        post_json_auth(
            app,
            "/api/v1/finance/invoices",
            &tenant.token,
            json!({ "order_id": created["id"], "issue_date": "2026-03-01" }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    json["data"].clone()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invoice_defaults_to_order_total_with_vat(pool: PgPool) {
    let app = common::build_test_app(pool);
    let tenant = register(&app, "invoice").await;
    let invoice = invoiced_order(&app, &tenant).await;

    assert_eq!(invoice["invoice_number"], "INV-000001");
    assert_eq!(invoice["subtotal"], 25000.0);
    assert_eq!(invoice["tax_rate"], 0.12);
    assert_eq!(invoice["tax_amount"], 3000.0);
    assert_eq!(invoice["total_amount"], 28000.0);
    assert_eq!(invoice["status"], "pending");
    assert_eq!(invoice["due_date"], "2026-03-31");

    // One invoice per order.
    let response = post_json_auth(
        &app,
        "/api/v1/finance/invoices",
        &tenant.token,
        json!({ "order_id": invoice["order_id"] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn explicit_lines_override_the_order_total(pool: PgPool) {
    let app = common::build_test_app(pool);
    let tenant = register(&app, "lines").await;
    let (client_id, brand_id) = client_and_brand(&app, &tenant.token).await;
    let created = order(&app, &tenant.token, client_id, brand_id).await;

    let invoice = expect_json(
        post_json_auth(
            &app,
            "/api/v1/finance/invoices",
            &tenant.token,
            json!({
                "order_id": created["id"],
                "tax_rate": 0.0,
                "line_items": [
                    { "description": "Deposit", "quantity": 1.0, "unit_price": 5000.0 },
                    { "description": "Setup", "quantity": 2.0, "unit_price": 750.0 }
                ]
            }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(invoice["data"]["total_amount"], 6500.0);

    let detail = expect_json(
        get_auth(
            &app,
            &format!("/api/v1/finance/invoices/{}", invoice["data"]["id"]),
            &tenant.token,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(detail["data"]["line_items"].as_array().unwrap().len(), 2);
    assert_eq!(detail["data"]["balance"], 6500.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn payments_move_the_invoice_to_paid(pool: PgPool) {
    let app = common::build_test_app(pool);
    let tenant = register(&app, "payments").await;
    let invoice = invoiced_order(&app, &tenant).await;
    let invoice_id = invoice["id"].as_i64().unwrap();

    let partial = expect_json(
        post_json_auth(
            &app,
            "/api/v1/finance/payments",
            &tenant.token,
            json!({ "invoice_id": invoice_id, "amount": 10000.0, "method": "gcash" }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(partial["data"]["invoice"]["status"], "partial");
    assert_eq!(partial["data"]["balance"], 18000.0);

    // Overpaying is refused.
    let response = post_json_auth(
        &app,
        "/api/v1/finance/payments",
        &tenant.token,
        json!({ "invoice_id": invoice_id, "amount": 20000.0, "method": "cash" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let paid = expect_json(
        post_json_auth(
            &app,
            "/api/v1/finance/payments",
            &tenant.token,
            json!({ "invoice_id": invoice_id, "amount": 18000.0, "method": "bank_transfer" }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(paid["data"]["invoice"]["status"], "paid");
    assert_eq!(paid["data"]["balance"], 0.0);
    assert!(paid["data"]["invoice"]["paid_at"].is_string());

    // Paid invoices cannot be cancelled.
    let response = post_auth(
        &app,
        &format!("/api/v1/finance/invoices/{invoice_id}/cancel"),
        &tenant.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let summary = expect_json(
        get_auth(&app, "/api/v1/finance/summary?period=month", &tenant.token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(summary["data"]["period"], "month");
    assert_eq!(summary["data"]["revenue"], 28000.0);
    assert_eq!(summary["data"]["recent_payments"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn payment_validation(pool: PgPool) {
    let app = common::build_test_app(pool);
    let tenant = register(&app, "payval").await;
    let invoice = invoiced_order(&app, &tenant).await;

    let response = post_json_auth(
        &app,
        "/api/v1/finance/payments",
        &tenant.token,
        json!({ "invoice_id": invoice["id"], "amount": 100.0, "method": "barter" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        &app,
        "/api/v1/finance/payments",
        &tenant.token,
        json!({ "invoice_id": invoice["id"], "amount": 0.0, "method": "cash" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        &app,
        "/api/v1/finance/payments",
        &tenant.token,
        json!({ "invoice_id": 999_999, "amount": 100.0, "method": "cash" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cancelled_invoices_reject_payments(pool: PgPool) {
    let app = common::build_test_app(pool);
    let tenant = register(&app, "cancel").await;
    let invoice = invoiced_order(&app, &tenant).await;
    let invoice_id = invoice["id"].as_i64().unwrap();

    let cancelled = expect_json(
        post_auth(
            &app,
            &format!("/api/v1/finance/invoices/{invoice_id}/cancel"),
            &tenant.token,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(cancelled["data"]["status"], "cancelled");

    let response = post_json_auth(
        &app,
        "/api/v1/finance/payments",
        &tenant.token,
        json!({ "invoice_id": invoice_id, "amount": 100.0, "method": "cash" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let list = expect_json(
        get_auth(&app, "/api/v1/finance/invoices?status=cancelled", &tenant.token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(list["pagination"]["total"], 1);

    let response = get_auth(&app, "/api/v1/finance/invoices?status=lost", &tenant.token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
