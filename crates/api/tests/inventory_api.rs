//! Suppliers, materials, stock movements and purchase orders.

mod common;

use axum::http::StatusCode;
use axum::Router;
use chrono::{Datelike, Duration, Utc};
use common::{
    expect_json, get_auth, post_auth, post_json_auth, put_json_auth, register, user_with_role,
};
use serde_json::{json, Value};
use sqlx::PgPool;

async fn supplier(app: &Router, token: &str, lead_time_days: i64) -> i64 {
    let json = expect_json(
        post_json_auth(
            app,
            "/api/v1/inventory/suppliers",
            token,
            json!({ "name": "Loom Co", "email": "orders@loom.test", "lead_time_days": lead_time_days }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    json["data"]["id"].as_i64().unwrap()
}

async fn material(app: &Router, token: &str, body: Value) -> i64 {
    let json = expect_json(
        post_json_auth(app, "/api/v1/inventory/materials", token, body).await,
        StatusCode::CREATED,
    )
    .await;
    json["data"]["id"].as_i64().unwrap()
}

async fn movement(app: &Router, token: &str, material_id: i64, kind: &str, qty: f64) -> Value {
    expect_json(
        post_json_auth(
            app,
            &format!("/api/v1/inventory/materials/{material_id}/movements"),
            token,
            json!({ "movement_type": kind, "quantity": qty }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn usage_raises_alerts_and_drafts_one_reorder(pool: PgPool) {
    let app = common::build_test_app(pool);
    let tenant = register(&app, "stock").await;
    let supplier_id = supplier(&app, &tenant.token, 5).await;

    let bad = post_json_auth(
        &app,
        "/api/v1/inventory/materials",
        &tenant.token,
        json!({ "sku": "X", "name": "X", "category": "VELVET", "unit_of_measure": "YARDS" }),
    )
    .await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    let bad = post_json_auth(
        &app,
        "/api/v1/inventory/materials",
        &tenant.token,
        json!({
            "sku": "X", "name": "X", "category": "FABRIC", "unit_of_measure": "YARDS",
            "reorder_point": 50.0, "max_stock_level": 10.0,
        }),
    )
    .await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

    let fabric = material(
        &app,
        &tenant.token,
        json!({
            "sku": "FAB-001",
            "name": "Cotton jersey",
            "category": "FABRIC",
            "unit_of_measure": "YARDS",
            "current_stock": 50.0,
            "reorder_point": 20.0,
            "unit_cost": 3.0,
            "supplier_id": supplier_id,
            "barcode": "8801",
            "auto_reorder": true,
        }),
    )
    .await;
    let thread = material(
        &app,
        &tenant.token,
        json!({
            "sku": "THR-001",
            "name": "White thread",
            "category": "THREAD",
            "unit_of_measure": "PIECES",
            "reorder_point": 5.0,
        }),
    )
    .await;

    let first = movement(&app, &tenant.token, fabric, "USAGE", 25.0).await;
    assert_eq!(first["data"]["material"]["current_stock"], 25.0);
    assert_eq!(first["data"]["movement"]["quantity"], -25.0);
    assert!(first["data"]["alert"].is_null());
    assert!(first["data"]["auto_purchase_order"].is_null());

    let low = movement(&app, &tenant.token, fabric, "USAGE", 10.0).await;
    assert_eq!(low["data"]["alert"]["alert_type"], "LOW_STOCK");
    assert_eq!(low["data"]["alert"]["severity"], "WARNING");
    let po = &low["data"]["auto_purchase_order"];
    assert_eq!(po["status"], "DRAFT");
    assert_eq!(po["is_auto"], true);
    assert_eq!(po["po_number"], format!("PO-{}-0001", Utc::now().year()));
    assert_eq!(
        po["expected_delivery"],
        (Utc::now().date_naive() + Duration::days(5)).to_string()
    );
    assert_eq!(po["items"][0]["quantity"], 25.0);
    assert_eq!(po["total_amount"], 75.0);

    // The open draft already covers the material.
    let lower = movement(&app, &tenant.token, fabric, "USAGE", 5.0).await;
    assert!(lower["data"]["auto_purchase_order"].is_null());

    let overdraw = post_json_auth(
        &app,
        &format!("/api/v1/inventory/materials/{fabric}/movements"),
        &tenant.token,
        json!({ "movement_type": "USAGE", "quantity": 100.0 }),
    )
    .await;
    assert_eq!(overdraw.status(), StatusCode::UNPROCESSABLE_ENTITY);
    for body in [
        json!({ "movement_type": "THEFT", "quantity": 1.0 }),
        json!({ "movement_type": "ADJUSTMENT", "quantity": 0.0 }),
    ] {
        let resp = post_json_auth(
            &app,
            &format!("/api/v1/inventory/materials/{fabric}/movements"),
            &tenant.token,
            body,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    let waste = movement(&app, &tenant.token, fabric, "WASTE", 2.0).await;
    assert_eq!(waste["data"]["movement"]["balance_after"], 8.0);

    let history = expect_json(
        get_auth(
            &app,
            &format!("/api/v1/inventory/materials/{fabric}/movements"),
            &tenant.token,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(history["data"].as_array().unwrap().len(), 4);
    assert_eq!(history["data"][0]["movement_type"], "WASTE");

    for code in ["8801", "FAB-001"] {
        let found = expect_json(
            get_auth(
                &app,
                &format!("/api/v1/inventory/materials/lookup?code={code}"),
                &tenant.token,
            )
            .await,
            StatusCode::OK,
        )
        .await;
        assert_eq!(found["data"]["id"], fabric);
    }
    let missing = get_auth(&app, "/api/v1/inventory/materials/lookup?code=nope", &tenant.token).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let alerts = expect_json(
        get_auth(&app, "/api/v1/inventory/alerts", &tenant.token).await,
        StatusCode::OK,
    )
    .await;
    let alerts = alerts["data"].as_array().unwrap();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0]["material_id"], thread);
    assert_eq!(alerts[0]["alert_type"], "OUT_OF_STOCK");
    assert_eq!(alerts[1]["material_id"], fabric);

    let summary = expect_json(
        get_auth(&app, "/api/v1/inventory/summary", &tenant.token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(summary["data"]["total_materials"], 2);
    assert_eq!(summary["data"]["low_stock_count"], 1);
    assert_eq!(summary["data"]["out_of_stock_count"], 1);
    assert_eq!(summary["data"]["pending_pos"], 1);
    assert_eq!(summary["data"]["total_value"], 24.0);

    let low_only = expect_json(
        get_auth(&app, "/api/v1/inventory/materials?low_stock=true", &tenant.token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(low_only["data"].as_array().unwrap().len(), 2);

    let costing = expect_json(
        get_auth(&app, "/api/v1/inventory/costing", &tenant.token).await,
        StatusCode::OK,
    )
    .await;
    let row = costing["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["material_id"] == fabric)
        .unwrap()
        .clone();
    assert_eq!(row["usage_last_30_days"], 42.0);
    assert_eq!(row["waste_cost"], 6.0);
    assert_eq!(row["waste_percentage"], 4.76);
    assert_eq!(row["projected_cost_monthly"], 126.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn purchase_orders_follow_their_lifecycle(pool: PgPool) {
    let app = common::build_test_app(pool);
    let tenant = register(&app, "buyer").await;
    let supplier_id = supplier(&app, &tenant.token, 7).await;
    let zipper = material(
        &app,
        &tenant.token,
        json!({
            "sku": "ZIP-20",
            "name": "20cm zipper",
            "category": "TRIM",
            "unit_of_measure": "PIECES",
            "current_stock": 5.0,
            "unit_cost": 2.0,
        }),
    )
    .await;

    let empty = post_json_auth(
        &app,
        "/api/v1/inventory/purchase-orders",
        &tenant.token,
        json!({ "supplier_id": supplier_id, "items": [] }),
    )
    .await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    let po_body = json!({
        "supplier_id": supplier_id,
        "items": [{ "material_id": zipper, "quantity": 40.0, "unit_price": 2.5 }],
    });
    let po = expect_json(
        post_json_auth(&app, "/api/v1/inventory/purchase-orders", &tenant.token, po_body.clone())
            .await,
        StatusCode::CREATED,
    )
    .await;
    let po_id = po["data"]["id"].as_i64().unwrap();
    let item_id = po["data"]["items"][0]["id"].as_i64().unwrap();
    assert_eq!(po["data"]["status"], "DRAFT");
    assert_eq!(po["data"]["total_amount"], 100.0);
    assert_eq!(po["data"]["is_auto"], false);

    let uri = |action: &str| format!("/api/v1/inventory/purchase-orders/{po_id}/{action}");

    // Straight to received or approved skips a step.
    let early = post_json_auth(&app, &uri("receive"), &tenant.token, json!({})).await;
    assert_eq!(early.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let early = post_auth(&app, &uri("approve"), &tenant.token).await;
    assert_eq!(early.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let submitted = expect_json(
        post_auth(&app, &uri("submit"), &tenant.token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(submitted["data"]["status"], "SUBMITTED");

    let staff = user_with_role(&app, &tenant, "clerk@buyer.test", "staff").await;
    let forbidden = post_auth(&app, &uri("approve"), &staff).await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let approved = expect_json(
        post_auth(&app, &uri("approve"), &tenant.token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(approved["data"]["status"], "APPROVED");
    assert_eq!(approved["data"]["approved_by"], tenant.user_id);

    let stray = post_json_auth(
        &app,
        &uri("receive"),
        &tenant.token,
        json!({ "items": [{ "item_id": item_id + 1000, "quantity": 1.0 }] }),
    )
    .await;
    assert_eq!(stray.status(), StatusCode::BAD_REQUEST);

    let received = expect_json(
        post_json_auth(
            &app,
            &uri("receive"),
            &tenant.token,
            json!({ "items": [{ "item_id": item_id, "quantity": 38.0 }] }),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(received["data"]["status"], "RECEIVED");
    assert_eq!(received["data"]["items"][0]["received_qty"], 38.0);

    let restocked = expect_json(
        get_auth(&app, &format!("/api/v1/inventory/materials/{zipper}"), &tenant.token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(restocked["data"]["current_stock"], 43.0);
    assert!(!restocked["data"]["last_restocked"].is_null());

    let history = expect_json(
        get_auth(
            &app,
            &format!("/api/v1/inventory/materials/{zipper}/movements"),
            &tenant.token,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(history["data"][0]["movement_type"], "PURCHASE");
    assert_eq!(history["data"][0]["purchase_order_id"], po_id);

    let again = post_json_auth(&app, &uri("receive"), &tenant.token, json!({})).await;
    assert_eq!(again.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let cancel = post_auth(&app, &uri("cancel"), &tenant.token).await;
    assert_eq!(cancel.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // A cancelled order is closed.
    let second = expect_json(
        post_json_auth(&app, "/api/v1/inventory/purchase-orders", &tenant.token, po_body).await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(
        second["data"]["po_number"],
        format!("PO-{}-0002", Utc::now().year())
    );
    let second_id = second["data"]["id"].as_i64().unwrap();
    let cancelled = expect_json(
        post_auth(
            &app,
            &format!("/api/v1/inventory/purchase-orders/{second_id}/cancel"),
            &tenant.token,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(cancelled["data"]["status"], "CANCELLED");
    let reopen = post_auth(
        &app,
        &format!("/api/v1/inventory/purchase-orders/{second_id}/submit"),
        &tenant.token,
    )
    .await;
    assert_eq!(reopen.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let listed = expect_json(
        get_auth(
            &app,
            "/api/v1/inventory/purchase-orders?status=RECEIVED",
            &tenant.token,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
    let bogus = get_auth(&app, "/api/v1/inventory/purchase-orders?status=LOST", &tenant.token).await;
    assert_eq!(bogus.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn inventory_is_tenant_scoped(pool: PgPool) {
    let app = common::build_test_app(pool);
    let alpha = register(&app, "inv-alpha").await;
    let bravo = register(&app, "inv-bravo").await;
    let alpha_supplier = supplier(&app, &alpha.token, 7).await;
    let bravo_supplier = supplier(&app, &bravo.token, 7).await;
    let fabric = material(
        &app,
        &alpha.token,
        json!({
            "sku": "FAB-9",
            "name": "Twill",
            "category": "FABRIC",
            "unit_of_measure": "METERS",
            "current_stock": 10.0,
        }),
    )
    .await;

    let peek = get_auth(&app, &format!("/api/v1/inventory/materials/{fabric}"), &bravo.token).await;
    assert_eq!(peek.status(), StatusCode::NOT_FOUND);

    let drain = post_json_auth(
        &app,
        &format!("/api/v1/inventory/materials/{fabric}/movements"),
        &bravo.token,
        json!({ "movement_type": "USAGE", "quantity": 1.0 }),
    )
    .await;
    assert_eq!(drain.status(), StatusCode::NOT_FOUND);

    let po = post_json_auth(
        &app,
        "/api/v1/inventory/purchase-orders",
        &bravo.token,
        json!({
            "supplier_id": bravo_supplier,
            "items": [{ "material_id": fabric, "quantity": 1.0, "unit_price": 1.0 }],
        }),
    )
    .await;
    assert_eq!(po.status(), StatusCode::NOT_FOUND);

    let link = put_json_auth(
        &app,
        &format!("/api/v1/inventory/suppliers/{alpha_supplier}"),
        &bravo.token,
        json!({ "rating": 5.0 }),
    )
    .await;
    assert_eq!(link.status(), StatusCode::NOT_FOUND);

    let rating = put_json_auth(
        &app,
        &format!("/api/v1/inventory/suppliers/{alpha_supplier}"),
        &alpha.token,
        json!({ "rating": 6.0 }),
    )
    .await;
    assert_eq!(rating.status(), StatusCode::BAD_REQUEST);

    let duplicate = post_json_auth(
        &app,
        "/api/v1/inventory/materials",
        &alpha.token,
        json!({ "sku": "FAB-9", "name": "Other", "category": "FABRIC", "unit_of_measure": "METERS" }),
    )
    .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let untouched = expect_json(
        get_auth(&app, &format!("/api/v1/inventory/materials/{fabric}"), &alpha.token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(untouched["data"]["current_stock"], 10.0);
}
