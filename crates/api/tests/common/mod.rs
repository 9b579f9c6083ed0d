#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

use ashley_api::auth::jwt::JwtConfig;
use ashley_api::config::ServerConfig;
use ashley_api::router::build_app_router;
use ashley_api::state::AppState;
use ashley_events::EventBus;

pub const PASSWORD: &str = "correct-horse-battery";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3001".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "integration-test-secret-at-least-32-bytes".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let state = AppState {
        pool,
        config: Arc::new(test_config()),
        event_bus: Arc::new(EventBus::new(64)),
    };
    build_app_router(state).expect("test router should build")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    app.clone()
        .oneshot(builder.body(body).expect("request should build"))
        .await
        .expect("router is infallible")
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(app: &Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn post_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn put_json_auth(app: &Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
}

/// Assert the status and return the JSON body.
pub async fn expect_json(response: Response<Body>, status: StatusCode) -> Value {
    let actual = response.status();
    let json = body_json(response).await;
    assert_eq!(actual, status, "unexpected status, body: {json}");
    json
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A registered workspace and its admin's access token.
pub struct Tenant {
    pub token: String,
    pub workspace_id: i64,
    pub user_id: i64,
}

pub async fn register(app: &Router, slug: &str) -> Tenant {
    let body = json!({
        "workspace_name": format!("{slug} apparel"),
        "workspace_slug": slug,
        "email": format!("owner@{slug}.test"),
        "password": PASSWORD,
        "first_name": "Owner",
        "last_name": slug,
    });
    let json = expect_json(post_json(app, "/api/v1/auth/register", body).await, StatusCode::CREATED).await;
    Tenant {
        token: json["access_token"].as_str().expect("access_token").to_string(),
        workspace_id: json["workspace"]["id"].as_i64().expect("workspace id"),
        user_id: json["user"]["id"].as_i64().expect("user id"),
    }
}

pub async fn login(app: &Router, email: &str, password: &str) -> Response<Body> {
    post_json(
        app,
        "/api/v1/auth/login",
        json!({ "email": email, "password": password }),
    )
    .await
}

/// Create a user with `role` in the admin's workspace and log them in.
pub async fn user_with_role(app: &Router, admin: &Tenant, email: &str, role: &str) -> String {
    let body = json!({
        "email": email,
        "password": PASSWORD,
        "first_name": "Test",
        "last_name": role,
        "role": role,
    });
    expect_json(
        post_json_auth(app, "/api/v1/admin/users", &admin.token, body).await,
        StatusCode::CREATED,
    )
    .await;
    let json = expect_json(login(app, email, PASSWORD).await, StatusCode::OK).await;
    json["access_token"].as_str().expect("access_token").to_string()
}

/// A client with one brand `ACM`, returning `(client_id, brand_id)`.
pub async fn client_and_brand(app: &Router, token: &str) -> (i64, i64) {
    let client = expect_json(
        post_json_auth(
            app,
            "/api/v1/clients",
            token,
            json!({ "name": "Acme Sports", "email": "buyer@acme.test", "payment_terms": 30 }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let client_id = client["data"]["id"].as_i64().expect("client id");

    let brand = expect_json(
        post_json_auth(
            app,
            &format!("/api/v1/clients/{client_id}/brands"),
            token,
            json!({ "name": "Acme", "code": "acm" }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    (client_id, brand["data"]["id"].as_i64().expect("brand id"))
}

/// An order of 100 silkscreen tees at 250.00, returning the order JSON.
pub async fn order(app: &Router, token: &str, client_id: i64, brand_id: i64) -> Value {
    let body = json!({
        "client_id": client_id,
        "brand_id": brand_id,
        "line_items": [{
            "description": "Team tee",
            "product_type": "tee",
            "printing_method": "silkscreen",
            "quantity": 100,
            "unit_price": 250.0,
            "size_breakdown": { "M": 60, "L": 40 }
        }]
    });
    let json = expect_json(
        post_json_auth(app, "/api/v1/orders", token, body).await,
        StatusCode::CREATED,
    )
    .await;
    json["data"].clone()
}
