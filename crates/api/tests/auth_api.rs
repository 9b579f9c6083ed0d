//! HTTP-level tests for registration, login, refresh and logout.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, expect_json, get, get_auth, login, post_auth, post_json, register, PASSWORD,
};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_creates_workspace_and_admin(pool: PgPool) {
    let app = common::build_test_app(pool);
    let body = json!({
        "workspace_name": "Reefer Apparel",
        "workspace_slug": "Reefer",
        "email": "owner@reefer.test",
        "password": PASSWORD,
        "first_name": "Ria",
        "last_name": "Santos",
    });

    let json = expect_json(post_json(&app, "/api/v1/auth/register", body).await, StatusCode::CREATED).await;

    assert_eq!(json["workspace"]["slug"], "reefer");
    assert_eq!(json["user"]["role"], "admin");
    assert_eq!(json["user"]["email"], "owner@reefer.test");
    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["expires_in"], 15 * 60);
    assert!(json["user"].get("password_hash").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_rejects_short_password(pool: PgPool) {
    let app = common::build_test_app(pool);
    let body = json!({
        "workspace_name": "Short",
        "workspace_slug": "short",
        "email": "owner@short.test",
        "password": "abc",
        "first_name": "A",
        "last_name": "B",
    });

    let json = expect_json(post_json(&app, "/api/v1/auth/register", body).await, StatusCode::BAD_REQUEST).await;
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_slug_is_conflict(pool: PgPool) {
    let app = common::build_test_app(pool);
    register(&app, "twin").await;

    let body = json!({
        "workspace_name": "Twin again",
        "workspace_slug": "twin",
        "email": "other@twin.test",
        "password": PASSWORD,
        "first_name": "A",
        "last_name": "B",
    });
    let json = expect_json(post_json(&app, "/api/v1/auth/register", body).await, StatusCode::CONFLICT).await;
    assert_eq!(json["code"], "CONFLICT");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_success_and_me(pool: PgPool) {
    let app = common::build_test_app(pool);
    let tenant = register(&app, "login").await;

    let json = expect_json(login(&app, "owner@login.test", PASSWORD).await, StatusCode::OK).await;
    assert_eq!(json["user"]["id"], tenant.user_id);

    let token = json["access_token"].as_str().unwrap();
    let me = expect_json(get_auth(&app, "/api/v1/auth/me", token).await, StatusCode::OK).await;
    assert_eq!(me["data"]["workspace_id"], tenant.workspace_id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_wrong_password_is_401(pool: PgPool) {
    let app = common::build_test_app(pool);
    register(&app, "wrongpw").await;

    let response = login(&app, "owner@wrongpw.test", "not-the-password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = login(&app, "nobody@wrongpw.test", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn account_locks_after_five_failures(pool: PgPool) {
    let app = common::build_test_app(pool);
    register(&app, "lockout").await;

    for _ in 0..5 {
        let response = login(&app, "owner@lockout.test", "wrong-password").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Even the correct password is refused while locked.
    let json = expect_json(login(&app, "owner@lockout.test", PASSWORD).await, StatusCode::FORBIDDEN).await;
    assert_eq!(json["code"], "FORBIDDEN");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refresh_rotates_the_token(pool: PgPool) {
    let app = common::build_test_app(pool);
    register(&app, "refresh").await;
    let json = expect_json(login(&app, "owner@refresh.test", PASSWORD).await, StatusCode::OK).await;
    let refresh_token = json["refresh_token"].as_str().unwrap().to_string();

    let rotated = expect_json(
        post_json(&app, "/api/v1/auth/refresh", json!({ "refresh_token": refresh_token })).await,
        StatusCode::OK,
    )
    .await;
    assert_ne!(rotated["refresh_token"], json!(refresh_token));

    // The old refresh token was revoked by the rotation.
    let response = post_json(&app, "/api/v1/auth/refresh", json!({ "refresh_token": refresh_token })).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn logout_revokes_refresh_tokens(pool: PgPool) {
    let app = common::build_test_app(pool);
    let tenant = register(&app, "logout").await;
    let json = expect_json(login(&app, "owner@logout.test", PASSWORD).await, StatusCode::OK).await;
    let refresh_token = json["refresh_token"].as_str().unwrap().to_string();

    let response = post_auth(&app, "/api/v1/auth/logout", &tenant.token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = post_json(&app, "/api/v1/auth/refresh", json!({ "refresh_token": refresh_token })).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn protected_routes_require_a_bearer_token(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(&app, "/api/v1/orders").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get_auth(&app, "/api/v1/orders", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}
