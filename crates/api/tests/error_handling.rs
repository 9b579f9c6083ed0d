//! Tests for `AppError` to HTTP response mapping. These call `IntoResponse`
//! directly and need no server or database.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use validator::Validate;

use ashley_api::error::{not_found, AppError};
use ashley_core::error::CoreError;

async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn not_found_names_the_entity() {
    let (status, json) = error_to_response(not_found("Order", 42)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Order with id 42 not found");
}

#[tokio::test]
async fn bad_request_keeps_its_message() {
    let (status, json) = error_to_response(AppError::BadRequest("invalid uom".into())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "invalid uom");
}

#[tokio::test]
async fn invalid_state_is_422() {
    let err = AppError::Core(CoreError::InvalidState("Insufficient fabric".into()));
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "INVALID_STATE");
}

#[tokio::test]
async fn conflict_is_409() {
    let err = AppError::Core(CoreError::Conflict("schedule has open work orders".into()));
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn internal_errors_are_sanitized() {
    let err = AppError::InternalError("connection string postgres://secret".into());
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn row_not_found_is_404() {
    let (status, json) = error_to_response(AppError::Database(sqlx::Error::RowNotFound)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Resource not found");
}

#[derive(Validate)]
struct Sample {
    #[validate(length(min = 1, message = "name is required"))]
    name: String,
    #[validate(range(min = 1))]
    qty: i32,
}

#[tokio::test]
async fn validation_errors_are_sorted_and_joined() {
    let errors = Sample {
        name: String::new(),
        qty: 0,
    }
    .validate()
    .unwrap_err();

    let (status, json) = error_to_response(AppError::from(errors)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"],
        "name: name is required; qty: invalid value (range)"
    );
}
