//! Handlers for `/designs`: versioned design assets and client approval
//! requests.

use ashley_core::audit::{ACTION_CREATE, ACTION_STATUS_CHANGE};
use ashley_core::design::{
    clamp_expiry_hours, generate_portal_token, portal_token_hash, validate_can_send, validate_lock,
    ASSET_LOCKED,
};
use ashley_core::types::DbId;
use ashley_db::models::design::{
    DesignAsset, DesignDetail, DesignQuery, SendApproval, SentApproval, UploadDesign, UploadResult,
};
use ashley_db::repositories::{DesignRepo, OrderRepo};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use validator::Validate;

use crate::activity::{self, Activity};
use crate::error::{not_found, status_changed, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireManager;
use crate::response::DataResponse;
use crate::state::AppState;

async fn load(state: &AppState, workspace_id: DbId, id: DbId) -> AppResult<DesignAsset> {
    DesignRepo::find_by_id(&state.pool, workspace_id, id)
        .await?
        .ok_or_else(|| not_found("DesignAsset", id))
}

/// POST /api/v1/designs
///
/// A new name creates the asset at version 1. Re-uploading an existing name
/// on the same order adds the next version.
pub async fn upload_design(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UploadDesign>,
) -> AppResult<(StatusCode, Json<DataResponse<UploadResult>>)> {
    input.validate()?;
    OrderRepo::find_by_id(&state.pool, auth.workspace_id, input.order_id)
        .await?
        .ok_or_else(|| not_found("Order", input.order_id))?;

    let result = DesignRepo::upload(&state.pool, auth.workspace_id, &input, auth.user_id).await?;

    tracing::info!(
        asset_id = result.asset.id,
        version = result.version.version,
        "Design uploaded"
    );
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "design_version",
            resource_id: result.version.id,
            event_type: "design.uploaded",
        },
        serde_json::json!({
            "asset_id": result.asset.id,
            "name": result.asset.name,
            "version": result.version.version,
        }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: result })))
}

/// GET /api/v1/designs?order_id=
pub async fn list_designs(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<DesignQuery>,
) -> AppResult<Json<DataResponse<Vec<DesignAsset>>>> {
    let assets = DesignRepo::list(&state.pool, auth.workspace_id, params.order_id).await?;
    Ok(Json(DataResponse { data: assets }))
}

/// GET /api/v1/designs/{id}
pub async fn get_design(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DesignDetail>>> {
    let asset = load(&state, auth.workspace_id, id).await?;
    let versions = DesignRepo::versions(&state.pool, id).await?;
    let approvals = DesignRepo::approvals(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: DesignDetail {
            asset,
            versions,
            approvals,
        },
    }))
}

/// POST /api/v1/designs/{id}/send-approval
pub async fn send_approval(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SendApproval>,
) -> AppResult<(StatusCode, Json<DataResponse<SentApproval>>)> {
    let asset = load(&state, auth.workspace_id, id).await?;
    validate_can_send(&asset.status).map_err(AppError::BadRequest)?;

    DesignRepo::find_version(&state.pool, id, input.version)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("Design has no version {}", input.version)))?;

    let order = OrderRepo::find_by_id(&state.pool, auth.workspace_id, asset.order_id)
        .await?
        .ok_or_else(|| not_found("Order", asset.order_id))?;
    if order.client_id != input.client_id {
        return Err(AppError::BadRequest(
            "Approvals can only be sent to the order's client".to_string(),
        ));
    }

    let token = generate_portal_token();
    let expires_at = Utc::now() + Duration::hours(clamp_expiry_hours(input.expires_in_hours));
    let approval = DesignRepo::send_approval(
        &state.pool,
        id,
        input.version,
        input.client_id,
        &portal_token_hash(&token),
        expires_at,
        auth.user_id,
    )
    .await?
    .ok_or_else(|| status_changed("DesignAsset", id, &asset.status))?;

    tracing::info!(
        asset_id = id,
        version = approval.version,
        client_id = approval.client_id,
        expires_at = %approval.expires_at,
        "Design sent for approval"
    );
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_STATUS_CHANGE,
            resource: "design_asset",
            resource_id: id,
            event_type: "design.approval_sent",
        },
        serde_json::json!({
            "approval_id": approval.id,
            "version": approval.version,
            "client_id": approval.client_id,
        }),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: SentApproval {
                approval,
                portal_token: token,
            },
        }),
    ))
}

/// POST /api/v1/designs/{id}/lock
pub async fn lock_design(
    RequireManager(auth): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DesignAsset>>> {
    let asset = load(&state, auth.workspace_id, id).await?;
    validate_lock(&asset.status).map_err(AppError::BadRequest)?;

    let locked = DesignRepo::set_status(&state.pool, id, &asset.status, ASSET_LOCKED)
        .await?
        .ok_or_else(|| status_changed("DesignAsset", id, &asset.status))?;

    tracing::info!(asset_id = id, "Design locked");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_STATUS_CHANGE,
            resource: "design_asset",
            resource_id: id,
            event_type: "design.locked",
        },
        serde_json::json!({ "from": asset.status, "to": locked.status }),
    )
    .await;

    Ok(Json(DataResponse { data: locked }))
}
