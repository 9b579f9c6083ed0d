//! Public client-portal handlers. No JWT: the portal token is the
//! credential, and anything other than a live `SENT` token is a 404.

use ashley_core::audit::{ACTION_APPROVE, ACTION_UPDATE};
use ashley_core::design::{
    is_token_usable, order_status_after_approval, portal_token_hash, validate_change_request,
};
use ashley_core::types::DbId;
use ashley_db::models::design::{
    ApprovalResponse, DesignApproval, DesignAsset, PortalApprovalView, PortalOrderSummary,
    PortalTokenQuery,
};
use ashley_db::repositories::DesignRepo;
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;

use crate::activity::{self, Activity};
use crate::error::{not_found, AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Resolve a live approval and its design from a portal token. Unknown,
/// answered and expired tokens all read as a plain 404.
async fn resolve_token(state: &AppState, token: &str) -> AppResult<(DesignApproval, DesignAsset)> {
    let token_hash = portal_token_hash(token);
    let approval = DesignRepo::find_approval_by_token_hash(&state.pool, &token_hash)
        .await?
        .filter(|a| is_token_usable(&a.status, a.expires_at, Utc::now()))
        .ok_or(AppError::Database(sqlx::Error::RowNotFound))?;
    let asset = DesignRepo::find_by_id_unscoped(&state.pool, approval.asset_id)
        .await?
        .ok_or_else(|| not_found("DesignAsset", approval.asset_id))?;
    Ok((approval, asset))
}

/// GET /api/v1/portal/approval/{token}
pub async fn get_approval(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<DataResponse<PortalApprovalView>>> {
    let (approval, design) = resolve_token(&state, &token).await?;
    let version = DesignRepo::find_version(&state.pool, design.id, approval.version).await?;
    let order = DesignRepo::portal_order(&state.pool, design.order_id)
        .await?
        .ok_or_else(|| not_found("Order", design.order_id))?;

    Ok(Json(DataResponse {
        data: PortalApprovalView {
            approval,
            design,
            version,
            order,
        },
    }))
}

/// POST /api/v1/portal/approval/{token}/approve
pub async fn approve(
    State(state): State<AppState>,
    Path(token): Path<String>,
    body: Option<Json<ApprovalResponse>>,
) -> AppResult<Json<DataResponse<DesignApproval>>> {
    let input = body.map(|Json(b)| b).unwrap_or_default();
    let (approval, design) = resolve_token(&state, &token).await?;
    let order = DesignRepo::portal_order(&state.pool, design.order_id)
        .await?
        .ok_or_else(|| not_found("Order", design.order_id))?;
    let next_order_status = order_status_after_approval(&order.status);

    let updated = DesignRepo::approve(
        &state.pool,
        &approval,
        order.id,
        input.comments.as_deref(),
        input.approver_name.as_deref(),
        next_order_status.map(|to| (order.status.as_str(), to)),
    )
    .await?
    .ok_or(AppError::Database(sqlx::Error::RowNotFound))?;

    tracing::info!(
        approval_id = updated.id,
        asset_id = design.id,
        order_status = ?next_order_status,
        "Design approved through portal"
    );
    activity::record_for(
        &state,
        design.workspace_id,
        None,
        Activity {
            action: ACTION_APPROVE,
            resource: "design_asset",
            resource_id: design.id,
            event_type: "design.approved",
        },
        serde_json::json!({
            "approval_id": updated.id,
            "version": updated.version,
            "approver_name": updated.approver_name,
            "order_status": next_order_status,
        }),
    )
    .await;

    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/portal/approval/{token}/request-changes
pub async fn request_changes(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(input): Json<ApprovalResponse>,
) -> AppResult<Json<DataResponse<DesignApproval>>> {
    validate_change_request(input.comments.as_deref()).map_err(AppError::BadRequest)?;
    let comments = input.comments.as_deref().unwrap_or_default();
    let (approval, design) = resolve_token(&state, &token).await?;

    let updated = DesignRepo::request_changes(
        &state.pool,
        &approval,
        comments,
        input.approver_name.as_deref(),
    )
    .await?
    .ok_or(AppError::Database(sqlx::Error::RowNotFound))?;

    tracing::info!(approval_id = updated.id, asset_id = design.id, "Design changes requested");
    activity::record_for(
        &state,
        design.workspace_id,
        None,
        Activity {
            action: ACTION_UPDATE,
            resource: "design_asset",
            resource_id: design.id,
            event_type: "design.changes_requested",
        },
        serde_json::json!({ "approval_id": updated.id, "comments": comments }),
    )
    .await;

    Ok(Json(DataResponse { data: updated }))
}

/// GET /api/v1/portal/clients/{client_id}/orders?token=
pub async fn client_orders(
    State(state): State<AppState>,
    Path(client_id): Path<DbId>,
    Query(params): Query<PortalTokenQuery>,
) -> AppResult<Json<DataResponse<Vec<PortalOrderSummary>>>> {
    let (approval, _) = resolve_token(&state, &params.token).await?;
    if approval.client_id != client_id {
        return Err(not_found("Client", client_id));
    }
    let orders = DesignRepo::portal_orders_for_client(&state.pool, client_id).await?;
    Ok(Json(DataResponse { data: orders }))
}
