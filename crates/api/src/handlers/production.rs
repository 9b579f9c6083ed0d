//! Handlers for `/production`: floor summary, routing steps and bundles.

use ashley_core::audit::{ACTION_STATUS_CHANGE, ACTION_UPDATE};
use ashley_core::pagination::{clamp_limit, clamp_offset, MAX_PAGE_SIZE};
use ashley_core::production::{self as bundle_rules, validate_bundle_status};
use ashley_core::routing::{validate_step_status, validate_step_transition};
use ashley_core::types::DbId;
use ashley_db::models::order::{RoutingStep, UpdateRoutingStep};
use ashley_db::models::production::{
    Bundle, BundleQuery, DepartmentActivity, ProductionCounts, UpdateBundleStatus,
};
use ashley_db::repositories::{BundleRepo, EmployeeRepo, ProductionRepo, RoutingStepRepo};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;

use crate::activity::{self, Activity};
use crate::error::{not_found, status_changed, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_BUNDLE_PAGE: i64 = 50;

#[derive(Debug, Serialize)]
pub struct ProductionSummary {
    #[serde(flatten)]
    pub counts: ProductionCounts,
    pub departments: Vec<DepartmentActivity>,
}

/// GET /api/v1/production/summary
pub async fn summary(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<ProductionSummary>>> {
    let counts = ProductionRepo::counts(&state.pool, auth.workspace_id).await?;
    let departments = ProductionRepo::department_activity(&state.pool, auth.workspace_id).await?;
    Ok(Json(DataResponse {
        data: ProductionSummary {
            counts,
            departments,
        },
    }))
}

/// PUT /api/v1/production/routing-steps/{id}
pub async fn update_routing_step(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateRoutingStep>,
) -> AppResult<Json<DataResponse<RoutingStep>>> {
    let step = RoutingStepRepo::find_by_id(&state.pool, auth.workspace_id, id)
        .await?
        .ok_or_else(|| not_found("RoutingStep", id))?;

    if let Some(to) = input.status.as_deref() {
        validate_step_status(to).map_err(AppError::BadRequest)?;
        validate_step_transition(&step.status, to).map_err(AppError::BadRequest)?;
    }
    if let Some(employee_id) = input.assigned_employee_id {
        EmployeeRepo::find_by_id(&state.pool, auth.workspace_id, employee_id)
            .await?
            .ok_or_else(|| not_found("Employee", employee_id))?;
    }

    let updated = RoutingStepRepo::update(&state.pool, id, &step.status, &input)
        .await?
        .ok_or_else(|| status_changed("RoutingStep", id, &step.status))?;

    let action = if updated.status != step.status {
        ACTION_STATUS_CHANGE
    } else {
        ACTION_UPDATE
    };
    tracing::info!(step_id = id, status = %updated.status, "Routing step updated");
    activity::record(
        &state,
        &auth,
        Activity {
            action,
            resource: "routing_step",
            resource_id: id,
            event_type: "routing_step.updated",
        },
        serde_json::json!({
            "order_id": updated.order_id,
            "from_status": step.status,
            "status": updated.status,
            "assigned_employee_id": updated.assigned_employee_id,
        }),
    )
    .await;

    Ok(Json(DataResponse { data: updated }))
}

/// GET /api/v1/production/bundles?order_id=&status=
pub async fn list_bundles(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<BundleQuery>,
) -> AppResult<Json<DataResponse<Vec<Bundle>>>> {
    if let Some(status) = params.status.as_deref() {
        validate_bundle_status(status).map_err(AppError::BadRequest)?;
    }
    let bundles = BundleRepo::list(
        &state.pool,
        auth.workspace_id,
        params.order_id,
        params.status.as_deref(),
        clamp_limit(params.limit, DEFAULT_BUNDLE_PAGE, MAX_PAGE_SIZE),
        clamp_offset(params.offset),
    )
    .await?;
    Ok(Json(DataResponse { data: bundles }))
}

/// GET /api/v1/production/bundles/{id}
pub async fn get_bundle(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Bundle>>> {
    let bundle = BundleRepo::find_by_id(&state.pool, auth.workspace_id, id)
        .await?
        .ok_or_else(|| not_found("Bundle", id))?;
    Ok(Json(DataResponse { data: bundle }))
}

/// PUT /api/v1/production/bundles/{id}/status
pub async fn update_bundle_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateBundleStatus>,
) -> AppResult<Json<DataResponse<Bundle>>> {
    let bundle = BundleRepo::find_by_id(&state.pool, auth.workspace_id, id)
        .await?
        .ok_or_else(|| not_found("Bundle", id))?;

    bundle_rules::state_machine::validate_transition(&bundle.status, &input.status)
        .map_err(AppError::BadRequest)?;

    let updated = BundleRepo::update_status(&state.pool, id, &bundle.status, &input.status)
        .await?
        .ok_or_else(|| status_changed("Bundle", id, &bundle.status))?;

    tracing::info!(bundle_id = id, from = %bundle.status, to = %updated.status, "Bundle status changed");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_STATUS_CHANGE,
            resource: "bundle",
            resource_id: id,
            event_type: "bundle.status_changed",
        },
        serde_json::json!({ "from_status": bundle.status, "status": updated.status }),
    )
    .await;

    Ok(Json(DataResponse { data: updated }))
}
