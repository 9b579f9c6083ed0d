//! Handlers for `/maintenance`: assets, preventive schedules and work orders.

use ashley_core::audit::{ACTION_CREATE, ACTION_DELETE, ACTION_STATUS_CHANGE, ACTION_UPDATE};
use ashley_core::error::CoreError;
use ashley_core::maintenance::{
    self, advance, days_until_due, due_status, state_machine, PRIORITY_MEDIUM, WO_COMPLETED,
};
use ashley_core::types::{Date, DbId};
use ashley_db::models::maintenance::{
    Asset, AssetQuery, CreateAsset, CreateSchedule, CreateWorkOrder, MaintenanceSchedule,
    NewWorkOrder, ScheduleQuery, ScheduleWithDue, UpdateAsset, UpdateWorkOrderStatus, WorkOrder,
    WorkOrderQuery,
};
use ashley_db::repositories::{AssetRepo, ScheduleDeleteOutcome, ScheduleRepo, WorkOrderRepo};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Datelike, Utc};
use serde::Serialize;
use validator::Validate;

use crate::activity::{self, Activity};
use crate::error::{not_found, status_changed, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// A completed work order and the schedule it advanced, if any.
#[derive(Debug, Serialize)]
pub struct WorkOrderCompletion {
    pub work_order: WorkOrder,
    pub schedule: Option<ScheduleWithDue>,
}

fn with_due(schedule: MaintenanceSchedule, today: Date) -> ScheduleWithDue {
    let days = days_until_due(schedule.next_due_date, today);
    ScheduleWithDue {
        schedule,
        days_until_due: days,
        due_status: due_status(days),
    }
}

async fn load_asset(state: &AppState, workspace_id: DbId, id: DbId) -> AppResult<Asset> {
    AssetRepo::find_by_id(&state.pool, workspace_id, id)
        .await?
        .ok_or_else(|| not_found("Asset", id))
}

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

/// POST /api/v1/maintenance/assets
pub async fn create_asset(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateAsset>,
) -> AppResult<(StatusCode, Json<DataResponse<Asset>>)> {
    input.validate()?;
    if let Some(status) = &input.status {
        maintenance::validate_asset_status(status).map_err(AppError::BadRequest)?;
    }

    let asset = AssetRepo::create(&state.pool, auth.workspace_id, &input).await?;

    tracing::info!(asset_id = asset.id, asset_number = %asset.asset_number, "Asset created");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "asset",
            resource_id: asset.id,
            event_type: "asset.created",
        },
        serde_json::json!({ "asset_number": asset.asset_number, "name": asset.name }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: asset })))
}

/// GET /api/v1/maintenance/assets
pub async fn list_assets(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<AssetQuery>,
) -> AppResult<Json<DataResponse<Vec<Asset>>>> {
    let assets = AssetRepo::list(
        &state.pool,
        auth.workspace_id,
        params.status.as_deref(),
        params.asset_type.as_deref(),
    )
    .await?;
    Ok(Json(DataResponse { data: assets }))
}

/// GET /api/v1/maintenance/assets/{id}
pub async fn get_asset(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Asset>>> {
    let asset = load_asset(&state, auth.workspace_id, id).await?;
    Ok(Json(DataResponse { data: asset }))
}

/// PUT /api/v1/maintenance/assets/{id}
pub async fn update_asset(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateAsset>,
) -> AppResult<Json<DataResponse<Asset>>> {
    input.validate()?;
    if let Some(status) = &input.status {
        maintenance::validate_asset_status(status).map_err(AppError::BadRequest)?;
    }

    let asset = AssetRepo::update(&state.pool, auth.workspace_id, id, &input)
        .await?
        .ok_or_else(|| not_found("Asset", id))?;

    tracing::info!(asset_id = id, status = %asset.status, "Asset updated");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_UPDATE,
            resource: "asset",
            resource_id: id,
            event_type: "asset.updated",
        },
        serde_json::json!({ "name": asset.name, "status": asset.status }),
    )
    .await;

    Ok(Json(DataResponse { data: asset }))
}

// ---------------------------------------------------------------------------
// Schedules
// ---------------------------------------------------------------------------

/// POST /api/v1/maintenance/schedules
pub async fn create_schedule(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateSchedule>,
) -> AppResult<(StatusCode, Json<DataResponse<ScheduleWithDue>>)> {
    input.validate()?;
    maintenance::validate_maintenance_type(&input.maintenance_type)
        .map_err(AppError::BadRequest)?;
    let frequency_value = input.frequency_value.unwrap_or(1);
    maintenance::validate_frequency(&input.frequency_type, frequency_value)
        .map_err(AppError::BadRequest)?;
    let priority = input.priority.as_deref().unwrap_or(PRIORITY_MEDIUM);
    maintenance::validate_priority(priority).map_err(AppError::BadRequest)?;

    load_asset(&state, auth.workspace_id, input.asset_id).await?;

    let today = Utc::now().date_naive();
    let next_due_date = match input.next_due_date {
        Some(date) => date,
        None => advance(today, &input.frequency_type, frequency_value).ok_or_else(|| {
            AppError::BadRequest("frequency is out of range".to_string())
        })?,
    };

    let schedule = ScheduleRepo::create(
        &state.pool,
        auth.workspace_id,
        &input,
        frequency_value,
        priority,
        next_due_date,
    )
    .await?;

    tracing::info!(
        schedule_id = schedule.id,
        asset_id = schedule.asset_id,
        next_due_date = %schedule.next_due_date,
        "Maintenance schedule created"
    );
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "maintenance_schedule",
            resource_id: schedule.id,
            event_type: "maintenance_schedule.created",
        },
        serde_json::json!({
            "asset_id": schedule.asset_id,
            "frequency_type": schedule.frequency_type,
            "frequency_value": schedule.frequency_value,
            "next_due_date": schedule.next_due_date,
        }),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: with_due(schedule, today),
        }),
    ))
}

/// GET /api/v1/maintenance/schedules
pub async fn list_schedules(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ScheduleQuery>,
) -> AppResult<Json<DataResponse<Vec<ScheduleWithDue>>>> {
    let today = Utc::now().date_naive();
    let schedules = ScheduleRepo::list(&state.pool, auth.workspace_id, params.asset_id)
        .await?
        .into_iter()
        .map(|s| with_due(s, today))
        .collect();
    Ok(Json(DataResponse { data: schedules }))
}

/// DELETE /api/v1/maintenance/schedules/{id}
pub async fn delete_schedule(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    match ScheduleRepo::delete(&state.pool, auth.workspace_id, id).await? {
        ScheduleDeleteOutcome::Deleted => {}
        ScheduleDeleteOutcome::NotFound => return Err(not_found("MaintenanceSchedule", id)),
        ScheduleDeleteOutcome::Blocked(open) => {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Schedule {id} still has {open} work order(s) that are not completed"
            ))));
        }
    }

    tracing::info!(schedule_id = id, "Maintenance schedule deleted");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_DELETE,
            resource: "maintenance_schedule",
            resource_id: id,
            event_type: "maintenance_schedule.deleted",
        },
        serde_json::Value::Null,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Work orders
// ---------------------------------------------------------------------------

/// POST /api/v1/maintenance/work-orders
///
/// When created from a schedule the asset, title and priority fall back to
/// the schedule's values.
pub async fn create_work_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateWorkOrder>,
) -> AppResult<(StatusCode, Json<DataResponse<WorkOrder>>)> {
    input.validate()?;

    let schedule = match input.schedule_id {
        Some(schedule_id) => Some(
            ScheduleRepo::find_by_id(&state.pool, auth.workspace_id, schedule_id)
                .await?
                .ok_or_else(|| not_found("MaintenanceSchedule", schedule_id))?,
        ),
        None => None,
    };

    let asset_id = match (input.asset_id, &schedule) {
        (Some(asset_id), Some(s)) if asset_id != s.asset_id => {
            return Err(AppError::BadRequest(
                "asset_id does not match the schedule's asset".to_string(),
            ));
        }
        (Some(asset_id), _) => asset_id,
        (None, Some(s)) => s.asset_id,
        (None, None) => {
            return Err(AppError::BadRequest(
                "Either asset_id or schedule_id is required".to_string(),
            ));
        }
    };
    load_asset(&state, auth.workspace_id, asset_id).await?;

    let title = input
        .title
        .clone()
        .or_else(|| schedule.as_ref().map(|s| s.name.clone()))
        .ok_or_else(|| AppError::BadRequest("title is required".to_string()))?;
    let priority = input
        .priority
        .clone()
        .or_else(|| schedule.as_ref().map(|s| s.priority.clone()))
        .unwrap_or_else(|| PRIORITY_MEDIUM.to_string());
    maintenance::validate_priority(&priority).map_err(AppError::BadRequest)?;

    let new = NewWorkOrder {
        workspace_id: auth.workspace_id,
        asset_id,
        schedule_id: input.schedule_id,
        title,
        description: input
            .description
            .clone()
            .or_else(|| schedule.as_ref().and_then(|s| s.description.clone())),
        priority,
        assigned_to: input
            .assigned_to
            .or_else(|| schedule.as_ref().and_then(|s| s.assigned_to)),
        scheduled_date: input
            .scheduled_date
            .or_else(|| schedule.as_ref().map(|s| s.next_due_date)),
        created_by: auth.user_id,
    };
    let wo = WorkOrderRepo::create(&state.pool, &new, Utc::now().year()).await?;

    tracing::info!(work_order_id = wo.id, wo_number = %wo.wo_number, asset_id, "Work order created");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "work_order",
            resource_id: wo.id,
            event_type: "work_order.created",
        },
        serde_json::json!({
            "wo_number": wo.wo_number,
            "asset_id": wo.asset_id,
            "schedule_id": wo.schedule_id,
        }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: wo })))
}

/// GET /api/v1/maintenance/work-orders
pub async fn list_work_orders(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<WorkOrderQuery>,
) -> AppResult<Json<DataResponse<Vec<WorkOrder>>>> {
    if let Some(status) = &params.status {
        if !maintenance::VALID_WORK_ORDER_STATUSES.contains(&status.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Invalid work order status '{status}'"
            )));
        }
    }
    let work_orders = WorkOrderRepo::list(
        &state.pool,
        auth.workspace_id,
        params.status.as_deref(),
        params.asset_id,
    )
    .await?;
    Ok(Json(DataResponse { data: work_orders }))
}

/// GET /api/v1/maintenance/work-orders/{id}
pub async fn get_work_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<WorkOrder>>> {
    let wo = WorkOrderRepo::find_by_id(&state.pool, auth.workspace_id, id)
        .await?
        .ok_or_else(|| not_found("WorkOrder", id))?;
    Ok(Json(DataResponse { data: wo }))
}

/// PUT /api/v1/maintenance/work-orders/{id}/status
///
/// Moving to `COMPLETED` also advances the linked schedule.
pub async fn update_work_order_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateWorkOrderStatus>,
) -> AppResult<Json<DataResponse<WorkOrderCompletion>>> {
    let current = WorkOrderRepo::find_by_id(&state.pool, auth.workspace_id, id)
        .await?
        .ok_or_else(|| not_found("WorkOrder", id))?;
    state_machine::validate_transition(&current.status, &input.status)
        .map_err(|msg| AppError::Core(CoreError::InvalidState(msg)))?;

    let today = Utc::now().date_naive();
    let (work_order, schedule) = if input.status == WO_COMPLETED {
        WorkOrderRepo::complete(
            &state.pool,
            id,
            &current.status,
            input.completion_notes.as_deref(),
            today,
        )
        .await?
        .ok_or_else(|| status_changed("WorkOrder", id, &current.status))?
    } else {
        let wo = WorkOrderRepo::set_status(&state.pool, id, &current.status, &input.status)
            .await?
            .ok_or_else(|| status_changed("WorkOrder", id, &current.status))?;
        (wo, None)
    };

    tracing::info!(
        work_order_id = id,
        from = %current.status,
        to = %work_order.status,
        "Work order status changed"
    );
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_STATUS_CHANGE,
            resource: "work_order",
            resource_id: id,
            event_type: if work_order.status == WO_COMPLETED {
                "work_order.completed"
            } else {
                "work_order.status_changed"
            },
        },
        serde_json::json!({
            "from": current.status,
            "to": work_order.status,
            "next_due_date": schedule.as_ref().map(|s| s.next_due_date),
        }),
    )
    .await;

    Ok(Json(DataResponse {
        data: WorkOrderCompletion {
            work_order,
            schedule: schedule.map(|s| with_due(s, today)),
        },
    }))
}
