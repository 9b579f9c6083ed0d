//! Handlers for `/capa`: corrective and preventive action tasks.

use ashley_core::audit::{ACTION_APPROVE, ACTION_CREATE, ACTION_STATUS_CHANGE, ACTION_UPDATE};
use ashley_core::capa::{
    self, validate_status_change, PRIORITY_MEDIUM, STATUS_CLOSED, STATUS_PENDING_VERIFICATION,
};
use ashley_core::pagination;
use ashley_core::types::DbId;
use ashley_db::models::capa::{
    CapaAnalytics, CapaQuery, CapaTask, CreateCapa, ReopenCapa, UpdateCapa, VerifyCapa,
};
use ashley_db::repositories::{CapaDimension, CapaRepo, EmployeeRepo, OrderRepo};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Datelike, Utc};
use validator::Validate;

use crate::activity::{self, Activity};
use crate::error::{not_found, status_changed, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireManager;
use crate::response::{DataResponse, PaginatedResponse};
use crate::state::AppState;

async fn load(state: &AppState, workspace_id: DbId, id: DbId) -> AppResult<CapaTask> {
    CapaRepo::find_by_id(&state.pool, workspace_id, id)
        .await?
        .ok_or_else(|| not_found("CapaTask", id))
}

/// GET /api/v1/capa
pub async fn list_capa(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<CapaQuery>,
) -> AppResult<Json<PaginatedResponse<CapaTask>>> {
    let (page, limit, offset) = pagination::resolve(params.page, params.limit);
    let (status, priority, capa_type, source) = (
        params.status.as_deref(),
        params.priority.as_deref(),
        params.capa_type.as_deref(),
        params.source.as_deref(),
    );

    let tasks = CapaRepo::list(
        &state.pool,
        auth.workspace_id,
        status,
        priority,
        capa_type,
        source,
        limit,
        offset,
    )
    .await?;
    let total = CapaRepo::count(&state.pool, auth.workspace_id, status, priority, capa_type, source).await?;

    Ok(Json(PaginatedResponse::new(tasks, page, limit, total)))
}

/// POST /api/v1/capa
pub async fn create_capa(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCapa>,
) -> AppResult<(StatusCode, Json<DataResponse<CapaTask>>)> {
    input.validate()?;
    capa::validate_type(&input.capa_type).map_err(AppError::BadRequest)?;
    if let Some(p) = &input.priority {
        capa::validate_priority(p).map_err(AppError::BadRequest)?;
    }
    if let Some(s) = &input.source {
        capa::validate_source(s).map_err(AppError::BadRequest)?;
    }
    if let Some(order_id) = input.order_id {
        OrderRepo::find_by_id(&state.pool, auth.workspace_id, order_id)
            .await?
            .ok_or_else(|| not_found("Order", order_id))?;
    }
    if let Some(employee_id) = input.assigned_to {
        EmployeeRepo::find_by_id(&state.pool, auth.workspace_id, employee_id)
            .await?
            .ok_or_else(|| not_found("Employee", employee_id))?;
    }

    let task = CapaRepo::create(
        &state.pool,
        auth.workspace_id,
        Utc::now().year(),
        &input,
        Some(auth.user_id),
    )
    .await?;

    tracing::info!(capa_id = task.id, capa_number = %task.capa_number, "CAPA task created");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "capa",
            resource_id: task.id,
            event_type: "capa.created",
        },
        serde_json::json!({
            "capa_number": task.capa_number,
            "priority": task.priority,
            "source": task.source,
        }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: task })))
}

/// GET /api/v1/capa/{id}
pub async fn get_capa(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<CapaTask>>> {
    let task = load(&state, auth.workspace_id, id).await?;
    Ok(Json(DataResponse { data: task }))
}

/// PUT /api/v1/capa/{id}
///
/// Status changes here follow the task state machine, except that closing a
/// task awaiting verification must use `verify` and a closed task can only
/// come back through `reopen`.
pub async fn update_capa(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCapa>,
) -> AppResult<Json<DataResponse<CapaTask>>> {
    input.validate()?;
    let existing = load(&state, auth.workspace_id, id).await?;

    if let Some(p) = &input.priority {
        capa::validate_priority(p).map_err(AppError::BadRequest)?;
    }
    if let Some(to) = &input.status {
        capa::validate_status(to).map_err(AppError::BadRequest)?;
        if existing.status == STATUS_CLOSED {
            return Err(AppError::BadRequest(
                "Closed CAPA tasks can only be reopened".to_string(),
            ));
        }
        if existing.status == STATUS_PENDING_VERIFICATION && to == STATUS_CLOSED {
            return Err(AppError::BadRequest(
                "Tasks pending verification are closed through verify".to_string(),
            ));
        }
        let root_cause = input.root_cause.as_deref().or(existing.root_cause.as_deref());
        validate_status_change(&existing.status, to, root_cause).map_err(AppError::BadRequest)?;
    }

    let updated = CapaRepo::update(&state.pool, id, &existing.status, &input)
        .await?
        .ok_or_else(|| status_changed("CapaTask", id, &existing.status))?;

    let moved = updated.status != existing.status;
    tracing::info!(capa_id = id, status = %updated.status, "CAPA task updated");
    activity::record(
        &state,
        &auth,
        Activity {
            action: if moved { ACTION_STATUS_CHANGE } else { ACTION_UPDATE },
            resource: "capa",
            resource_id: id,
            event_type: if moved { "capa.status_changed" } else { "capa.updated" },
        },
        serde_json::json!({ "from": existing.status, "to": updated.status }),
    )
    .await;

    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/capa/{id}/verify
pub async fn verify_capa(
    RequireManager(auth): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<VerifyCapa>,
) -> AppResult<Json<DataResponse<CapaTask>>> {
    capa::validate_effectiveness(&input.effectiveness).map_err(AppError::BadRequest)?;
    let existing = load(&state, auth.workspace_id, id).await?;
    if existing.status != STATUS_PENDING_VERIFICATION {
        return Err(AppError::BadRequest(format!(
            "Only tasks pending verification can be verified, this one is {}",
            existing.status
        )));
    }

    let verified = CapaRepo::verify(&state.pool, id, auth.user_id, &input.effectiveness)
        .await?
        .ok_or_else(|| status_changed("CapaTask", id, &existing.status))?;

    tracing::info!(capa_id = id, effectiveness = %input.effectiveness, "CAPA task verified");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_APPROVE,
            resource: "capa",
            resource_id: id,
            event_type: "capa.verified",
        },
        serde_json::json!({ "effectiveness": input.effectiveness }),
    )
    .await;

    Ok(Json(DataResponse { data: verified }))
}

/// POST /api/v1/capa/{id}/reopen
pub async fn reopen_capa(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<ReopenCapa>>,
) -> AppResult<Json<DataResponse<CapaTask>>> {
    let input = body.map(|Json(b)| b).unwrap_or_default();
    let priority = input.priority.unwrap_or_else(|| PRIORITY_MEDIUM.to_string());
    capa::validate_priority(&priority).map_err(AppError::BadRequest)?;

    let existing = load(&state, auth.workspace_id, id).await?;
    if existing.status != STATUS_CLOSED {
        return Err(AppError::BadRequest(format!(
            "Only closed tasks can be reopened, this one is {}",
            existing.status
        )));
    }

    let reopened = CapaRepo::reopen(&state.pool, id, &priority)
        .await?
        .ok_or_else(|| status_changed("CapaTask", id, &existing.status))?;

    tracing::info!(capa_id = id, priority = %priority, "CAPA task reopened");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_STATUS_CHANGE,
            resource: "capa",
            resource_id: id,
            event_type: "capa.reopened",
        },
        serde_json::json!({ "from": STATUS_CLOSED, "to": reopened.status, "priority": priority }),
    )
    .await;

    Ok(Json(DataResponse { data: reopened }))
}

/// GET /api/v1/capa/analytics
pub async fn analytics(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<CapaAnalytics>>> {
    let pool = &state.pool;
    let ws = auth.workspace_id;

    let data = CapaAnalytics {
        by_status: CapaRepo::count_by(pool, ws, CapaDimension::Status).await?,
        by_priority: CapaRepo::count_by(pool, ws, CapaDimension::Priority).await?,
        by_type: CapaRepo::count_by(pool, ws, CapaDimension::Type).await?,
        by_source: CapaRepo::count_by(pool, ws, CapaDimension::Source).await?,
        overdue: CapaRepo::count_overdue(pool, ws).await?,
        avg_completion_days: CapaRepo::avg_completion_days(pool, ws).await?,
        monthly_trend: CapaRepo::monthly_trend(pool, ws).await?,
    };
    Ok(Json(DataResponse { data }))
}
