//! Handlers for `/printing`: machines, print runs, their child records and
//! the printing dashboard.

use ashley_core::audit::{ACTION_CREATE, ACTION_STATUS_CHANGE};
use ashley_core::error::CoreError;
use ashley_core::pagination::{self, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use ashley_core::printing::{
    self, efficiency_check, primary_log_type, state_machine, EfficiencyCheck,
    DASHBOARD_METHOD_WINDOW_DAYS, DASHBOARD_RECENT_REJECTS, STATUS_CANCELLED, STATUS_DONE,
    STATUS_IN_PROGRESS, STATUS_PAUSED,
};
use ashley_core::reporting::start_of_day;
use ashley_core::types::DbId;
use ashley_db::models::printing::{
    CreateMachine, CreatePrintMethodLog, CreatePrintReject, CreatePrintRun, CreatePrintRunMaterial,
    CreatePrintRunOutput, Machine, MethodCount, PrintMethodLog, PrintReject, PrintRun,
    PrintRunDetail, PrintRunMaterial, PrintRunOutput, PrintRunQuery, RecentPrintReject,
};
use ashley_db::repositories::{MachineRepo, OrderRepo, PrintRunRepo, RoutingStepRepo};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::activity::{self, Activity};
use crate::error::{not_found, status_changed, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MachineQuery {
    pub workcenter: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PrintingDashboard {
    pub active_runs: i64,
    pub runs_today: i64,
    pub method_counts: Vec<MethodCount>,
    pub recent_rejects: Vec<RecentPrintReject>,
}

async fn load_run(state: &AppState, workspace_id: DbId, id: DbId) -> AppResult<PrintRun> {
    PrintRunRepo::find_by_id(&state.pool, workspace_id, id)
        .await?
        .ok_or_else(|| not_found("PrintRun", id))
}

// ---------------------------------------------------------------------------
// Machines
// ---------------------------------------------------------------------------

/// POST /api/v1/printing/machines
pub async fn create_machine(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateMachine>,
) -> AppResult<(StatusCode, Json<DataResponse<Machine>>)> {
    input.validate()?;
    printing::validate_workcenter(&input.workcenter).map_err(AppError::BadRequest)?;

    let machine = MachineRepo::create(&state.pool, auth.workspace_id, &input).await?;

    tracing::info!(machine_id = machine.id, workcenter = %machine.workcenter, "Machine created");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "machine",
            resource_id: machine.id,
            event_type: "machine.created",
        },
        serde_json::json!({ "name": machine.name, "workcenter": machine.workcenter }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: machine })))
}

/// GET /api/v1/printing/machines?workcenter=
pub async fn list_machines(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<MachineQuery>,
) -> AppResult<Json<DataResponse<Vec<Machine>>>> {
    let machines =
        MachineRepo::list(&state.pool, auth.workspace_id, params.workcenter.as_deref()).await?;
    Ok(Json(DataResponse { data: machines }))
}

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

/// POST /api/v1/printing/runs
pub async fn create_run(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePrintRun>,
) -> AppResult<(StatusCode, Json<DataResponse<PrintRun>>)> {
    printing::validate_method(&input.method).map_err(AppError::BadRequest)?;
    printing::validate_workcenter(&input.workcenter).map_err(AppError::BadRequest)?;

    OrderRepo::find_by_id(&state.pool, auth.workspace_id, input.order_id)
        .await?
        .ok_or_else(|| not_found("Order", input.order_id))?;

    if let Some(step_id) = input.routing_step_id {
        let step = RoutingStepRepo::find_by_id(&state.pool, auth.workspace_id, step_id)
            .await?
            .ok_or_else(|| not_found("RoutingStep", step_id))?;
        if step.order_id != input.order_id {
            return Err(AppError::BadRequest(
                "Routing step belongs to a different order".to_string(),
            ));
        }
    }

    if let Some(machine_id) = input.machine_id {
        let machine = MachineRepo::find_by_id(&state.pool, auth.workspace_id, machine_id)
            .await?
            .ok_or_else(|| not_found("Machine", machine_id))?;
        printing::validate_machine_workcenter(&machine.workcenter, &input.workcenter)
            .map_err(AppError::BadRequest)?;
    }

    let run = PrintRunRepo::create(&state.pool, auth.workspace_id, &input, auth.user_id).await?;

    tracing::info!(run_id = run.id, order_id = run.order_id, method = %run.method, "Print run created");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "print_run",
            resource_id: run.id,
            event_type: "print_run.created",
        },
        serde_json::json!({ "order_id": run.order_id, "method": run.method }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: run })))
}

/// GET /api/v1/printing/runs
pub async fn list_runs(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PrintRunQuery>,
) -> AppResult<Json<DataResponse<Vec<PrintRun>>>> {
    let limit = pagination::clamp_limit(params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
    let offset = pagination::clamp_offset(params.offset);
    let runs = PrintRunRepo::list(
        &state.pool,
        auth.workspace_id,
        params.status.as_deref(),
        params.method.as_deref(),
        params.order_id,
        limit,
        offset,
    )
    .await?;
    Ok(Json(DataResponse { data: runs }))
}

/// GET /api/v1/printing/runs/{id}
pub async fn get_run(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PrintRunDetail>>> {
    let run = load_run(&state, auth.workspace_id, id).await?;
    let materials = PrintRunRepo::materials(&state.pool, id).await?;
    let outputs = PrintRunRepo::outputs(&state.pool, id).await?;
    let rejects = PrintRunRepo::rejects(&state.pool, id).await?;
    let logs = PrintRunRepo::logs(&state.pool, id).await?;

    Ok(Json(DataResponse {
        data: PrintRunDetail {
            run,
            materials,
            outputs,
            rejects,
            logs,
        },
    }))
}

/// Shared body of the run status endpoints. Refused transitions are 422.
async fn transition(
    auth: &AuthUser,
    state: &AppState,
    id: DbId,
    to: &str,
) -> AppResult<PrintRun> {
    let run = load_run(state, auth.workspace_id, id).await?;
    state_machine::validate_transition(&run.status, to)
        .map_err(|e| AppError::Core(CoreError::InvalidState(e)))?;

    let updated = PrintRunRepo::set_status(&state.pool, id, &run.status, to)
        .await?
        .ok_or_else(|| status_changed("PrintRun", id, &run.status))?;

    if to == STATUS_DONE {
        if let Some(step_id) = updated.routing_step_id {
            RoutingStepRepo::complete(&state.pool, auth.workspace_id, step_id).await?;
        }
    }

    tracing::info!(run_id = id, from = %run.status, to, "Print run status changed");
    activity::record(
        state,
        auth,
        Activity {
            action: ACTION_STATUS_CHANGE,
            resource: "print_run",
            resource_id: id,
            event_type: "print_run.status_changed",
        },
        serde_json::json!({ "from": run.status, "to": to }),
    )
    .await;

    Ok(updated)
}

/// POST /api/v1/printing/runs/{id}/start
pub async fn start_run(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PrintRun>>> {
    let run = transition(&auth, &state, id, STATUS_IN_PROGRESS).await?;
    Ok(Json(DataResponse { data: run }))
}

/// POST /api/v1/printing/runs/{id}/pause
pub async fn pause_run(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PrintRun>>> {
    let run = transition(&auth, &state, id, STATUS_PAUSED).await?;
    Ok(Json(DataResponse { data: run }))
}

/// POST /api/v1/printing/runs/{id}/complete
pub async fn complete_run(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PrintRun>>> {
    let run = transition(&auth, &state, id, STATUS_DONE).await?;
    Ok(Json(DataResponse { data: run }))
}

/// POST /api/v1/printing/runs/{id}/cancel
pub async fn cancel_run(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PrintRun>>> {
    let run = transition(&auth, &state, id, STATUS_CANCELLED).await?;
    Ok(Json(DataResponse { data: run }))
}

// ---------------------------------------------------------------------------
// Child records
// ---------------------------------------------------------------------------

/// POST /api/v1/printing/runs/{id}/materials
pub async fn add_material(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreatePrintRunMaterial>,
) -> AppResult<(StatusCode, Json<DataResponse<PrintRunMaterial>>)> {
    input.validate()?;
    load_run(&state, auth.workspace_id, id).await?;
    let material = PrintRunRepo::add_material(&state.pool, id, &input).await?;
    tracing::debug!(run_id = id, item = %material.item_name, "Print material recorded");
    Ok((StatusCode::CREATED, Json(DataResponse { data: material })))
}

/// POST /api/v1/printing/runs/{id}/outputs
pub async fn add_output(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreatePrintRunOutput>,
) -> AppResult<(StatusCode, Json<DataResponse<PrintRunOutput>>)> {
    input.validate()?;
    load_run(&state, auth.workspace_id, id).await?;
    let output = PrintRunRepo::add_output(&state.pool, id, &input).await?;
    tracing::debug!(run_id = id, good = output.qty_good, reject = output.qty_reject, "Print output recorded");
    Ok((StatusCode::CREATED, Json(DataResponse { data: output })))
}

/// POST /api/v1/printing/runs/{id}/rejects
pub async fn add_reject(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreatePrintReject>,
) -> AppResult<(StatusCode, Json<DataResponse<PrintReject>>)> {
    input.validate()?;
    printing::validate_cost_attribution(&input.cost_attribution).map_err(AppError::BadRequest)?;
    load_run(&state, auth.workspace_id, id).await?;

    let reject = PrintRunRepo::add_reject(&state.pool, id, &input).await?;

    tracing::info!(run_id = id, reason = %reject.reason_code, qty = reject.qty, "Print reject recorded");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "print_reject",
            resource_id: reject.id,
            event_type: "print_run.reject_recorded",
        },
        serde_json::json!({
            "run_id": id,
            "reason_code": reject.reason_code,
            "qty": reject.qty,
            "cost_attribution": reject.cost_attribution,
        }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: reject })))
}

/// POST /api/v1/printing/runs/{id}/logs
pub async fn add_log(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreatePrintMethodLog>,
) -> AppResult<(StatusCode, Json<DataResponse<PrintMethodLog>>)> {
    let run = load_run(&state, auth.workspace_id, id).await?;
    printing::validate_method_log(&run.method, &input.log_type, &input.data)
        .map_err(AppError::BadRequest)?;

    let log = PrintRunRepo::add_log(&state.pool, id, &input.log_type, &input.data).await?;
    tracing::debug!(run_id = id, log_type = %log.log_type, "Print method log recorded");
    Ok((StatusCode::CREATED, Json(DataResponse { data: log })))
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// POST /api/v1/printing/runs/{id}/efficiency-check
pub async fn efficiency(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<EfficiencyCheck>>> {
    let run = load_run(&state, auth.workspace_id, id).await?;
    let (output, rejects) = PrintRunRepo::output_totals(&state.pool, id).await?;

    let primary = match primary_log_type(&run.method) {
        Some(log_type) => PrintRunRepo::first_log(&state.pool, id, log_type).await?,
        None => None,
    };

    let check = efficiency_check(&run.method, output, rejects, primary.as_ref().map(|l| &l.data));
    Ok(Json(DataResponse { data: check }))
}

/// GET /api/v1/printing/dashboard
pub async fn dashboard(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<PrintingDashboard>>> {
    let now = Utc::now();
    let ws = auth.workspace_id;

    let active_runs = PrintRunRepo::count_by_status(&state.pool, ws, STATUS_IN_PROGRESS).await?;
    let runs_today = PrintRunRepo::count_created_since(&state.pool, ws, start_of_day(now)).await?;
    let method_counts = PrintRunRepo::method_counts_since(
        &state.pool,
        ws,
        now - Duration::days(DASHBOARD_METHOD_WINDOW_DAYS),
    )
    .await?;
    let recent_rejects =
        PrintRunRepo::recent_rejects(&state.pool, ws, DASHBOARD_RECENT_REJECTS).await?;

    Ok(Json(DataResponse {
        data: PrintingDashboard {
            active_runs,
            runs_today,
            method_counts,
            recent_rejects,
        },
    }))
}
