//! Handlers for `/sewing`: operations, piece rates, sewing runs and operator
//! reporting.

use std::collections::HashMap;

use ashley_core::audit::{ACTION_CREATE, ACTION_STATUS_CHANGE};
use ashley_core::money::round2;
use ashley_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use ashley_core::reporting::start_of_day;
use ashley_core::sewing::{
    analyse_run, clamp_window, complete_run, operator_pay, resolve_piece_rate, state_machine,
    validate_rate_window, validate_standard_minutes, EfficiencyAnalysis, OperatorInsights,
    OperatorPay, RateCandidate, DEFAULT_EFFICIENCY_WINDOW_DAYS, DEFAULT_PERFORMANCE_WINDOW_DAYS,
    STATUS_DONE, STATUS_IN_PROGRESS, STATUS_PAUSED,
};
use ashley_core::types::{Date, DbId};
use ashley_db::models::sewing::{
    CompleteSewingRun, CreatePieceRate, CreateSewingOperation, CreateSewingRun,
    OperationQuery, OperatorAggregate, OperatorDailyBreakdown, OperatorOperationBreakdown,
    OperatorPayrollRequest, PieceRate, PieceRateQuery, RunCompletionRecord, SewingDayTotals,
    SewingOperation, SewingRun, SewingRunListItem, SewingRunQuery, WindowQuery,
};
use ashley_db::repositories::{
    BundleRepo, EmployeeRepo, OrderRepo, PieceRateRepo, RoutingStepRepo, SewingOperationRepo,
    SewingRunRepo,
};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use serde::Serialize;
use validator::Validate;

use crate::activity::{self, Activity};
use crate::error::{not_found, status_changed, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

const DASHBOARD_TOP_OPERATORS: i64 = 5;
const DASHBOARD_RECENT_REJECTS: i64 = 10;

#[derive(Debug, Serialize)]
pub struct SewingDashboard {
    #[serde(flatten)]
    pub today: SewingDayTotals,
    pub top_operators: Vec<OperatorAggregate>,
    pub recent_rejects: Vec<SewingRunListItem>,
}

#[derive(Debug, Serialize)]
pub struct OperatorEfficiency {
    #[serde(flatten)]
    pub totals: OperatorAggregate,
    pub operations: Vec<OperatorOperationBreakdown>,
    pub daily: Vec<OperatorDailyBreakdown>,
}

#[derive(Debug, Serialize)]
pub struct OperatorEfficiencyReport {
    pub days: i64,
    pub operators: Vec<OperatorEfficiency>,
}

#[derive(Debug, Serialize)]
pub struct OperatorPayLine {
    pub operator_id: DbId,
    pub operator_name: String,
    pub salary_type: String,
    pub piece_count: i64,
    pub days_worked: i64,
    #[serde(flatten)]
    pub pay: OperatorPay,
}

#[derive(Debug, Default, Serialize)]
pub struct OperatorPayTotals {
    pub operators: usize,
    pub piece_earnings: f64,
    pub base_pay: f64,
    pub gross_pay: f64,
    pub total_hours: f64,
}

#[derive(Debug, Serialize)]
pub struct OperatorPayroll {
    pub period_start: Date,
    pub period_end: Date,
    pub operators: Vec<OperatorPayLine>,
    pub totals: OperatorPayTotals,
}

#[derive(Debug, Serialize)]
pub struct OperatorPerformance {
    pub operator_id: DbId,
    pub days: i64,
    pub daily: Vec<OperatorDailyBreakdown>,
}

async fn load_run(state: &AppState, workspace_id: DbId, id: DbId) -> AppResult<SewingRun> {
    SewingRunRepo::find_by_id(&state.pool, workspace_id, id)
        .await?
        .ok_or_else(|| not_found("SewingRun", id))
}

// ---------------------------------------------------------------------------
// Operations and piece rates
// ---------------------------------------------------------------------------

/// POST /api/v1/sewing/operations
pub async fn create_operation(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateSewingOperation>,
) -> AppResult<(StatusCode, Json<DataResponse<SewingOperation>>)> {
    input.validate()?;
    validate_standard_minutes(input.standard_minutes).map_err(AppError::BadRequest)?;

    let op = SewingOperationRepo::create(&state.pool, auth.workspace_id, &input).await?;

    tracing::info!(operation_id = op.id, name = %op.name, "Sewing operation created");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "sewing_operation",
            resource_id: op.id,
            event_type: "sewing_operation.created",
        },
        serde_json::json!({ "name": op.name, "product_type": op.product_type }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: op })))
}

/// GET /api/v1/sewing/operations?product_type=
pub async fn list_operations(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<OperationQuery>,
) -> AppResult<Json<DataResponse<Vec<SewingOperation>>>> {
    let ops =
        SewingOperationRepo::list(&state.pool, auth.workspace_id, params.product_type.as_deref())
            .await?;
    Ok(Json(DataResponse { data: ops }))
}

/// POST /api/v1/sewing/piece-rates
pub async fn create_piece_rate(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePieceRate>,
) -> AppResult<(StatusCode, Json<DataResponse<PieceRate>>)> {
    input.validate()?;
    validate_rate_window(input.effective_from, input.effective_to).map_err(AppError::BadRequest)?;

    let rate = PieceRateRepo::create(&state.pool, auth.workspace_id, &input).await?;

    tracing::info!(rate_id = rate.id, operation = %rate.operation_name, rate = rate.rate, "Piece rate created");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "piece_rate",
            resource_id: rate.id,
            event_type: "piece_rate.created",
        },
        serde_json::json!({
            "operation_name": rate.operation_name,
            "brand_id": rate.brand_id,
            "rate": rate.rate,
        }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: rate })))
}

/// GET /api/v1/sewing/piece-rates
pub async fn list_piece_rates(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PieceRateQuery>,
) -> AppResult<Json<DataResponse<Vec<PieceRate>>>> {
    let rates = PieceRateRepo::list(
        &state.pool,
        auth.workspace_id,
        params.operation_name.as_deref(),
        params.brand_id,
    )
    .await?;
    Ok(Json(DataResponse { data: rates }))
}

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

/// POST /api/v1/sewing/runs
pub async fn create_run(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateSewingRun>,
) -> AppResult<(StatusCode, Json<DataResponse<SewingRun>>)> {
    if input.operation_name.trim().is_empty() {
        return Err(AppError::BadRequest("operation_name is required".to_string()));
    }
    OrderRepo::find_by_id(&state.pool, auth.workspace_id, input.order_id)
        .await?
        .ok_or_else(|| not_found("Order", input.order_id))?;
    EmployeeRepo::find_by_id(&state.pool, auth.workspace_id, input.operator_id)
        .await?
        .ok_or_else(|| not_found("Employee", input.operator_id))?;

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
    if let Some(bundle_id) = input.bundle_id {
        let bundle = BundleRepo::find_by_id(&state.pool, auth.workspace_id, bundle_id)
            .await?
            .ok_or_else(|| not_found("Bundle", bundle_id))?;
        if bundle.order_id != input.order_id {
            return Err(AppError::BadRequest("Bundle belongs to a different order".to_string()));
        }
    }

    let run = SewingRunRepo::create(&state.pool, auth.workspace_id, &input, auth.user_id).await?;

    tracing::info!(run_id = run.id, operator_id = run.operator_id, operation = %run.operation_name, "Sewing run created");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "sewing_run",
            resource_id: run.id,
            event_type: "sewing_run.created",
        },
        serde_json::json!({
            "order_id": run.order_id,
            "operator_id": run.operator_id,
            "operation_name": run.operation_name,
        }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: run })))
}

/// GET /api/v1/sewing/runs
pub async fn list_runs(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<SewingRunQuery>,
) -> AppResult<Json<DataResponse<Vec<SewingRunListItem>>>> {
    let runs = SewingRunRepo::list(
        &state.pool,
        auth.workspace_id,
        params.status.as_deref(),
        params.operator_id,
        params.order_id,
        clamp_limit(params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE),
        clamp_offset(params.offset),
    )
    .await?;
    Ok(Json(DataResponse { data: runs }))
}

/// GET /api/v1/sewing/runs/{id}
pub async fn get_run(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<SewingRun>>> {
    let run = load_run(&state, auth.workspace_id, id).await?;
    Ok(Json(DataResponse { data: run }))
}

async fn record_transition(state: &AppState, auth: &AuthUser, run: &SewingRun, from: &str) {
    tracing::info!(run_id = run.id, from, to = %run.status, "Sewing run status changed");
    activity::record(
        state,
        auth,
        Activity {
            action: ACTION_STATUS_CHANGE,
            resource: "sewing_run",
            resource_id: run.id,
            event_type: "sewing_run.status_changed",
        },
        serde_json::json!({ "from": from, "to": run.status }),
    )
    .await;
}

/// POST /api/v1/sewing/runs/{id}/start
pub async fn start_run(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<SewingRun>>> {
    let run = load_run(&state, auth.workspace_id, id).await?;
    state_machine::validate_transition(&run.status, STATUS_IN_PROGRESS)
        .map_err(AppError::BadRequest)?;

    let updated = SewingRunRepo::start(&state.pool, id)
        .await?
        .ok_or_else(|| status_changed("SewingRun", id, &run.status))?;
    record_transition(&state, &auth, &updated, &run.status).await;
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/sewing/runs/{id}/pause
pub async fn pause_run(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<SewingRun>>> {
    let run = load_run(&state, auth.workspace_id, id).await?;
    state_machine::validate_transition(&run.status, STATUS_PAUSED).map_err(AppError::BadRequest)?;

    let updated = SewingRunRepo::pause(&state.pool, id)
        .await?
        .ok_or_else(|| status_changed("SewingRun", id, &run.status))?;
    record_transition(&state, &auth, &updated, &run.status).await;
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/sewing/runs/{id}/resume
pub async fn resume_run(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<SewingRun>>> {
    let run = load_run(&state, auth.workspace_id, id).await?;
    if run.status != STATUS_PAUSED {
        return Err(AppError::BadRequest(format!(
            "Cannot resume a sewing run in status {}",
            run.status
        )));
    }

    let updated = SewingRunRepo::resume(&state.pool, id)
        .await?
        .ok_or_else(|| status_changed("SewingRun", id, &run.status))?;
    record_transition(&state, &auth, &updated, &run.status).await;
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/sewing/runs/{id}/complete
///
/// Computes actual and earned minutes, efficiency and piece-rate pay. The
/// piece rate resolves from the operation first, then the order's brand,
/// then the workspace-wide rate.
pub async fn complete_sewing_run(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CompleteSewingRun>,
) -> AppResult<Json<DataResponse<SewingRun>>> {
    input.validate()?;
    let run = load_run(&state, auth.workspace_id, id).await?;
    state_machine::validate_transition(&run.status, STATUS_DONE).map_err(AppError::BadRequest)?;

    let operation =
        SewingOperationRepo::find_by_name(&state.pool, auth.workspace_id, &run.operation_name).await?;
    let order = OrderRepo::find_by_id(&state.pool, auth.workspace_id, run.order_id).await?;
    let candidates: Vec<RateCandidate> =
        PieceRateRepo::for_operation(&state.pool, auth.workspace_id, &run.operation_name)
            .await?
            .into_iter()
            .map(|r| RateCandidate {
                brand_id: r.brand_id,
                rate: r.rate,
                effective_from: r.effective_from,
                effective_to: r.effective_to,
            })
            .collect();

    let now = Utc::now();
    let rate = resolve_piece_rate(
        operation.as_ref().and_then(|o| o.piece_rate),
        order.map(|o| o.brand_id),
        &candidates,
        now.date_naive(),
    );
    let metrics = complete_run(
        run.started_at,
        now,
        run.paused_minutes,
        input.qty_good,
        operation.as_ref().map(|o| o.standard_minutes),
        rate,
    );

    let record = RunCompletionRecord {
        ended_at: now,
        qty_good: input.qty_good,
        qty_reject: input.qty_reject,
        reject_reason: input.reject_reason,
        reject_photo_url: input.reject_photo_url,
        actual_minutes: metrics.actual_minutes,
        earned_minutes: metrics.earned_minutes,
        efficiency_pct: metrics.efficiency_pct,
        piece_rate_pay: metrics.piece_rate_pay,
    };
    let updated = SewingRunRepo::complete(&state.pool, id, &record)
        .await?
        .ok_or_else(|| status_changed("SewingRun", id, &run.status))?;

    if let Some(step_id) = updated.routing_step_id {
        RoutingStepRepo::complete(&state.pool, auth.workspace_id, step_id).await?;
    }

    tracing::info!(
        run_id = id,
        qty_good = record.qty_good,
        efficiency = ?record.efficiency_pct,
        "Sewing run completed"
    );
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_STATUS_CHANGE,
            resource: "sewing_run",
            resource_id: id,
            event_type: "sewing_run.completed",
        },
        serde_json::json!({
            "from": run.status,
            "to": STATUS_DONE,
            "qty_good": record.qty_good,
            "qty_reject": record.qty_reject,
            "efficiency_pct": record.efficiency_pct,
            "piece_rate_pay": record.piece_rate_pay,
        }),
    )
    .await;

    Ok(Json(DataResponse { data: updated }))
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

/// GET /api/v1/sewing/dashboard
pub async fn dashboard(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<SewingDashboard>>> {
    let today = start_of_day(Utc::now());
    let ws = auth.workspace_id;

    let totals = SewingRunRepo::day_totals(&state.pool, ws, today).await?;
    let top_operators =
        SewingRunRepo::operator_aggregates(&state.pool, ws, today, Some(DASHBOARD_TOP_OPERATORS))
            .await?;
    let recent_rejects =
        SewingRunRepo::recent_with_rejects(&state.pool, ws, DASHBOARD_RECENT_REJECTS).await?;

    Ok(Json(DataResponse {
        data: SewingDashboard {
            today: totals,
            top_operators,
            recent_rejects,
        },
    }))
}

/// POST /api/v1/sewing/runs/{id}/efficiency-analysis
pub async fn efficiency_analysis(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<EfficiencyAnalysis>>> {
    let run = load_run(&state, auth.workspace_id, id).await?;
    if run.status != STATUS_DONE {
        return Err(AppError::BadRequest(
            "Efficiency analysis requires a completed run".to_string(),
        ));
    }

    let (total_runs, total_pieces, total_rejects, total_earned, avg_efficiency) =
        SewingRunRepo::operator_lifetime(&state.pool, auth.workspace_id, run.operator_id).await?;

    let analysis = analyse_run(
        run.efficiency_pct,
        run.qty_good.unwrap_or(0),
        run.qty_reject.unwrap_or(0),
        avg_efficiency,
        OperatorInsights {
            total_runs,
            total_pieces,
            total_rejects,
            total_earned: round2(total_earned),
        },
    );
    Ok(Json(DataResponse { data: analysis }))
}

/// GET /api/v1/sewing/operators/efficiency?days=
pub async fn operators_efficiency(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<WindowQuery>,
) -> AppResult<Json<DataResponse<OperatorEfficiencyReport>>> {
    let days = clamp_window(params.days, DEFAULT_EFFICIENCY_WINDOW_DAYS);
    let since = Utc::now() - Duration::days(days);
    let ws = auth.workspace_id;

    let aggregates = SewingRunRepo::operator_aggregates(&state.pool, ws, since, None).await?;

    let mut operations: HashMap<DbId, Vec<OperatorOperationBreakdown>> = HashMap::new();
    for row in SewingRunRepo::operation_breakdown(&state.pool, ws, since).await? {
        operations.entry(row.operator_id).or_default().push(row);
    }
    let mut daily: HashMap<DbId, Vec<OperatorDailyBreakdown>> = HashMap::new();
    for row in SewingRunRepo::daily_breakdown(&state.pool, ws, None, since).await? {
        daily.entry(row.operator_id).or_default().push(row);
    }

    let operators = aggregates
        .into_iter()
        .map(|totals| OperatorEfficiency {
            operations: operations.remove(&totals.operator_id).unwrap_or_default(),
            daily: daily.remove(&totals.operator_id).unwrap_or_default(),
            totals,
        })
        .collect();

    Ok(Json(DataResponse {
        data: OperatorEfficiencyReport { days, operators },
    }))
}

/// POST /api/v1/sewing/operators/payroll
pub async fn operators_payroll(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<OperatorPayrollRequest>,
) -> AppResult<Json<DataResponse<OperatorPayroll>>> {
    if input.period_end < input.period_start {
        return Err(AppError::BadRequest(
            "period_end must not be before period_start".to_string(),
        ));
    }

    let rows = SewingRunRepo::operator_period_totals(
        &state.pool,
        auth.workspace_id,
        input.period_start,
        input.period_end,
        input.operator_ids.as_deref(),
    )
    .await?;

    let mut totals = OperatorPayTotals::default();
    let operators: Vec<OperatorPayLine> = rows
        .into_iter()
        .map(|row| {
            let pay = operator_pay(
                &row.salary_type,
                row.base_salary,
                row.days_worked,
                row.piece_earnings,
                row.total_minutes,
            );
            totals.piece_earnings += pay.piece_earnings;
            totals.base_pay += pay.base_pay;
            totals.gross_pay += pay.gross_pay;
            totals.total_hours += pay.total_hours;
            OperatorPayLine {
                operator_id: row.operator_id,
                operator_name: row.operator_name,
                salary_type: row.salary_type,
                piece_count: row.piece_count,
                days_worked: row.days_worked,
                pay,
            }
        })
        .collect();

    totals.operators = operators.len();
    totals.piece_earnings = round2(totals.piece_earnings);
    totals.base_pay = round2(totals.base_pay);
    totals.gross_pay = round2(totals.gross_pay);
    totals.total_hours = round2(totals.total_hours);

    Ok(Json(DataResponse {
        data: OperatorPayroll {
            period_start: input.period_start,
            period_end: input.period_end,
            operators,
            totals,
        },
    }))
}

/// GET /api/v1/sewing/operators/{id}/performance?days=
pub async fn operator_performance(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<WindowQuery>,
) -> AppResult<Json<DataResponse<OperatorPerformance>>> {
    EmployeeRepo::find_by_id(&state.pool, auth.workspace_id, id)
        .await?
        .ok_or_else(|| not_found("Employee", id))?;

    let days = clamp_window(params.days, DEFAULT_PERFORMANCE_WINDOW_DAYS);
    let since = Utc::now() - Duration::days(days);
    let daily = SewingRunRepo::daily_breakdown(&state.pool, auth.workspace_id, Some(id), since).await?;
    if daily.is_empty() {
        return Err(not_found("OperatorPerformance", id));
    }

    Ok(Json(DataResponse {
        data: OperatorPerformance {
            operator_id: id,
            days,
            daily,
        },
    }))
}
