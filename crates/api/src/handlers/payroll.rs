//! Handlers for `/hr/payroll`: semi-monthly payroll runs and CSV export.

use std::collections::HashMap;

use ashley_core::audit::{ACTION_CREATE, ACTION_STATUS_CHANGE};
use ashley_core::payroll::{
    self, compute_item, export_csv, export_file_name, state_machine, AttendanceDay, CsvRow,
    PayrollInput,
};
use ashley_core::types::DbId;
use ashley_db::models::payroll::{
    CreatePayroll, NewPayrollItem, PayrollDetail, PayrollPeriod, PayrollQuery, PieceTotals,
    UpdatePayrollStatus,
};
use ashley_db::repositories::{EmployeeRepo, PayrollRepo};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use crate::activity::{self, Activity};
use crate::error::{not_found, status_changed, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireManager;
use crate::response::DataResponse;
use crate::state::AppState;

async fn load(state: &AppState, workspace_id: DbId, id: DbId) -> AppResult<PayrollPeriod> {
    PayrollRepo::find_by_id(&state.pool, workspace_id, id)
        .await?
        .ok_or_else(|| not_found("PayrollPeriod", id))
}

/// POST /api/v1/hr/payroll
///
/// Computes one item per active employee from attendance and completed
/// sewing runs inside the period, then stores the run and items together.
pub async fn create_payroll(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePayroll>,
) -> AppResult<(StatusCode, Json<DataResponse<PayrollPeriod>>)> {
    payroll::validate_period(input.period_start, input.period_end).map_err(AppError::BadRequest)?;
    payroll::validate_cutoff_type(&input.cutoff_type).map_err(AppError::BadRequest)?;

    let (ws, start, end) = (auth.workspace_id, input.period_start, input.period_end);
    let employees = EmployeeRepo::list_active(&state.pool, ws).await?;

    let mut attendance: HashMap<DbId, Vec<AttendanceDay>> = HashMap::new();
    for log in PayrollRepo::attendance(&state.pool, ws, start, end).await? {
        attendance.entry(log.employee_id).or_default().push(AttendanceDay {
            status: log.status,
            time_in: log.time_in,
            time_out: log.time_out,
        });
    }
    let pieces: HashMap<DbId, PieceTotals> = PayrollRepo::piece_totals(&state.pool, ws, start, end)
        .await?
        .into_iter()
        .map(|p| (p.employee_id, p))
        .collect();

    let items: Vec<NewPayrollItem> = employees
        .iter()
        .map(|e| {
            let days = attendance.get(&e.id).map(Vec::as_slice).unwrap_or_default();
            let piece = pieces.get(&e.id).cloned().unwrap_or_default();
            NewPayrollItem {
                employee_id: e.id,
                calc: compute_item(&PayrollInput {
                    salary_type: &e.salary_type,
                    base_salary: e.base_salary,
                    attendance: days,
                    piece_count: piece.piece_count,
                    piece_earnings: piece.piece_earnings,
                }),
            }
        })
        .collect();

    let period = PayrollRepo::create(&state.pool, ws, &input, &items, auth.user_id).await?;

    tracing::info!(
        payroll_id = period.id,
        employees = period.employee_count,
        total_net = period.total_net,
        "Payroll run created"
    );
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "payroll",
            resource_id: period.id,
            event_type: "payroll.created",
        },
        serde_json::json!({
            "period_start": period.period_start,
            "period_end": period.period_end,
            "employee_count": period.employee_count,
            "total_net": period.total_net,
        }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: period })))
}

/// GET /api/v1/hr/payroll?status=&year=
pub async fn list_payroll(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PayrollQuery>,
) -> AppResult<Json<DataResponse<Vec<PayrollPeriod>>>> {
    if let Some(status) = &params.status {
        payroll::validate_status(status).map_err(AppError::BadRequest)?;
    }
    let periods =
        PayrollRepo::list(&state.pool, auth.workspace_id, params.status.as_deref(), params.year)
            .await?;
    Ok(Json(DataResponse { data: periods }))
}

/// GET /api/v1/hr/payroll/{id}
pub async fn get_payroll(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PayrollDetail>>> {
    let period = load(&state, auth.workspace_id, id).await?;
    let items = PayrollRepo::items(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: PayrollDetail { period, items },
    }))
}

/// PUT /api/v1/hr/payroll/{id}
pub async fn update_payroll(
    RequireManager(auth): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdatePayrollStatus>,
) -> AppResult<Json<DataResponse<PayrollPeriod>>> {
    payroll::validate_status(&input.status).map_err(AppError::BadRequest)?;
    let existing = load(&state, auth.workspace_id, id).await?;
    state_machine::validate_transition(&existing.status, &input.status)
        .map_err(AppError::BadRequest)?;

    let updated = PayrollRepo::update_status(
        &state.pool,
        id,
        &existing.status,
        &input.status,
        input.approval_notes.as_deref(),
        auth.user_id,
    )
    .await?
    .ok_or_else(|| status_changed("PayrollPeriod", id, &existing.status))?;

    tracing::info!(payroll_id = id, from = %existing.status, to = %updated.status, "Payroll status changed");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_STATUS_CHANGE,
            resource: "payroll",
            resource_id: id,
            event_type: "payroll.status_changed",
        },
        serde_json::json!({
            "from": existing.status,
            "to": updated.status,
            "approval_notes": updated.approval_notes,
        }),
    )
    .await;

    Ok(Json(DataResponse { data: updated }))
}

/// GET /api/v1/hr/payroll/{id}/export
pub async fn export_payroll(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let period = load(&state, auth.workspace_id, id).await?;
    let rows: Vec<CsvRow> = PayrollRepo::items(&state.pool, id)
        .await?
        .into_iter()
        .map(|i| CsvRow {
            employee_name: i.employee_name,
            position: i.position,
            department: i.department,
            regular_hours: i.item.regular_hours,
            overtime_hours: i.item.overtime_hours,
            piece_count: i.item.piece_count,
            gross_pay: i.item.gross_pay,
            deductions: i.item.total_deductions,
            net_pay: i.item.net_pay,
        })
        .collect();

    let csv = export_csv(&rows);
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_file_name(period.period_start, period.period_end)
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}
