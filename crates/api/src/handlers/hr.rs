//! Handlers for `/hr`: employees and attendance.

use ashley_core::audit::{ACTION_CREATE, ACTION_UPDATE};
use ashley_core::hr::{attendance_rate, validate_attendance_status, validate_salary_type, validate_time_range};
use ashley_core::pagination::{self, clamp_limit, clamp_offset, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use ashley_core::reporting::Period;
use ashley_core::types::DbId;
use ashley_db::models::hr::{
    AttendanceCounts, AttendanceLog, AttendanceQuery, AttendanceStats, CreateEmployee, Employee,
    EmployeeDetail, EmployeeQuery, UpdateEmployee, UpsertAttendance,
};
use ashley_db::repositories::{AttendanceRepo, EmployeeRepo};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Datelike, Utc};
use serde::Serialize;
use validator::Validate;

use crate::activity::{self, Activity};
use crate::error::{not_found, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::PeriodParams;
use crate::response::{DataResponse, PaginatedResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AttendanceSummary {
    pub period: &'static str,
    #[serde(flatten)]
    pub stats: AttendanceStats,
}

fn stats(counts: AttendanceCounts) -> AttendanceStats {
    let rate = attendance_rate(counts.present, counts.late, counts.total);
    AttendanceStats {
        counts,
        attendance_rate: rate,
    }
}

// ---------------------------------------------------------------------------
// Employees
// ---------------------------------------------------------------------------

/// GET /api/v1/hr/employees
pub async fn list_employees(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<EmployeeQuery>,
) -> AppResult<Json<PaginatedResponse<Employee>>> {
    let (page, limit, offset) = pagination::resolve(params.page, params.limit);
    let (department, position, search) = (
        params.department.as_deref(),
        params.position.as_deref(),
        params.search.as_deref(),
    );

    let employees = EmployeeRepo::list(
        &state.pool,
        auth.workspace_id,
        department,
        position,
        params.is_active,
        search,
        limit,
        offset,
    )
    .await?;
    let total = EmployeeRepo::count(
        &state.pool,
        auth.workspace_id,
        department,
        position,
        params.is_active,
        search,
    )
    .await?;

    Ok(Json(PaginatedResponse::new(employees, page, limit, total)))
}

/// POST /api/v1/hr/employees
pub async fn create_employee(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateEmployee>,
) -> AppResult<(StatusCode, Json<DataResponse<Employee>>)> {
    input.validate()?;
    validate_salary_type(&input.salary_type).map_err(AppError::BadRequest)?;

    let employee = EmployeeRepo::create(&state.pool, auth.workspace_id, &input).await?;

    tracing::info!(
        employee_id = employee.id,
        employee_number = %employee.employee_number,
        "Employee created"
    );
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "employee",
            resource_id: employee.id,
            event_type: "employee.created",
        },
        serde_json::json!({
            "employee_number": employee.employee_number,
            "department": employee.department,
            "salary_type": employee.salary_type,
        }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: employee })))
}

/// GET /api/v1/hr/employees/{id}
pub async fn get_employee(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<EmployeeDetail>>> {
    let employee = EmployeeRepo::find_by_id(&state.pool, auth.workspace_id, id)
        .await?
        .ok_or_else(|| not_found("Employee", id))?;

    let today = Utc::now().date_naive();
    let month_start = today.with_day(1).unwrap_or(today);
    let counts =
        AttendanceRepo::counts_since(&state.pool, auth.workspace_id, Some(id), month_start).await?;

    Ok(Json(DataResponse {
        data: EmployeeDetail {
            employee,
            attendance_this_month: stats(counts),
        },
    }))
}

/// PUT /api/v1/hr/employees/{id}
pub async fn update_employee(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateEmployee>,
) -> AppResult<Json<DataResponse<Employee>>> {
    input.validate()?;
    if let Some(salary_type) = &input.salary_type {
        validate_salary_type(salary_type).map_err(AppError::BadRequest)?;
    }

    let employee = EmployeeRepo::update(&state.pool, auth.workspace_id, id, &input)
        .await?
        .ok_or_else(|| not_found("Employee", id))?;

    tracing::info!(employee_id = id, "Employee updated");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_UPDATE,
            resource: "employee",
            resource_id: id,
            event_type: "employee.updated",
        },
        serde_json::json!({
            "department": employee.department,
            "position": employee.position,
            "is_active": employee.is_active,
        }),
    )
    .await;

    Ok(Json(DataResponse { data: employee }))
}

// ---------------------------------------------------------------------------
// Attendance
// ---------------------------------------------------------------------------

/// POST /api/v1/hr/attendance
///
/// One record per employee and day; a second post for the same day
/// replaces the first.
pub async fn upsert_attendance(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpsertAttendance>,
) -> AppResult<Json<DataResponse<AttendanceLog>>> {
    validate_attendance_status(&input.status).map_err(AppError::BadRequest)?;
    validate_time_range(input.time_in, input.time_out).map_err(AppError::BadRequest)?;
    EmployeeRepo::find_by_id(&state.pool, auth.workspace_id, input.employee_id)
        .await?
        .ok_or_else(|| not_found("Employee", input.employee_id))?;

    let log = AttendanceRepo::upsert(&state.pool, auth.workspace_id, &input).await?;

    tracing::info!(
        employee_id = log.employee_id,
        date = %log.date,
        status = %log.status,
        "Attendance recorded"
    );
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_UPDATE,
            resource: "attendance",
            resource_id: log.id,
            event_type: "attendance.recorded",
        },
        serde_json::json!({
            "employee_id": log.employee_id,
            "date": log.date,
            "status": log.status,
        }),
    )
    .await;

    Ok(Json(DataResponse { data: log }))
}

/// GET /api/v1/hr/attendance
pub async fn list_attendance(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<AttendanceQuery>,
) -> AppResult<Json<DataResponse<Vec<AttendanceLog>>>> {
    if let (Some(from), Some(to)) = (params.date_from, params.date_to) {
        if to < from {
            return Err(AppError::BadRequest(
                "date_to must not be before date_from".to_string(),
            ));
        }
    }
    let logs = AttendanceRepo::list(
        &state.pool,
        auth.workspace_id,
        params.employee_id,
        params.date_from,
        params.date_to,
        clamp_limit(params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE),
        clamp_offset(params.offset),
    )
    .await?;
    Ok(Json(DataResponse { data: logs }))
}

/// GET /api/v1/hr/attendance/summary?period=today|week|month
pub async fn attendance_summary(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PeriodParams>,
) -> AppResult<Json<DataResponse<AttendanceSummary>>> {
    let period = params.resolve(Period::Today)?;
    let from = period.start(Utc::now()).date_naive();
    let counts = AttendanceRepo::counts_since(&state.pool, auth.workspace_id, None, from).await?;

    Ok(Json(DataResponse {
        data: AttendanceSummary {
            period: period.as_str(),
            stats: stats(counts),
        },
    }))
}
