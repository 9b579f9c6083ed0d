//! Route definitions for the `/hr` resource, payroll included.

use axum::routing::get;
use axum::Router;

use crate::handlers::{hr, payroll};
use crate::state::AppState;

/// Routes mounted at `/hr`.
///
/// ```text
/// GET  /employees              -> list_employees
/// POST /employees              -> create_employee
/// GET  /employees/{id}         -> get_employee
/// PUT  /employees/{id}         -> update_employee
/// GET  /attendance             -> list_attendance
/// POST /attendance             -> upsert_attendance
/// GET  /attendance/summary     -> attendance_summary
/// GET  /payroll                -> list_payroll
/// POST /payroll                -> create_payroll
/// GET  /payroll/{id}           -> get_payroll
/// PUT  /payroll/{id}           -> update_payroll (manager)
/// GET  /payroll/{id}/export    -> export_payroll
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/employees",
            get(hr::list_employees).post(hr::create_employee),
        )
        .route(
            "/employees/{id}",
            get(hr::get_employee).put(hr::update_employee),
        )
        .route(
            "/attendance",
            get(hr::list_attendance).post(hr::upsert_attendance),
        )
        .route("/attendance/summary", get(hr::attendance_summary))
        .route(
            "/payroll",
            get(payroll::list_payroll).post(payroll::create_payroll),
        )
        .route(
            "/payroll/{id}",
            get(payroll::get_payroll).put(payroll::update_payroll),
        )
        .route("/payroll/{id}/export", get(payroll::export_payroll))
}
