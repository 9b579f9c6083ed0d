//! Employees and attendance.

use ashley_core::types::{Date, DbId, Timestamp};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Employee {
    pub id: DbId,
    pub workspace_id: DbId,
    pub employee_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub position: String,
    pub department: String,
    pub salary_type: String,
    pub base_salary: f64,
    pub piece_rate: Option<f64>,
    pub hire_date: Option<Date>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEmployee {
    #[validate(length(min = 1, message = "first_name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "last_name is required"))]
    pub last_name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1))]
    pub position: String,
    #[validate(length(min = 1))]
    pub department: String,
    pub salary_type: String,
    #[validate(range(min = 0.0, message = "base_salary must not be negative"))]
    pub base_salary: f64,
    #[validate(range(min = 0.0))]
    pub piece_rate: Option<f64>,
    pub hire_date: Option<Date>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateEmployee {
    #[validate(length(min = 1))]
    pub first_name: Option<String>,
    #[validate(length(min = 1))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub salary_type: Option<String>,
    #[validate(range(min = 0.0))]
    pub base_salary: Option<f64>,
    #[validate(range(min = 0.0))]
    pub piece_rate: Option<f64>,
    pub hire_date: Option<Date>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeQuery {
    pub department: Option<String>,
    pub position: Option<String>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Attendance counts per status.
#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct AttendanceCounts {
    pub present: i64,
    pub absent: i64,
    pub late: i64,
    pub half_day: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceStats {
    #[serde(flatten)]
    pub counts: AttendanceCounts,
    pub attendance_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployeeDetail {
    #[serde(flatten)]
    pub employee: Employee,
    pub attendance_this_month: AttendanceStats,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttendanceLog {
    pub id: DbId,
    pub workspace_id: DbId,
    pub employee_id: DbId,
    pub date: Date,
    pub status: String,
    pub time_in: Option<NaiveTime>,
    pub time_out: Option<NaiveTime>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertAttendance {
    pub employee_id: DbId,
    pub date: Date,
    pub status: String,
    pub time_in: Option<NaiveTime>,
    pub time_out: Option<NaiveTime>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceQuery {
    pub employee_id: Option<DbId>,
    pub date_from: Option<Date>,
    pub date_to: Option<Date>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
