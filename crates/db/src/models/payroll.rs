//! Payroll runs and their per-employee items.

use ashley_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PayrollPeriod {
    pub id: DbId,
    pub workspace_id: DbId,
    pub period_start: Date,
    pub period_end: Date,
    pub cutoff_type: String,
    pub status: String,
    pub total_gross: f64,
    pub total_deductions: f64,
    pub total_net: f64,
    pub employee_count: i32,
    pub approval_notes: Option<String>,
    pub approved_by: Option<DbId>,
    pub approved_at: Option<Timestamp>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PayrollItem {
    pub id: DbId,
    pub payroll_id: DbId,
    pub employee_id: DbId,
    pub days_worked: f64,
    pub regular_hours: f64,
    pub overtime_hours: f64,
    pub piece_count: i64,
    pub base_pay: f64,
    pub piece_pay: f64,
    pub overtime_pay: f64,
    pub gross_pay: f64,
    pub sss: f64,
    pub philhealth: f64,
    pub pagibig: f64,
    pub withholding_tax: f64,
    pub total_deductions: f64,
    pub net_pay: f64,
    pub created_at: Timestamp,
}

/// An item joined with the employee's display fields.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PayrollItemWithEmployee {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub item: PayrollItem,
    pub employee_name: String,
    pub employee_number: String,
    pub position: String,
    pub department: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayrollDetail {
    #[serde(flatten)]
    pub period: PayrollPeriod,
    pub items: Vec<PayrollItemWithEmployee>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePayroll {
    pub period_start: Date,
    pub period_end: Date,
    pub cutoff_type: String,
}

/// A computed item ready to insert.
#[derive(Debug, Clone)]
pub struct NewPayrollItem {
    pub employee_id: DbId,
    pub calc: ashley_core::payroll::PayrollCalc,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePayrollStatus {
    pub status: String,
    pub approval_notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayrollQuery {
    pub status: Option<String>,
    pub year: Option<i32>,
}

/// Sewing earnings for one employee in a period.
#[derive(Debug, Clone, Default, FromRow)]
pub struct PieceTotals {
    pub employee_id: DbId,
    pub piece_count: i64,
    pub piece_earnings: f64,
}
