//! Printing machines, print runs and their child records.

use ashley_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

// ---------------------------------------------------------------------------
// Machines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Machine {
    pub id: DbId,
    pub workspace_id: DbId,
    pub name: String,
    pub workcenter: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMachine {
    #[validate(length(min = 1))]
    pub name: String,
    pub workcenter: String,
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PrintRun {
    pub id: DbId,
    pub workspace_id: DbId,
    pub order_id: DbId,
    pub routing_step_id: Option<DbId>,
    pub method: String,
    pub workcenter: String,
    pub machine_id: Option<DbId>,
    pub status: String,
    pub started_at: Option<Timestamp>,
    pub ended_at: Option<Timestamp>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePrintRun {
    pub order_id: DbId,
    pub routing_step_id: Option<DbId>,
    pub method: String,
    pub workcenter: String,
    pub machine_id: Option<DbId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrintRunQuery {
    pub status: Option<String>,
    pub method: Option<String>,
    pub order_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ---------------------------------------------------------------------------
// Child records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PrintRunMaterial {
    pub id: DbId,
    pub run_id: DbId,
    pub item_name: String,
    pub uom: String,
    pub qty: f64,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePrintRunMaterial {
    #[validate(length(min = 1))]
    pub item_name: String,
    #[validate(length(min = 1))]
    pub uom: String,
    #[validate(range(exclusive_min = 0.0, message = "qty must be greater than 0"))]
    pub qty: f64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PrintRunOutput {
    pub id: DbId,
    pub run_id: DbId,
    pub bundle_id: Option<DbId>,
    pub qty_good: i32,
    pub qty_reject: i32,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePrintRunOutput {
    pub bundle_id: Option<DbId>,
    #[validate(range(min = 0))]
    pub qty_good: i32,
    #[validate(range(min = 0))]
    pub qty_reject: i32,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PrintReject {
    pub id: DbId,
    pub run_id: DbId,
    pub reason_code: String,
    pub qty: i32,
    pub cost_attribution: String,
    pub photo_url: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePrintReject {
    #[validate(length(min = 1))]
    pub reason_code: String,
    #[validate(range(min = 1, message = "qty must be at least 1"))]
    pub qty: i32,
    pub cost_attribution: String,
    pub photo_url: Option<String>,
}

/// A reject joined with its run for dashboard display.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RecentPrintReject {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub reject: PrintReject,
    pub method: String,
    pub order_id: DbId,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PrintMethodLog {
    pub id: DbId,
    pub run_id: DbId,
    pub log_type: String,
    pub data: serde_json::Value,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePrintMethodLog {
    pub log_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// A run with all of its child records.
#[derive(Debug, Clone, Serialize)]
pub struct PrintRunDetail {
    #[serde(flatten)]
    pub run: PrintRun,
    pub materials: Vec<PrintRunMaterial>,
    pub outputs: Vec<PrintRunOutput>,
    pub rejects: Vec<PrintReject>,
    pub logs: Vec<PrintMethodLog>,
}

/// Runs per method over the dashboard window.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MethodCount {
    pub method: String,
    pub runs: i64,
}
