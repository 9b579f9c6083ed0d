//! Sewing operations, piece rates and sewing runs.

use ashley_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SewingOperation {
    pub id: DbId,
    pub workspace_id: DbId,
    pub product_type: String,
    pub name: String,
    pub standard_minutes: f64,
    pub piece_rate: Option<f64>,
    pub depends_on: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSewingOperation {
    #[validate(length(min = 1))]
    pub product_type: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 0.01, message = "standard_minutes must be at least 0.01"))]
    pub standard_minutes: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub piece_rate: Option<f64>,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationQuery {
    pub product_type: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PieceRate {
    pub id: DbId,
    pub workspace_id: DbId,
    pub operation_name: String,
    pub brand_id: Option<DbId>,
    pub rate: f64,
    pub effective_from: Date,
    pub effective_to: Option<Date>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePieceRate {
    #[validate(length(min = 1))]
    pub operation_name: String,
    pub brand_id: Option<DbId>,
    #[validate(range(exclusive_min = 0.0, message = "rate must be greater than 0"))]
    pub rate: f64,
    pub effective_from: Date,
    pub effective_to: Option<Date>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PieceRateQuery {
    pub operation_name: Option<String>,
    pub brand_id: Option<DbId>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SewingRun {
    pub id: DbId,
    pub workspace_id: DbId,
    pub order_id: DbId,
    pub routing_step_id: Option<DbId>,
    pub operation_name: String,
    pub operator_id: DbId,
    pub bundle_id: Option<DbId>,
    pub status: String,
    pub started_at: Option<Timestamp>,
    pub paused_at: Option<Timestamp>,
    pub paused_minutes: f64,
    pub ended_at: Option<Timestamp>,
    pub qty_good: Option<i32>,
    pub qty_reject: Option<i32>,
    pub reject_reason: Option<String>,
    pub reject_photo_url: Option<String>,
    pub actual_minutes: Option<f64>,
    pub earned_minutes: Option<f64>,
    pub efficiency_pct: Option<f64>,
    pub piece_rate_pay: Option<f64>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A run joined with its operator's name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SewingRunListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub run: SewingRun,
    pub operator_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSewingRun {
    pub order_id: DbId,
    pub routing_step_id: Option<DbId>,
    pub operation_name: String,
    pub operator_id: DbId,
    pub bundle_id: Option<DbId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SewingRunQuery {
    pub status: Option<String>,
    pub operator_id: Option<DbId>,
    pub order_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Body of the `complete` action.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CompleteSewingRun {
    #[validate(range(min = 0))]
    #[serde(default)]
    pub qty_good: i32,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub qty_reject: i32,
    pub reject_reason: Option<String>,
    pub reject_photo_url: Option<String>,
}

/// Figures persisted when a run completes.
#[derive(Debug, Clone)]
pub struct RunCompletionRecord {
    pub ended_at: Timestamp,
    pub qty_good: i32,
    pub qty_reject: i32,
    pub reject_reason: Option<String>,
    pub reject_photo_url: Option<String>,
    pub actual_minutes: Option<f64>,
    pub earned_minutes: Option<f64>,
    pub efficiency_pct: Option<f64>,
    pub piece_rate_pay: Option<f64>,
}

// ---------------------------------------------------------------------------
// Reporting rows
// ---------------------------------------------------------------------------

/// Today's floor counters.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SewingDayTotals {
    pub active_runs: i64,
    pub completed_today: i64,
    pub pieces_today: i64,
    pub avg_efficiency_today: f64,
}

/// One operator's aggregate over a window.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OperatorAggregate {
    pub operator_id: DbId,
    pub operator_name: String,
    pub total_runs: i64,
    pub total_pieces: i64,
    pub total_rejects: i64,
    pub avg_efficiency: f64,
    pub total_earnings: f64,
}

/// Per-operation breakdown for one operator.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OperatorOperationBreakdown {
    pub operator_id: DbId,
    pub operation_name: String,
    pub runs: i64,
    pub pieces: i64,
    pub avg_efficiency: f64,
}

/// Per-day breakdown for one operator.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OperatorDailyBreakdown {
    pub operator_id: DbId,
    pub day: Date,
    pub runs: i64,
    pub pieces: i64,
    pub avg_efficiency: f64,
    pub earnings: f64,
}

/// Piece-rate earnings, work days and minutes for one operator in a period.
#[derive(Debug, Clone, FromRow)]
pub struct OperatorPeriodTotals {
    pub operator_id: DbId,
    pub operator_name: String,
    pub salary_type: String,
    pub base_salary: f64,
    pub piece_earnings: f64,
    pub piece_count: i64,
    pub days_worked: i64,
    pub total_minutes: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperatorPayrollRequest {
    pub period_start: Date,
    pub period_end: Date,
    pub operator_ids: Option<Vec<DbId>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WindowQuery {
    pub days: Option<i64>,
}
