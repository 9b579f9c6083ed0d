//! CAPA task model and DTOs.

use ashley_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CapaTask {
    pub id: DbId,
    pub workspace_id: DbId,
    pub capa_number: String,
    pub title: String,
    pub description: Option<String>,
    pub capa_type: String,
    pub priority: String,
    pub source: String,
    pub status: String,
    pub root_cause: Option<String>,
    pub corrective_action: Option<String>,
    pub preventive_action: Option<String>,
    pub assigned_to: Option<DbId>,
    pub due_date: Option<Date>,
    pub inspection_id: Option<DbId>,
    pub order_id: Option<DbId>,
    pub verified_by: Option<DbId>,
    pub verified_at: Option<Timestamp>,
    pub effectiveness: Option<String>,
    pub closed_at: Option<Timestamp>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCapa {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub description: Option<String>,
    pub capa_type: String,
    pub priority: Option<String>,
    pub source: Option<String>,
    pub root_cause: Option<String>,
    pub corrective_action: Option<String>,
    pub preventive_action: Option<String>,
    pub assigned_to: Option<DbId>,
    pub due_date: Option<Date>,
    pub inspection_id: Option<DbId>,
    pub order_id: Option<DbId>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCapa {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub root_cause: Option<String>,
    pub corrective_action: Option<String>,
    pub preventive_action: Option<String>,
    pub assigned_to: Option<DbId>,
    pub due_date: Option<Date>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyCapa {
    pub effectiveness: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReopenCapa {
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CapaQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub capa_type: Option<String>,
    pub source: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// A `(key, count)` pair in a distribution.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CountBy {
    pub key: String,
    pub count: i64,
}

/// Created and closed counts for one month.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MonthlyTrend {
    pub month: String,
    pub created: i64,
    pub closed: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CapaAnalytics {
    pub by_status: Vec<CountBy>,
    pub by_priority: Vec<CountBy>,
    pub by_type: Vec<CountBy>,
    pub by_source: Vec<CountBy>,
    pub overdue: i64,
    pub avg_completion_days: f64,
    pub monthly_trend: Vec<MonthlyTrend>,
}
