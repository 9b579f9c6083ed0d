//! Assets, maintenance schedules and work orders.

use ashley_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Asset {
    pub id: DbId,
    pub workspace_id: DbId,
    pub asset_number: String,
    pub name: String,
    pub asset_type: String,
    pub location: Option<String>,
    pub status: String,
    pub purchase_date: Option<Date>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAsset {
    #[validate(length(min = 1))]
    pub asset_number: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub asset_type: String,
    pub location: Option<String>,
    pub status: Option<String>,
    pub purchase_date: Option<Date>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateAsset {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    pub asset_type: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub purchase_date: Option<Date>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetQuery {
    pub status: Option<String>,
    pub asset_type: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MaintenanceSchedule {
    pub id: DbId,
    pub workspace_id: DbId,
    pub asset_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub maintenance_type: String,
    pub frequency_type: String,
    pub frequency_value: i32,
    pub priority: String,
    pub estimated_duration: Option<f64>,
    pub assigned_to: Option<DbId>,
    pub last_completed_date: Option<Date>,
    pub next_due_date: Date,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A schedule with its computed due state.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleWithDue {
    #[serde(flatten)]
    pub schedule: MaintenanceSchedule,
    pub days_until_due: i64,
    pub due_status: &'static str,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSchedule {
    pub asset_id: DbId,
    #[validate(length(min = 1))]
    pub name: String,
    pub description: Option<String>,
    pub maintenance_type: String,
    pub frequency_type: String,
    #[validate(range(min = 1, message = "frequency_value must be at least 1"))]
    pub frequency_value: Option<i32>,
    pub priority: Option<String>,
    #[validate(range(min = 0.0))]
    pub estimated_duration: Option<f64>,
    pub assigned_to: Option<DbId>,
    pub next_due_date: Option<Date>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleQuery {
    pub asset_id: Option<DbId>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkOrder {
    pub id: DbId,
    pub workspace_id: DbId,
    pub wo_number: String,
    pub asset_id: DbId,
    pub schedule_id: Option<DbId>,
    pub title: String,
    pub description: Option<String>,
    pub priority: String,
    pub status: String,
    pub assigned_to: Option<DbId>,
    pub scheduled_date: Option<Date>,
    pub completed_at: Option<Timestamp>,
    pub completion_notes: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateWorkOrder {
    pub asset_id: Option<DbId>,
    pub schedule_id: Option<DbId>,
    #[validate(length(min = 1))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<DbId>,
    pub scheduled_date: Option<Date>,
}

/// Resolved values for a new work order.
#[derive(Debug, Clone)]
pub struct NewWorkOrder {
    pub workspace_id: DbId,
    pub asset_id: DbId,
    pub schedule_id: Option<DbId>,
    pub title: String,
    pub description: Option<String>,
    pub priority: String,
    pub assigned_to: Option<DbId>,
    pub scheduled_date: Option<Date>,
    pub created_by: DbId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateWorkOrderStatus {
    pub status: String,
    pub completion_notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkOrderQuery {
    pub status: Option<String>,
    pub asset_id: Option<DbId>,
}
