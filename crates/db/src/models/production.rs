//! Bundles and the production summary.

use ashley_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `bundles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Bundle {
    pub id: DbId,
    pub workspace_id: DbId,
    pub order_id: DbId,
    pub lay_id: Option<DbId>,
    pub bundle_no: i32,
    pub size_code: String,
    pub qty: i32,
    pub qr_code: String,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BundleQuery {
    pub order_id: Option<DbId>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBundleStatus {
    pub status: String,
}

/// Count of in-progress routing steps for one department.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DepartmentActivity {
    pub department: String,
    pub in_progress: i64,
}

/// Floor-wide counters for the production dashboard.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProductionCounts {
    pub active_orders: i64,
    pub completed_orders: i64,
    pub total_bundles: i64,
    pub bundles_in_progress: i64,
    pub pending_inspections: i64,
    pub active_employees: i64,
}
