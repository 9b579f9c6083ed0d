//! Audit log entity models and DTOs.
//!
//! Audit rows are append-only and carry no `updated_at`.

use ashley_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single audit log entry.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLog {
    pub id: DbId,
    pub workspace_id: DbId,
    pub user_id: Option<DbId>,
    pub action: String,
    pub resource: String,
    pub resource_id: Option<DbId>,
    pub new_values: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// DTO for inserting an audit entry.
#[derive(Debug, Clone)]
pub struct CreateAuditLog {
    pub workspace_id: DbId,
    pub user_id: Option<DbId>,
    pub action: String,
    pub resource: String,
    pub resource_id: Option<DbId>,
    pub new_values: Option<serde_json::Value>,
}

/// Filter parameters for listing audit logs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    pub resource: Option<String>,
    pub action: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
