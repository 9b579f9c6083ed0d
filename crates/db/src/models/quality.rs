//! QC defect codes, checklists, inspections and recorded defects.

use ashley_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DefectCode {
    pub id: DbId,
    pub workspace_id: DbId,
    pub code: String,
    pub name: String,
    pub category: String,
    pub severity: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDefectCode {
    #[validate(length(min = 1))]
    pub code: String,
    #[validate(length(min = 1))]
    pub name: String,
    pub category: String,
    pub severity: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Checklist {
    pub id: DbId,
    pub workspace_id: DbId,
    pub name: String,
    pub checklist_type: String,
    pub items: serde_json::Value,
    pub is_active: bool,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateChecklist {
    #[validate(length(min = 1))]
    pub name: String,
    pub checklist_type: String,
    #[serde(default)]
    pub items: serde_json::Value,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Inspection {
    pub id: DbId,
    pub workspace_id: DbId,
    pub order_id: DbId,
    pub bundle_id: Option<DbId>,
    pub checklist_id: Option<DbId>,
    pub inspection_type: String,
    pub lot_size: i32,
    pub sample_size: i32,
    pub aql_critical: f64,
    pub aql_major: f64,
    pub aql_minor: f64,
    pub acceptance_number: i32,
    pub rejection_number: i32,
    pub critical_found: i32,
    pub major_found: i32,
    pub minor_found: i32,
    pub status: String,
    pub result: Option<String>,
    pub inspector_id: Option<DbId>,
    pub notes: Option<String>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInspection {
    pub order_id: DbId,
    pub bundle_id: Option<DbId>,
    pub checklist_id: Option<DbId>,
    pub inspection_type: String,
    #[validate(range(min = 1, message = "lot_size must be at least 1"))]
    pub lot_size: i32,
    pub aql_critical: Option<f64>,
    pub aql_major: Option<f64>,
    pub aql_minor: Option<f64>,
    pub notes: Option<String>,
}

/// Values computed from the AQL tables at creation time.
#[derive(Debug, Clone)]
pub struct NewInspection {
    pub sample_size: i32,
    pub aql_critical: f64,
    pub aql_major: f64,
    pub aql_minor: f64,
    pub acceptance_number: i32,
    pub rejection_number: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InspectionQuery {
    pub status: Option<String>,
    pub result: Option<String>,
    pub order_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Defect {
    pub id: DbId,
    pub inspection_id: DbId,
    pub defect_code_id: DbId,
    pub quantity: i32,
    pub severity: String,
    pub location: Option<String>,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDefect {
    pub defect_code_id: DbId,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
    pub location: Option<String>,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InspectionDetail {
    #[serde(flatten)]
    pub inspection: Inspection,
    pub defects: Vec<Defect>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompleteInspection {
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SampleSizeRequest {
    #[validate(range(min = 1, message = "lot_size must be at least 1"))]
    pub lot_size: i64,
    pub aql_critical: Option<f64>,
    pub aql_major: Option<f64>,
    pub aql_minor: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EvaluateRequest {
    #[validate(range(min = 1))]
    pub sample_size: i32,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub critical_found: i32,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub major_found: i32,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub minor_found: i32,
    pub aql_critical: Option<f64>,
    pub aql_major: Option<f64>,
    pub aql_minor: Option<f64>,
}
