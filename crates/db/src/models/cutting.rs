//! Fabric inventory, cut lays and their outputs.

use std::collections::BTreeMap;

use ashley_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FabricBatch {
    pub id: DbId,
    pub workspace_id: DbId,
    pub lot_no: String,
    pub fabric_type: String,
    pub color: Option<String>,
    pub gsm: Option<i32>,
    pub width_cm: Option<f64>,
    pub uom: String,
    pub qty_on_hand: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFabricBatch {
    #[validate(length(min = 1))]
    pub lot_no: String,
    #[validate(length(min = 1))]
    pub fabric_type: String,
    pub color: Option<String>,
    #[validate(range(min = 1))]
    pub gsm: Option<i32>,
    #[validate(range(min = 0.0))]
    pub width_cm: Option<f64>,
    pub uom: String,
    #[validate(range(min = 0.0, message = "qty_on_hand must not be negative"))]
    pub qty_on_hand: f64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FabricIssue {
    pub id: DbId,
    pub workspace_id: DbId,
    pub batch_id: DbId,
    pub order_id: DbId,
    pub qty_issued: f64,
    pub uom: String,
    pub issued_by: Option<DbId>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFabricIssue {
    pub batch_id: DbId,
    pub order_id: DbId,
    #[validate(range(exclusive_min = 0.0, message = "qty must be greater than 0"))]
    pub qty: f64,
    pub uom: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CutLay {
    pub id: DbId,
    pub workspace_id: DbId,
    pub order_id: DbId,
    pub marker_name: Option<String>,
    pub marker_width_cm: Option<f64>,
    pub lay_length_m: f64,
    pub plies: i32,
    pub gross_used: f64,
    pub offcuts: f64,
    pub defects: f64,
    pub uom: String,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CutLayOutput {
    pub id: DbId,
    pub lay_id: DbId,
    pub size_code: String,
    pub qty: i32,
}

/// A lay together with its per-size outputs.
#[derive(Debug, Clone, Serialize)]
pub struct CutLayWithOutputs {
    #[serde(flatten)]
    pub lay: CutLay,
    pub outputs: Vec<CutLayOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateLayOutput {
    #[validate(length(min = 1))]
    pub size_code: String,
    #[validate(range(min = 1, message = "output qty must be at least 1"))]
    pub qty: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCutLay {
    pub order_id: DbId,
    pub marker_name: Option<String>,
    #[validate(range(min = 0.0))]
    pub marker_width_cm: Option<f64>,
    #[validate(range(exclusive_min = 0.0))]
    pub lay_length_m: f64,
    pub plies: i32,
    pub gross_used: f64,
    #[serde(default)]
    pub offcuts: f64,
    #[serde(default)]
    pub defects: f64,
    pub uom: String,
    #[validate(length(min = 1, message = "at least one output is required"), nested)]
    pub outputs: Vec<CreateLayOutput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayQuery {
    pub order_id: Option<DbId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBundles {
    pub bundle_size_per_size: BTreeMap<String, i32>,
}

/// Raw totals behind the cutting summary for one order.
#[derive(Debug, Clone, FromRow)]
pub struct CuttingTotals {
    pub total_fabric_issued: f64,
    pub total_gross_used: f64,
    pub total_pieces_cut: i64,
    pub total_bundles: i64,
}
