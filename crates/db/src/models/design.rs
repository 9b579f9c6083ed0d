//! Design assets, their versions and client approvals.

use ashley_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DesignAsset {
    pub id: DbId,
    pub workspace_id: DbId,
    pub order_id: DbId,
    pub name: String,
    pub method: Option<String>,
    pub status: String,
    pub current_version: i32,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DesignVersion {
    pub id: DbId,
    pub asset_id: DbId,
    pub version: i32,
    pub files: serde_json::Value,
    pub placements: serde_json::Value,
    pub palette: serde_json::Value,
    pub meta: serde_json::Value,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DesignApproval {
    pub id: DbId,
    pub asset_id: DbId,
    pub version: i32,
    pub client_id: DbId,
    pub status: String,
    /// SHA-256 of the portal token.
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub expires_at: Timestamp,
    pub comments: Option<String>,
    pub approver_name: Option<String>,
    pub responded_at: Option<Timestamp>,
    pub sent_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UploadDesign {
    pub order_id: DbId,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub method: Option<String>,
    #[serde(default)]
    pub files: serde_json::Value,
    #[serde(default)]
    pub placements: serde_json::Value,
    #[serde(default)]
    pub palette: serde_json::Value,
    #[serde(default)]
    pub meta: serde_json::Value,
}

/// Result of an upload: the asset and the version row just written.
#[derive(Debug, Clone, Serialize)]
pub struct UploadResult {
    pub asset: DesignAsset,
    pub version: DesignVersion,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DesignQuery {
    pub order_id: Option<DbId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DesignDetail {
    #[serde(flatten)]
    pub asset: DesignAsset,
    pub versions: Vec<DesignVersion>,
    pub approvals: Vec<DesignApproval>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendApproval {
    pub version: i32,
    pub client_id: DbId,
    pub expires_in_hours: Option<i64>,
}

/// Response to a send: the approval plus the token to hand to the client.
#[derive(Debug, Clone, Serialize)]
pub struct SentApproval {
    #[serde(flatten)]
    pub approval: DesignApproval,
    pub portal_token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApprovalResponse {
    pub comments: Option<String>,
    pub approver_name: Option<String>,
}

/// Order fields exposed to the client portal.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PortalOrderSummary {
    pub id: DbId,
    pub order_number: String,
    pub status: String,
    pub total_amount: f64,
    pub currency: String,
    pub delivery_date: Option<Date>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortalApprovalView {
    pub approval: DesignApproval,
    pub design: DesignAsset,
    pub version: Option<DesignVersion>,
    pub order: PortalOrderSummary,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortalTokenQuery {
    pub token: String,
}
