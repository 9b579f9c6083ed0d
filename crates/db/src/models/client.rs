//! Client and brand models and DTOs.

use ashley_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `clients` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Client {
    pub id: DbId,
    pub workspace_id: DbId,
    pub name: String,
    pub company: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<serde_json::Value>,
    pub tax_id: Option<String>,
    pub payment_terms: Option<i32>,
    pub credit_limit: Option<f64>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Client list row with aggregate counts.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ClientListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub client: Client,
    pub brand_count: i64,
    pub order_count: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateClient {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub company: Option<String>,
    pub contact_person: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<serde_json::Value>,
    pub tax_id: Option<String>,
    #[validate(range(min = 0))]
    pub payment_terms: Option<i32>,
    #[validate(range(min = 0.0))]
    pub credit_limit: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateClient {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    pub company: Option<String>,
    pub contact_person: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<serde_json::Value>,
    pub tax_id: Option<String>,
    #[validate(range(min = 0))]
    pub payment_terms: Option<i32>,
    #[validate(range(min = 0.0))]
    pub credit_limit: Option<f64>,
    pub is_active: Option<bool>,
}

/// Query parameters for listing clients.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientQuery {
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// A row from the `brands` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Brand {
    pub id: DbId,
    pub workspace_id: DbId,
    pub client_id: DbId,
    pub name: String,
    pub code: Option<String>,
    pub logo_url: Option<String>,
    pub settings: serde_json::Value,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBrand {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub code: Option<String>,
    #[validate(url)]
    pub logo_url: Option<String>,
    pub settings: Option<serde_json::Value>,
}
