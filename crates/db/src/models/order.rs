//! Order, line item and routing step models.

use ashley_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `orders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: DbId,
    pub workspace_id: DbId,
    pub client_id: DbId,
    pub brand_id: DbId,
    pub order_number: String,
    pub status: String,
    pub total_amount: f64,
    pub currency: String,
    pub channel: Option<String>,
    pub payment_terms: String,
    pub deposit_percentage: i32,
    pub tax_inclusive: bool,
    pub production_route: Option<String>,
    pub delivery_date: Option<Date>,
    pub notes: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Order list row joined with client and brand names.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub order: Order,
    pub client_name: String,
    pub brand_name: String,
    pub line_item_count: i64,
}

/// A row from the `order_line_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderLineItem {
    pub id: DbId,
    pub order_id: DbId,
    pub description: String,
    pub product_type: String,
    pub printing_method: String,
    pub quantity: i32,
    pub unit_price: f64,
    pub total_price: f64,
    pub size_breakdown: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateLineItem {
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    pub product_type: String,
    pub printing_method: String,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(range(min = 0.0, message = "unit_price must not be negative"))]
    pub unit_price: f64,
    pub size_breakdown: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrder {
    pub client_id: DbId,
    pub brand_id: DbId,
    pub currency: Option<String>,
    pub channel: Option<String>,
    pub payment_terms: Option<String>,
    #[validate(range(min = 0, max = 100))]
    pub deposit_percentage: Option<i32>,
    pub tax_inclusive: Option<bool>,
    pub production_route: Option<String>,
    pub delivery_date: Option<Date>,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "at least one line item is required"), nested)]
    pub line_items: Vec<CreateLineItem>,
}

/// Fully resolved values the repository persists for a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub workspace_id: DbId,
    pub client_id: DbId,
    pub brand_id: DbId,
    /// Brand code used as the order number prefix, if the brand has one.
    pub brand_code: Option<String>,
    /// Year the order number is sequenced in.
    pub year: i32,
    pub total_amount: f64,
    pub currency: String,
    pub channel: Option<String>,
    pub payment_terms: String,
    pub deposit_percentage: i32,
    pub tax_inclusive: bool,
    pub production_route: Option<String>,
    pub delivery_date: Option<Date>,
    pub notes: Option<String>,
    pub created_by: DbId,
    /// `(line, total_price)` pairs.
    pub line_items: Vec<(CreateLineItem, f64)>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateOrder {
    pub status: Option<String>,
    pub channel: Option<String>,
    pub payment_terms: Option<String>,
    #[validate(range(min = 0, max = 100))]
    pub deposit_percentage: Option<i32>,
    pub tax_inclusive: Option<bool>,
    pub production_route: Option<String>,
    pub delivery_date: Option<Date>,
    pub notes: Option<String>,
}

/// Query parameters for listing orders.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<String>,
    pub client_id: Option<DbId>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// A row from the `routing_steps` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RoutingStep {
    pub id: DbId,
    pub order_id: DbId,
    pub step_number: i32,
    pub name: String,
    pub department: String,
    pub estimated_hours: f64,
    pub requires_qc: bool,
    pub status: String,
    pub assigned_employee_id: Option<DbId>,
    pub notes: Option<String>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRoutingStep {
    pub status: Option<String>,
    pub assigned_employee_id: Option<DbId>,
    pub notes: Option<String>,
}
