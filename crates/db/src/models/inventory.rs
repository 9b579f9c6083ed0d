//! Suppliers, materials, stock movements and purchase orders.

use ashley_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Supplier {
    pub id: DbId,
    pub workspace_id: DbId,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub payment_terms: Option<String>,
    pub lead_time_days: i32,
    pub rating: f64,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSupplier {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub contact_person: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub payment_terms: Option<String>,
    #[validate(range(min = 0))]
    pub lead_time_days: Option<i32>,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSupplier {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    pub contact_person: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub payment_terms: Option<String>,
    #[validate(range(min = 0))]
    pub lead_time_days: Option<i32>,
    pub rating: Option<f64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Material {
    pub id: DbId,
    pub workspace_id: DbId,
    pub sku: String,
    pub name: String,
    pub category: String,
    pub unit_of_measure: String,
    pub current_stock: f64,
    pub reorder_point: f64,
    pub reorder_qty: Option<f64>,
    pub max_stock_level: Option<f64>,
    pub unit_cost: f64,
    pub supplier_id: Option<DbId>,
    pub location: Option<String>,
    pub barcode: Option<String>,
    pub auto_reorder: bool,
    pub last_restocked: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMaterial {
    #[validate(length(min = 1, message = "sku is required"))]
    pub sku: String,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub category: String,
    pub unit_of_measure: String,
    #[validate(range(min = 0.0, message = "current_stock must not be negative"))]
    #[serde(default)]
    pub current_stock: f64,
    #[serde(default)]
    pub reorder_point: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub reorder_qty: Option<f64>,
    pub max_stock_level: Option<f64>,
    #[validate(range(min = 0.0, message = "unit_cost must not be negative"))]
    #[serde(default)]
    pub unit_cost: f64,
    pub supplier_id: Option<DbId>,
    pub location: Option<String>,
    pub barcode: Option<String>,
    #[serde(default)]
    pub auto_reorder: bool,
}

/// Stock is not editable here; it only moves through stock movements.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateMaterial {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    pub category: Option<String>,
    pub reorder_point: Option<f64>,
    #[validate(range(exclusive_min = 0.0))]
    pub reorder_qty: Option<f64>,
    pub max_stock_level: Option<f64>,
    #[validate(range(min = 0.0))]
    pub unit_cost: Option<f64>,
    pub supplier_id: Option<DbId>,
    pub location: Option<String>,
    pub barcode: Option<String>,
    pub auto_reorder: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaterialQuery {
    pub category: Option<String>,
    pub supplier_id: Option<DbId>,
    pub low_stock: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LookupQuery {
    pub code: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StockMovement {
    pub id: DbId,
    pub workspace_id: DbId,
    pub material_id: DbId,
    pub movement_type: String,
    pub quantity: f64,
    pub unit_cost: f64,
    pub balance_after: f64,
    pub purchase_order_id: Option<DbId>,
    pub notes: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateStockMovement {
    pub movement_type: String,
    pub quantity: f64,
    pub notes: Option<String>,
}

/// A stock alert computed from a material's current level.
#[derive(Debug, Clone, Serialize)]
pub struct StockAlert {
    pub material_id: DbId,
    pub material_name: String,
    pub alert_type: &'static str,
    pub severity: &'static str,
    pub current_level: f64,
    pub threshold: f64,
    pub message: String,
}

/// Outbound quantities for one material over the costing window.
#[derive(Debug, Clone, FromRow)]
pub struct MaterialUsage {
    pub material_id: DbId,
    pub usage: f64,
    pub waste: f64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PurchaseOrder {
    pub id: DbId,
    pub workspace_id: DbId,
    pub po_number: String,
    pub supplier_id: DbId,
    pub status: String,
    pub order_date: Date,
    pub expected_delivery: Option<Date>,
    pub actual_delivery: Option<Date>,
    pub total_amount: f64,
    pub is_auto: bool,
    pub notes: Option<String>,
    pub created_by: Option<DbId>,
    pub approved_by: Option<DbId>,
    pub approved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PurchaseOrderItem {
    pub id: DbId,
    pub purchase_order_id: DbId,
    pub material_id: DbId,
    pub quantity: f64,
    pub unit_price: f64,
    pub total_price: f64,
    pub received_qty: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePurchaseOrderItem {
    pub material_id: DbId,
    #[validate(range(exclusive_min = 0.0, message = "quantity must be greater than 0"))]
    pub quantity: f64,
    #[validate(range(min = 0.0, message = "unit_price must not be negative"))]
    pub unit_price: f64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePurchaseOrder {
    pub supplier_id: DbId,
    pub expected_delivery: Option<Date>,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "at least one item is required"), nested)]
    pub items: Vec<CreatePurchaseOrderItem>,
}

/// Insert payload for a purchase order with priced lines.
#[derive(Debug, Clone)]
pub struct NewPurchaseOrder {
    pub workspace_id: DbId,
    pub supplier_id: DbId,
    pub expected_delivery: Option<Date>,
    pub notes: Option<String>,
    pub is_auto: bool,
    pub created_by: Option<DbId>,
    pub items: Vec<NewPurchaseOrderItem>,
}

#[derive(Debug, Clone)]
pub struct NewPurchaseOrderItem {
    pub material_id: DbId,
    pub quantity: f64,
    pub unit_price: f64,
    pub total_price: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurchaseOrderQuery {
    pub status: Option<String>,
    pub supplier_id: Option<DbId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOrderDetail {
    #[serde(flatten)]
    pub purchase_order: PurchaseOrder,
    pub items: Vec<PurchaseOrderItem>,
}

/// A received quantity that differs from what was ordered.
#[derive(Debug, Clone, Deserialize)]
pub struct ReceivedItem {
    pub item_id: DbId,
    pub quantity: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReceivePurchaseOrder {
    #[serde(default)]
    pub items: Vec<ReceivedItem>,
    pub actual_delivery: Option<Date>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InventoryCounts {
    pub total_materials: i64,
    pub total_value: f64,
    pub low_stock_count: i64,
    pub out_of_stock_count: i64,
    pub pending_pos: i64,
}
