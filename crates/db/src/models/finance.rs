//! Invoices and payments.

use ashley_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Invoice {
    pub id: DbId,
    pub workspace_id: DbId,
    pub order_id: DbId,
    pub client_id: DbId,
    pub invoice_number: String,
    pub issue_date: Date,
    pub due_date: Date,
    pub subtotal: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
    pub amount_paid: f64,
    pub status: String,
    pub notes: Option<String>,
    pub paid_at: Option<Timestamp>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InvoiceLineItem {
    pub id: DbId,
    pub invoice_id: DbId,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub line_total: f64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInvoiceLine {
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(range(exclusive_min = 0.0))]
    pub quantity: f64,
    #[validate(range(min = 0.0))]
    pub unit_price: f64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInvoice {
    pub order_id: DbId,
    pub issue_date: Option<Date>,
    pub due_date: Option<Date>,
    #[validate(range(min = 0.0, max = 1.0))]
    pub tax_rate: Option<f64>,
    pub notes: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub line_items: Vec<CreateInvoiceLine>,
}

/// Resolved values for a new invoice.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub workspace_id: DbId,
    pub order_id: DbId,
    pub client_id: DbId,
    pub issue_date: Date,
    pub due_date: Date,
    pub subtotal: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
    pub notes: Option<String>,
    pub created_by: DbId,
    pub line_items: Vec<CreateInvoiceLine>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceQuery {
    pub status: Option<String>,
    pub client_id: Option<DbId>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: DbId,
    pub workspace_id: DbId,
    pub invoice_id: DbId,
    pub amount: f64,
    pub method: String,
    pub reference: Option<String>,
    pub paid_at: Timestamp,
    pub received_by: Option<DbId>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePayment {
    pub invoice_id: DbId,
    #[validate(range(exclusive_min = 0.0, message = "amount must be greater than 0"))]
    pub amount: f64,
    pub method: String,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub line_items: Vec<InvoiceLineItem>,
    pub payments: Vec<Payment>,
    pub balance: f64,
}

/// Payment joined with its invoice number for the finance summary.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RecentPayment {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub payment: Payment,
    pub invoice_number: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinanceSummary {
    pub period: &'static str,
    pub revenue: f64,
    pub invoiced: f64,
    pub pending_invoices: i64,
    pub overdue_invoices: i64,
    pub recent_payments: Vec<RecentPayment>,
}
