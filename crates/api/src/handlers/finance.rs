//! Handlers for `/finance`: invoices, payments and the finance summary.

use ashley_core::audit::{ACTION_CREATE, ACTION_STATUS_CHANGE};
use ashley_core::finance::{
    self, balance, default_due_date, effective_status, invoice_subtotal, validate_cancel,
    InvoiceTotals, DEFAULT_TAX_RATE, RECENT_PAYMENTS_LIMIT,
};
use ashley_core::pagination;
use ashley_core::reporting::Period;
use ashley_core::types::{Date, DbId};
use ashley_db::models::finance::{
    CreateInvoice, CreatePayment, FinanceSummary, Invoice, InvoiceDetail, InvoiceQuery, NewInvoice,
    Payment,
};
use ashley_db::repositories::{InvoiceRepo, OrderRepo, PaymentOutcome, PaymentRepo};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use validator::Validate;

use crate::activity::{self, Activity};
use crate::error::{not_found, status_changed, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::PeriodParams;
use crate::response::{DataResponse, PaginatedResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub invoice: Invoice,
    pub balance: f64,
}

/// Report unpaid invoices past their due date as overdue even before the
/// background sweep has stored it.
fn with_effective_status(mut invoice: Invoice, today: Date) -> Invoice {
    let status = effective_status(&invoice.status, invoice.due_date, today).to_string();
    invoice.status = status;
    invoice
}

async fn load(state: &AppState, workspace_id: DbId, id: DbId) -> AppResult<Invoice> {
    InvoiceRepo::find_by_id(&state.pool, workspace_id, id)
        .await?
        .ok_or_else(|| not_found("Invoice", id))
}

/// POST /api/v1/finance/invoices
pub async fn create_invoice(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateInvoice>,
) -> AppResult<(StatusCode, Json<DataResponse<Invoice>>)> {
    input.validate()?;
    let tax_rate = input.tax_rate.unwrap_or(DEFAULT_TAX_RATE);
    finance::validate_tax_rate(tax_rate).map_err(AppError::BadRequest)?;

    let order = OrderRepo::find_by_id(&state.pool, auth.workspace_id, input.order_id)
        .await?
        .ok_or_else(|| not_found("Order", input.order_id))?;
    if InvoiceRepo::exists_for_order(&state.pool, order.id).await? {
        return Err(AppError::BadRequest(format!(
            "Order {} already has an invoice",
            order.order_number
        )));
    }

    let issue_date = input.issue_date.unwrap_or_else(|| Utc::now().date_naive());
    let due_date = input.due_date.unwrap_or_else(|| default_due_date(issue_date));
    if due_date < issue_date {
        return Err(AppError::BadRequest(
            "due_date must not be before issue_date".to_string(),
        ));
    }

    let lines: Vec<(f64, f64)> = input
        .line_items
        .iter()
        .map(|l| (l.quantity, l.unit_price))
        .collect();
    let totals = InvoiceTotals::new(invoice_subtotal(&lines, order.total_amount), tax_rate);

    let new = NewInvoice {
        workspace_id: auth.workspace_id,
        order_id: order.id,
        client_id: order.client_id,
        issue_date,
        due_date,
        subtotal: totals.subtotal,
        tax_rate,
        tax_amount: totals.tax_amount,
        total_amount: totals.total_amount,
        notes: input.notes,
        created_by: auth.user_id,
        line_items: input.line_items,
    };
    let invoice = InvoiceRepo::create(&state.pool, &new).await?;

    tracing::info!(
        invoice_id = invoice.id,
        invoice_number = %invoice.invoice_number,
        total = invoice.total_amount,
        "Invoice created"
    );
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "invoice",
            resource_id: invoice.id,
            event_type: "invoice.created",
        },
        serde_json::json!({
            "invoice_number": invoice.invoice_number,
            "order_id": invoice.order_id,
            "total_amount": invoice.total_amount,
        }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: invoice })))
}

/// GET /api/v1/finance/invoices
pub async fn list_invoices(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<InvoiceQuery>,
) -> AppResult<Json<PaginatedResponse<Invoice>>> {
    if let Some(status) = &params.status {
        finance::validate_invoice_status(status).map_err(AppError::BadRequest)?;
    }
    let (page, limit, offset) = pagination::resolve(params.page, params.limit);

    let invoices = InvoiceRepo::list(
        &state.pool,
        auth.workspace_id,
        params.status.as_deref(),
        params.client_id,
        limit,
        offset,
    )
    .await?;
    let total =
        InvoiceRepo::count(&state.pool, auth.workspace_id, params.status.as_deref(), params.client_id)
            .await?;

    let today = Utc::now().date_naive();
    let invoices = invoices
        .into_iter()
        .map(|i| with_effective_status(i, today))
        .collect();
    Ok(Json(PaginatedResponse::new(invoices, page, limit, total)))
}

/// GET /api/v1/finance/invoices/{id}
pub async fn get_invoice(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<InvoiceDetail>>> {
    let invoice = with_effective_status(
        load(&state, auth.workspace_id, id).await?,
        Utc::now().date_naive(),
    );
    let line_items = InvoiceRepo::line_items(&state.pool, id).await?;
    let payments = InvoiceRepo::payments(&state.pool, id).await?;
    let balance = balance(invoice.total_amount, invoice.amount_paid);

    Ok(Json(DataResponse {
        data: InvoiceDetail {
            invoice,
            line_items,
            payments,
            balance,
        },
    }))
}

/// POST /api/v1/finance/invoices/{id}/cancel
pub async fn cancel_invoice(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Invoice>>> {
    let invoice = load(&state, auth.workspace_id, id).await?;
    validate_cancel(&invoice.status).map_err(AppError::BadRequest)?;

    let cancelled = InvoiceRepo::cancel(&state.pool, id, &invoice.status)
        .await?
        .ok_or_else(|| status_changed("Invoice", id, &invoice.status))?;

    tracing::info!(invoice_id = id, invoice_number = %cancelled.invoice_number, "Invoice cancelled");
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_STATUS_CHANGE,
            resource: "invoice",
            resource_id: id,
            event_type: "invoice.cancelled",
        },
        serde_json::json!({ "from": invoice.status, "to": cancelled.status }),
    )
    .await;

    Ok(Json(DataResponse { data: cancelled }))
}

/// POST /api/v1/finance/payments
pub async fn record_payment(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePayment>,
) -> AppResult<(StatusCode, Json<DataResponse<PaymentReceipt>>)> {
    input.validate()?;
    finance::validate_payment_method(&input.method).map_err(AppError::BadRequest)?;

    let (payment, invoice) =
        match PaymentRepo::record(&state.pool, auth.workspace_id, &input, auth.user_id).await? {
            PaymentOutcome::Recorded { payment, invoice } => (payment, invoice),
            PaymentOutcome::InvoiceNotFound => return Err(not_found("Invoice", input.invoice_id)),
            PaymentOutcome::Rejected(reason) => return Err(AppError::BadRequest(reason)),
        };

    let remaining = balance(invoice.total_amount, invoice.amount_paid);
    tracing::info!(
        invoice_id = invoice.id,
        amount = payment.amount,
        method = %payment.method,
        status = %invoice.status,
        "Payment recorded"
    );
    activity::record(
        &state,
        &auth,
        Activity {
            action: ACTION_CREATE,
            resource: "payment",
            resource_id: payment.id,
            event_type: "payment.recorded",
        },
        serde_json::json!({
            "invoice_id": invoice.id,
            "amount": payment.amount,
            "method": payment.method,
            "invoice_status": invoice.status,
            "balance": remaining,
        }),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: PaymentReceipt {
                payment,
                invoice,
                balance: remaining,
            },
        }),
    ))
}

/// GET /api/v1/finance/summary?period=
pub async fn summary(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PeriodParams>,
) -> AppResult<Json<DataResponse<FinanceSummary>>> {
    let period = params.resolve(Period::Month)?;
    let since = period.start(Utc::now());
    let ws = auth.workspace_id;

    let revenue = InvoiceRepo::revenue_since(&state.pool, ws, since).await?;
    let invoiced = InvoiceRepo::invoiced_since(&state.pool, ws, since).await?;
    let (pending_invoices, overdue_invoices) = InvoiceRepo::open_counts(&state.pool, ws).await?;
    let recent_payments =
        InvoiceRepo::recent_payments(&state.pool, ws, RECENT_PAYMENTS_LIMIT).await?;

    Ok(Json(DataResponse {
        data: FinanceSummary {
            period: period.as_str(),
            revenue,
            invoiced,
            pending_invoices,
            overdue_invoices,
            recent_payments,
        },
    }))
}
