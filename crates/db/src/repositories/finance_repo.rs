//! Repositories for invoices and payments.

use ashley_core::finance::{apply_payment, format_invoice_number, STATUS_CANCELLED, STATUS_OVERDUE, STATUS_PAID};
use ashley_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::finance::{CreatePayment, Invoice, InvoiceLineItem, NewInvoice, Payment, RecentPayment};

const COLUMNS: &str = "id, workspace_id, order_id, client_id, invoice_number, issue_date, due_date, \
                       subtotal, tax_rate, tax_amount, total_amount, amount_paid, status, notes, \
                       paid_at, created_by, created_at, updated_at";

const PAYMENT_COLUMNS: &str = "id, workspace_id, invoice_id, amount, method, reference, paid_at, \
                               received_by, created_at";

/// `$1` workspace, `$2` status, `$3` client.
///
/// `overdue` also matches open invoices whose due date has passed but which
/// the scanner has not flagged yet.
const LIST_FILTER: &str = "workspace_id = $1
    AND ($2::TEXT IS NULL
         OR status = $2
         OR ($2 = 'overdue' AND status IN ('pending', 'partial') AND due_date < CURRENT_DATE))
    AND ($3::BIGINT IS NULL OR client_id = $3)";

/// Result of recording a payment.
#[derive(Debug)]
pub enum PaymentOutcome {
    Recorded { payment: Payment, invoice: Invoice },
    InvoiceNotFound,
    Rejected(String),
}

pub struct InvoiceRepo;

impl InvoiceRepo {
    /// Create an invoice with the next `INV-NNNNNN` number.
    pub async fn create(pool: &PgPool, input: &NewInvoice) -> Result<Invoice, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT id FROM workspaces WHERE id = $1 FOR UPDATE")
            .bind(input.workspace_id)
            .execute(&mut *tx)
            .await?;

        let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM invoices WHERE workspace_id = $1")
            .bind(input.workspace_id)
            .fetch_one(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO invoices
                (workspace_id, order_id, client_id, invoice_number, issue_date, due_date,
                 subtotal, tax_rate, tax_amount, total_amount, notes, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {COLUMNS}"
        );
        let invoice = sqlx::query_as::<_, Invoice>(&query)
            .bind(input.workspace_id)
            .bind(input.order_id)
            .bind(input.client_id)
            .bind(format_invoice_number(existing + 1))
            .bind(input.issue_date)
            .bind(input.due_date)
            .bind(input.subtotal)
            .bind(input.tax_rate)
            .bind(input.tax_amount)
            .bind(input.total_amount)
            .bind(&input.notes)
            .bind(input.created_by)
            .fetch_one(&mut *tx)
            .await?;

        for line in &input.line_items {
            sqlx::query(
                "INSERT INTO invoice_line_items (invoice_id, description, quantity, unit_price, line_total)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(invoice.id)
            .bind(&line.description)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(ashley_core::money::round2(line.quantity * line.unit_price))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(invoice)
    }

    pub async fn find_by_id(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
    ) -> Result<Option<Invoice>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM invoices WHERE id = $1 AND workspace_id = $2");
        sqlx::query_as::<_, Invoice>(&query)
            .bind(id)
            .bind(workspace_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists_for_order(pool: &PgPool, order_id: DbId) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM invoices WHERE order_id = $1)")
                .bind(order_id)
                .fetch_one(pool)
                .await?;
        Ok(exists)
    }

    pub async fn list(
        pool: &PgPool,
        workspace_id: DbId,
        status: Option<&str>,
        client_id: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Invoice>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM invoices
             WHERE {LIST_FILTER}
             ORDER BY issue_date DESC, id DESC
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, Invoice>(&query)
            .bind(workspace_id)
            .bind(status)
            .bind(client_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(
        pool: &PgPool,
        workspace_id: DbId,
        status: Option<&str>,
        client_id: Option<DbId>,
    ) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM invoices WHERE {LIST_FILTER}");
        let (count,): (i64,) = sqlx::query_as(&query)
            .bind(workspace_id)
            .bind(status)
            .bind(client_id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    pub async fn line_items(pool: &PgPool, invoice_id: DbId) -> Result<Vec<InvoiceLineItem>, sqlx::Error> {
        sqlx::query_as::<_, InvoiceLineItem>(
            "SELECT id, invoice_id, description, quantity, unit_price, line_total
             FROM invoice_line_items WHERE invoice_id = $1 ORDER BY id",
        )
        .bind(invoice_id)
        .fetch_all(pool)
        .await
    }

    pub async fn payments(pool: &PgPool, invoice_id: DbId) -> Result<Vec<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE invoice_id = $1 ORDER BY paid_at, id"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(invoice_id)
            .fetch_all(pool)
            .await
    }

    /// Cancel an invoice still in `from`. A payment landing first moves it on
    /// and the cancel matches nothing.
    pub async fn cancel(pool: &PgPool, id: DbId, from: &str) -> Result<Option<Invoice>, sqlx::Error> {
        let query = format!(
            "UPDATE invoices SET status = $2 WHERE id = $1 AND status = $3 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Invoice>(&query)
            .bind(id)
            .bind(STATUS_CANCELLED)
            .bind(from)
            .fetch_optional(pool)
            .await
    }

    /// Flag every open invoice past its due date as overdue. Returns the
    /// number of invoices changed.
    pub async fn mark_overdue(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE invoices SET status = $1
             WHERE status IN ('pending', 'partial') AND due_date < CURRENT_DATE",
        )
        .bind(STATUS_OVERDUE)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    // -----------------------------------------------------------------------
    // Summary
    // -----------------------------------------------------------------------

    pub async fn revenue_since(pool: &PgPool, workspace_id: DbId, since: Timestamp) -> Result<f64, sqlx::Error> {
        let (sum,): (f64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(amount), 0)::FLOAT8 FROM payments
             WHERE workspace_id = $1 AND paid_at >= $2",
        )
        .bind(workspace_id)
        .bind(since)
        .fetch_one(pool)
        .await?;
        Ok(sum)
    }

    pub async fn invoiced_since(pool: &PgPool, workspace_id: DbId, since: Timestamp) -> Result<f64, sqlx::Error> {
        let (sum,): (f64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(total_amount), 0)::FLOAT8 FROM invoices
             WHERE workspace_id = $1 AND status <> 'cancelled' AND created_at >= $2",
        )
        .bind(workspace_id)
        .bind(since)
        .fetch_one(pool)
        .await?;
        Ok(sum)
    }

    /// `(pending, overdue)` counts as of today.
    pub async fn open_counts(pool: &PgPool, workspace_id: DbId) -> Result<(i64, i64), sqlx::Error> {
        sqlx::query_as(
            "SELECT
                COUNT(*) FILTER (WHERE status IN ('pending', 'partial') AND due_date >= CURRENT_DATE),
                COUNT(*) FILTER (WHERE status = 'overdue'
                                 OR (status IN ('pending', 'partial') AND due_date < CURRENT_DATE))
             FROM invoices WHERE workspace_id = $1",
        )
        .bind(workspace_id)
        .fetch_one(pool)
        .await
    }

    pub async fn recent_payments(
        pool: &PgPool,
        workspace_id: DbId,
        limit: i64,
    ) -> Result<Vec<RecentPayment>, sqlx::Error> {
        sqlx::query_as::<_, RecentPayment>(
            "SELECT p.id, p.workspace_id, p.invoice_id, p.amount, p.method, p.reference,
                    p.paid_at, p.received_by, p.created_at, i.invoice_number
             FROM payments p
             JOIN invoices i ON i.id = p.invoice_id
             WHERE p.workspace_id = $1
             ORDER BY p.paid_at DESC, p.id DESC
             LIMIT $2",
        )
        .bind(workspace_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}

pub struct PaymentRepo;

impl PaymentRepo {
    /// Record a payment against an invoice under a row lock.
    ///
    /// The invoice balance is re-checked inside the transaction; when it is
    /// cleared the invoice becomes paid, otherwise partial.
    pub async fn record(
        pool: &PgPool,
        workspace_id: DbId,
        input: &CreatePayment,
        received_by: DbId,
    ) -> Result<PaymentOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let select = format!(
            "SELECT {COLUMNS} FROM invoices WHERE id = $1 AND workspace_id = $2 FOR UPDATE"
        );
        let Some(invoice) = sqlx::query_as::<_, Invoice>(&select)
            .bind(input.invoice_id)
            .bind(workspace_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(PaymentOutcome::InvoiceNotFound);
        };

        let next_status = match apply_payment(
            &invoice.status,
            invoice.total_amount,
            invoice.amount_paid,
            input.amount,
        ) {
            Ok(status) => status,
            Err(reason) => return Ok(PaymentOutcome::Rejected(reason)),
        };

        let insert = format!(
            "INSERT INTO payments (workspace_id, invoice_id, amount, method, reference, received_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {PAYMENT_COLUMNS}"
        );
        let payment = sqlx::query_as::<_, Payment>(&insert)
            .bind(workspace_id)
            .bind(invoice.id)
            .bind(input.amount)
            .bind(&input.method)
            .bind(&input.reference)
            .bind(received_by)
            .fetch_one(&mut *tx)
            .await?;

        let update = format!(
            "UPDATE invoices SET
                amount_paid = ROUND((amount_paid + $2)::NUMERIC, 2)::FLOAT8,
                status = $3,
                paid_at = CASE WHEN $3 = $4 THEN NOW() ELSE paid_at END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let invoice = sqlx::query_as::<_, Invoice>(&update)
            .bind(invoice.id)
            .bind(input.amount)
            .bind(next_status)
            .bind(STATUS_PAID)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(PaymentOutcome::Recorded { payment, invoice })
    }
}
