//! Invoice and payment arithmetic.

use chrono::Days;

use crate::money::round2;
use crate::types::Date;
use crate::validation::validate_one_of;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_PARTIAL: &str = "partial";
pub const STATUS_PAID: &str = "paid";
pub const STATUS_OVERDUE: &str = "overdue";
pub const STATUS_CANCELLED: &str = "cancelled";

pub const VALID_INVOICE_STATUSES: &[&str] = &[
    STATUS_PENDING,
    STATUS_PARTIAL,
    STATUS_PAID,
    STATUS_OVERDUE,
    STATUS_CANCELLED,
];

pub const VALID_PAYMENT_METHODS: &[&str] = &["cash", "bank_transfer", "gcash", "stripe", "check"];

pub const DEFAULT_TAX_RATE: f64 = 0.12;
pub const DEFAULT_DUE_DAYS: u64 = 30;
pub const RECENT_PAYMENTS_LIMIT: i64 = 5;

pub fn validate_invoice_status(value: &str) -> Result<(), String> {
    validate_one_of("invoice status", value, VALID_INVOICE_STATUSES)
}

pub fn validate_payment_method(value: &str) -> Result<(), String> {
    validate_one_of("payment method", value, VALID_PAYMENT_METHODS)
}

pub fn validate_tax_rate(rate: f64) -> Result<(), String> {
    if (0.0..=1.0).contains(&rate) {
        Ok(())
    } else {
        Err(format!("tax_rate must be between 0 and 1, got {rate}"))
    }
}

/// `INV-000042`
pub fn format_invoice_number(sequence: i64) -> String {
    format!("INV-{sequence:06}")
}

pub fn default_due_date(issue_date: Date) -> Date {
    issue_date
        .checked_add_days(Days::new(DEFAULT_DUE_DAYS))
        .unwrap_or(issue_date)
}

/// Invoice money totals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvoiceTotals {
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
}

impl InvoiceTotals {
    pub fn new(subtotal: f64, tax_rate: f64) -> Self {
        let subtotal = round2(subtotal);
        let tax_amount = round2(subtotal * tax_rate);
        Self {
            subtotal,
            tax_amount,
            total_amount: round2(subtotal + tax_amount),
        }
    }
}

/// Subtotal from explicit `(quantity, unit_price)` lines, falling back to
/// the order total when none are given.
pub fn invoice_subtotal(lines: &[(f64, f64)], order_total: f64) -> f64 {
    if lines.is_empty() {
        round2(order_total)
    } else {
        round2(lines.iter().map(|(q, p)| q * p).sum())
    }
}

pub fn balance(total: f64, paid: f64) -> f64 {
    round2(total - paid).max(0.0)
}

/// Check a payment against the remaining balance and return the status the
/// invoice moves to once it is recorded.
pub fn apply_payment(
    invoice_status: &str,
    total: f64,
    paid_so_far: f64,
    amount: f64,
) -> Result<&'static str, String> {
    if invoice_status == STATUS_CANCELLED || invoice_status == STATUS_PAID {
        return Err(format!("Cannot record a payment on a {invoice_status} invoice"));
    }
    if amount <= 0.0 {
        return Err("Payment amount must be greater than 0".to_string());
    }
    let remaining = balance(total, paid_so_far);
    if round2(amount) > remaining {
        return Err(format!(
            "Payment amount {amount:.2} exceeds remaining balance {remaining:.2}"
        ));
    }
    if round2(remaining - amount) <= 0.0 {
        Ok(STATUS_PAID)
    } else {
        Ok(STATUS_PARTIAL)
    }
}

/// Status to report for an invoice given the current date.
pub fn effective_status<'a>(stored: &'a str, due_date: Date, today: Date) -> &'a str {
    if (stored == STATUS_PENDING || stored == STATUS_PARTIAL) && due_date < today {
        STATUS_OVERDUE
    } else {
        stored
    }
}

pub fn validate_cancel(status: &str) -> Result<(), String> {
    match status {
        STATUS_PAID => Err("Paid invoices cannot be cancelled".to_string()),
        STATUS_CANCELLED => Err("Invoice is already cancelled".to_string()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn invoice_number_format() {
        assert_eq!(format_invoice_number(42), "INV-000042");
    }

    #[test]
    fn totals_include_tax() {
        let t = InvoiceTotals::new(1000.0, DEFAULT_TAX_RATE);
        assert_eq!(t.tax_amount, 120.0);
        assert_eq!(t.total_amount, 1120.0);
    }

    #[test]
    fn subtotal_prefers_lines() {
        assert_eq!(invoice_subtotal(&[(2.0, 150.0), (1.0, 99.5)], 10.0), 399.5);
        assert_eq!(invoice_subtotal(&[], 870.0), 870.0);
    }

    #[test]
    fn due_date_is_thirty_days_out() {
        let d = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        assert_eq!(default_due_date(d), NaiveDate::from_ymd_opt(2026, 2, 14).unwrap());
    }

    #[test]
    fn payments_move_status() {
        assert_eq!(apply_payment(STATUS_PENDING, 1120.0, 0.0, 500.0), Ok(STATUS_PARTIAL));
        assert_eq!(apply_payment(STATUS_PARTIAL, 1120.0, 500.0, 620.0), Ok(STATUS_PAID));
        assert!(apply_payment(STATUS_PARTIAL, 1120.0, 500.0, 620.01).is_err());
        assert!(apply_payment(STATUS_PENDING, 1120.0, 0.0, 0.0).is_err());
        assert!(apply_payment(STATUS_CANCELLED, 1120.0, 0.0, 10.0).is_err());
    }

    #[test]
    fn overdue_is_derived() {
        let due = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let after = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(effective_status(STATUS_PENDING, due, after), STATUS_OVERDUE);
        assert_eq!(effective_status(STATUS_PENDING, due, due), STATUS_PENDING);
        assert_eq!(effective_status(STATUS_PAID, due, after), STATUS_PAID);
    }

    #[test]
    fn paid_invoices_cannot_be_cancelled() {
        assert!(validate_cancel(STATUS_PAID).is_err());
        assert!(validate_cancel(STATUS_PARTIAL).is_ok());
    }
}
