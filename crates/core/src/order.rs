//! Order intake constants, numbering, pricing and the order state machine.

use crate::money::round2;
use crate::validation::validate_one_of;

// ---------------------------------------------------------------------------
// Statuses
// ---------------------------------------------------------------------------

pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_INTAKE: &str = "intake";
pub const STATUS_DESIGN_PENDING: &str = "design_pending";
pub const STATUS_DESIGN_APPROVAL: &str = "design_approval";
pub const STATUS_CONFIRMED: &str = "confirmed";
pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_CANCELLED: &str = "cancelled";

pub const VALID_STATUSES: &[&str] = &[
    STATUS_DRAFT,
    STATUS_INTAKE,
    STATUS_DESIGN_PENDING,
    STATUS_DESIGN_APPROVAL,
    STATUS_CONFIRMED,
    STATUS_IN_PROGRESS,
    STATUS_COMPLETED,
    STATUS_CANCELLED,
];

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

pub const PRODUCT_TYPES: &[&str] = &["tee", "hoodie", "jersey", "uniform", "custom"];

pub const PRINTING_METHODS: &[&str] = &["silkscreen", "sublimation", "dtf", "embroidery"];

pub const CHANNELS: &[&str] = &["direct", "csr", "shopee", "tiktok", "lazada"];

pub const PAYMENT_TERMS: &[&str] = &["net_15", "net_30", "cod", "50_50"];
pub const DEFAULT_PAYMENT_TERMS: &str = "net_15";

pub const CURRENCIES: &[&str] = &["PHP", "USD"];
pub const DEFAULT_CURRENCY: &str = "PHP";

pub const PRODUCTION_ROUTES: &[&str] = &["option_a", "option_b"];

pub const DEFAULT_DEPOSIT_PERCENTAGE: i32 = 50;

/// Prefix used when the brand has no code.
pub const GENERIC_ORDER_PREFIX: &str = "GEN";

pub fn validate_status(status: &str) -> Result<(), String> {
    validate_one_of("order status", status, VALID_STATUSES)
}

pub fn validate_product_type(value: &str) -> Result<(), String> {
    validate_one_of("product_type", value, PRODUCT_TYPES)
}

pub fn validate_printing_method(value: &str) -> Result<(), String> {
    validate_one_of("printing_method", value, PRINTING_METHODS)
}

pub fn validate_channel(value: &str) -> Result<(), String> {
    validate_one_of("channel", value, CHANNELS)
}

pub fn validate_payment_terms(value: &str) -> Result<(), String> {
    validate_one_of("payment_terms", value, PAYMENT_TERMS)
}

pub fn validate_currency(value: &str) -> Result<(), String> {
    validate_one_of("currency", value, CURRENCIES)
}

pub fn validate_production_route(value: &str) -> Result<(), String> {
    validate_one_of("production_route", value, PRODUCTION_ROUTES)
}

pub fn validate_deposit_percentage(value: i32) -> Result<(), String> {
    if (0..=100).contains(&value) {
        Ok(())
    } else {
        Err("deposit_percentage must be between 0 and 100".to_string())
    }
}

// ---------------------------------------------------------------------------
// Numbering and pricing
// ---------------------------------------------------------------------------

/// Build an order number: `{PREFIX}-{YEAR}-{SEQ:06}`.
///
/// `sequence` is the 1-based count of orders in the workspace for the year.
pub fn format_order_number(brand_code: Option<&str>, year: i32, sequence: i64) -> String {
    let prefix = brand_code
        .filter(|c| !c.is_empty())
        .unwrap_or(GENERIC_ORDER_PREFIX);
    format!("{prefix}-{year}-{sequence:06}")
}

/// Line item total: `unit_price * quantity`, rounded to cents.
pub fn line_total(unit_price: f64, quantity: i32) -> f64 {
    round2(unit_price * f64::from(quantity))
}

/// Sum of `(unit_price, quantity)` pairs.
pub fn order_total<I>(lines: I) -> f64
where
    I: IntoIterator<Item = (f64, i32)>,
{
    round2(lines.into_iter().map(|(p, q)| line_total(p, q)).sum())
}

/// Validate a single line item's numeric fields.
pub fn validate_line_item(quantity: i32, unit_price: f64) -> Result<(), String> {
    if quantity < 1 {
        return Err("Line item quantity must be at least 1".to_string());
    }
    if unit_price < 0.0 || !unit_price.is_finite() {
        return Err("Line item unit_price must be a non-negative number".to_string());
    }
    Ok(())
}

/// Orders in a terminal status cannot be edited.
pub fn is_locked(status: &str) -> bool {
    status == STATUS_COMPLETED || status == STATUS_CANCELLED
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

pub mod state_machine {
    use super::*;
    use crate::validation::transition_error;

    /// Returns the statuses reachable from `from`.
    ///
    /// Terminal statuses (completed, cancelled) return an empty slice.
    pub fn valid_transitions(from: &str) -> &'static [&'static str] {
        match from {
            STATUS_DRAFT => &[STATUS_INTAKE, STATUS_CONFIRMED, STATUS_CANCELLED],
            STATUS_INTAKE => &[STATUS_DESIGN_PENDING, STATUS_CONFIRMED, STATUS_CANCELLED],
            STATUS_DESIGN_PENDING => &[STATUS_DESIGN_APPROVAL, STATUS_INTAKE, STATUS_CANCELLED],
            STATUS_DESIGN_APPROVAL => {
                &[STATUS_CONFIRMED, STATUS_DESIGN_PENDING, STATUS_CANCELLED]
            }
            STATUS_CONFIRMED => &[STATUS_IN_PROGRESS, STATUS_CANCELLED],
            STATUS_IN_PROGRESS => &[STATUS_COMPLETED, STATUS_CANCELLED],
            _ => &[],
        }
    }

    pub fn can_transition(from: &str, to: &str) -> bool {
        valid_transitions(from).contains(&to)
    }

    pub fn validate_transition(from: &str, to: &str) -> Result<(), String> {
        if can_transition(from, to) {
            Ok(())
        } else {
            Err(transition_error("order", from, to))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::state_machine::*;
    use super::*;

    #[test]
    fn order_number_uses_brand_code() {
        assert_eq!(format_order_number(Some("RX"), 2026, 7), "RX-2026-000007");
    }

    #[test]
    fn order_number_falls_back_to_generic_prefix() {
        assert_eq!(format_order_number(None, 2026, 1), "GEN-2026-000001");
        assert_eq!(format_order_number(Some(""), 2026, 12), "GEN-2026-000012");
    }

    #[test]
    fn totals_sum_line_items() {
        assert_eq!(line_total(185.5, 100), 18550.0);
        assert_eq!(order_total([(185.5, 100), (350.0, 20)]), 25550.0);
        assert_eq!(order_total(Vec::<(f64, i32)>::new()), 0.0);
    }

    #[test]
    fn line_item_validation() {
        assert!(validate_line_item(1, 0.0).is_ok());
        assert!(validate_line_item(0, 10.0).is_err());
        assert!(validate_line_item(5, -1.0).is_err());
        assert!(validate_line_item(5, f64::NAN).is_err());
    }

    #[test]
    fn enumerations_validate() {
        assert!(validate_product_type("hoodie").is_ok());
        assert!(validate_product_type("cap").is_err());
        assert!(validate_printing_method("dtf").is_ok());
        assert!(validate_channel("lazada").is_ok());
        assert!(validate_payment_terms("50_50").is_ok());
        assert!(validate_currency("EUR").is_err());
        assert!(validate_deposit_percentage(101).is_err());
        assert!(validate_production_route("option_b").is_ok());
    }

    #[test]
    fn terminal_orders_are_locked() {
        assert!(is_locked(STATUS_COMPLETED));
        assert!(is_locked(STATUS_CANCELLED));
        assert!(!is_locked(STATUS_IN_PROGRESS));
    }

    #[test]
    fn happy_path_transitions() {
        assert!(can_transition(STATUS_DRAFT, STATUS_INTAKE));
        assert!(can_transition(STATUS_INTAKE, STATUS_DESIGN_PENDING));
        assert!(can_transition(STATUS_DESIGN_PENDING, STATUS_DESIGN_APPROVAL));
        assert!(can_transition(STATUS_DESIGN_APPROVAL, STATUS_CONFIRMED));
        assert!(can_transition(STATUS_CONFIRMED, STATUS_IN_PROGRESS));
        assert!(can_transition(STATUS_IN_PROGRESS, STATUS_COMPLETED));
    }

    #[test]
    fn terminal_states_have_no_transitions() {
        assert!(valid_transitions(STATUS_COMPLETED).is_empty());
        assert!(valid_transitions(STATUS_CANCELLED).is_empty());
    }

    #[test]
    fn skipping_confirmation_is_rejected() {
        let err = validate_transition(STATUS_DRAFT, STATUS_IN_PROGRESS).unwrap_err();
        assert!(err.contains("draft -> in_progress"));
    }
}
