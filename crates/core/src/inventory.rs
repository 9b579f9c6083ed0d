//! Raw-material inventory: stock movements, reorder alerts, costing and the
//! purchase-order lifecycle.

use serde::Serialize;

use crate::money::{percentage, round2};
use crate::validation::{transition_error, validate_one_of};

pub const VALID_CATEGORIES: &[&str] = &["FABRIC", "THREAD", "TRIM", "PACKAGING", "OTHER"];
pub const VALID_UNITS: &[&str] = &["YARDS", "METERS", "KILOGRAMS", "PIECES", "ROLLS"];

pub const MOVEMENT_PURCHASE: &str = "PURCHASE";
pub const MOVEMENT_USAGE: &str = "USAGE";
pub const MOVEMENT_ADJUSTMENT: &str = "ADJUSTMENT";
pub const MOVEMENT_WASTE: &str = "WASTE";
pub const VALID_MOVEMENT_TYPES: &[&str] =
    &[MOVEMENT_PURCHASE, MOVEMENT_USAGE, MOVEMENT_ADJUSTMENT, MOVEMENT_WASTE];

pub const ALERT_OUT_OF_STOCK: &str = "OUT_OF_STOCK";
pub const ALERT_LOW_STOCK: &str = "LOW_STOCK";
pub const ALERT_OVERSTOCK: &str = "OVERSTOCK";

pub const SEVERITY_CRITICAL: &str = "CRITICAL";
pub const SEVERITY_WARNING: &str = "WARNING";
pub const SEVERITY_INFO: &str = "INFO";

pub const PO_DRAFT: &str = "DRAFT";
pub const PO_SUBMITTED: &str = "SUBMITTED";
pub const PO_APPROVED: &str = "APPROVED";
pub const PO_RECEIVED: &str = "RECEIVED";
pub const PO_CANCELLED: &str = "CANCELLED";
pub const VALID_PO_STATUSES: &[&str] = &[PO_DRAFT, PO_SUBMITTED, PO_APPROVED, PO_RECEIVED, PO_CANCELLED];

/// Purchase orders that still count as open against a material.
pub const OPEN_PO_STATUSES: &[&str] = &[PO_DRAFT, PO_SUBMITTED, PO_APPROVED];

/// Lead time for a supplier created without one.
pub const DEFAULT_LEAD_TIME_DAYS: i32 = 7;

/// Window for usage and waste in the costing report.
pub const COSTING_WINDOW_DAYS: i64 = 30;

pub const MAX_SUPPLIER_RATING: f64 = 5.0;

pub fn validate_category(value: &str) -> Result<(), String> {
    validate_one_of("category", value, VALID_CATEGORIES)
}

pub fn validate_unit(value: &str) -> Result<(), String> {
    validate_one_of("unit_of_measure", value, VALID_UNITS)
}

pub fn validate_rating(rating: f64) -> Result<(), String> {
    if (0.0..=MAX_SUPPLIER_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(format!("rating must be between 0 and {MAX_SUPPLIER_RATING}"))
    }
}

/// Reorder point must not exceed the maximum level when both are set.
pub fn validate_levels(reorder_point: f64, max_stock_level: Option<f64>) -> Result<(), String> {
    if reorder_point < 0.0 {
        return Err("reorder_point must not be negative".to_string());
    }
    match max_stock_level {
        Some(max) if max < reorder_point => {
            Err("max_stock_level must be at least reorder_point".to_string())
        }
        _ => Ok(()),
    }
}

/// Signed stock change for a movement.
///
/// Purchases add, usage and waste subtract whatever sign the caller sent,
/// and adjustments keep theirs. Zero is refused.
pub fn signed_quantity(movement_type: &str, quantity: f64) -> Result<f64, String> {
    validate_one_of("movement_type", movement_type, VALID_MOVEMENT_TYPES)?;
    if !quantity.is_finite() || quantity == 0.0 {
        return Err("quantity must be a non-zero number".to_string());
    }
    Ok(match movement_type {
        MOVEMENT_PURCHASE => quantity.abs(),
        MOVEMENT_USAGE | MOVEMENT_WASTE => -quantity.abs(),
        _ => quantity,
    })
}

/// A stock condition worth surfacing for one material.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockLevel {
    pub alert_type: &'static str,
    pub severity: &'static str,
    pub threshold: f64,
}

/// Classify a stock level. Empty stock is critical, anything at or below
/// the reorder point is a warning, and stock above the maximum level is
/// informational.
pub fn stock_level(current: f64, reorder_point: f64, max_stock_level: Option<f64>) -> Option<StockLevel> {
    if current <= 0.0 {
        Some(StockLevel {
            alert_type: ALERT_OUT_OF_STOCK,
            severity: SEVERITY_CRITICAL,
            threshold: reorder_point,
        })
    } else if current <= reorder_point {
        Some(StockLevel {
            alert_type: ALERT_LOW_STOCK,
            severity: SEVERITY_WARNING,
            threshold: reorder_point,
        })
    } else {
        max_stock_level.filter(|max| current > *max).map(|max| StockLevel {
            alert_type: ALERT_OVERSTOCK,
            severity: SEVERITY_INFO,
            threshold: max,
        })
    }
}

/// Whether the level should trigger a reorder.
pub fn needs_reorder(level: &StockLevel) -> bool {
    level.alert_type != ALERT_OVERSTOCK
}

/// Sort key putting critical alerts first.
pub fn severity_rank(severity: &str) -> u8 {
    match severity {
        SEVERITY_CRITICAL => 0,
        SEVERITY_WARNING => 1,
        _ => 2,
    }
}

pub fn alert_message(material_name: &str, level: &StockLevel, current: f64) -> String {
    match level.alert_type {
        ALERT_OUT_OF_STOCK => format!("{material_name} is out of stock"),
        ALERT_LOW_STOCK => format!(
            "{material_name} is below reorder point ({current}/{})",
            level.threshold
        ),
        _ => format!("{material_name} is above its maximum level ({current}/{})", level.threshold),
    }
}

/// Quantity to order when a material runs low: a configured reorder
/// quantity wins, otherwise enough to reach twice the reorder point.
/// `None` when nothing needs ordering.
pub fn reorder_quantity(reorder_point: f64, current: f64, configured: Option<f64>) -> Option<f64> {
    let qty = configured
        .filter(|q| *q > 0.0)
        .unwrap_or(reorder_point * 2.0 - current);
    (qty > 0.0).then(|| round2(qty))
}

pub fn line_total(quantity: f64, unit_price: f64) -> f64 {
    round2(quantity * unit_price)
}

/// `PO-2026-0004`
pub fn format_po_number(year: i32, sequence: i64) -> String {
    format!("PO-{year}-{sequence:04}")
}

pub mod state_machine {
    use super::*;

    pub fn valid_transitions(from: &str) -> &'static [&'static str] {
        match from {
            PO_DRAFT => &[PO_SUBMITTED, PO_CANCELLED],
            PO_SUBMITTED => &[PO_APPROVED, PO_DRAFT, PO_CANCELLED],
            PO_APPROVED => &[PO_RECEIVED, PO_CANCELLED],
            _ => &[],
        }
    }

    pub fn validate_transition(from: &str, to: &str) -> Result<(), String> {
        if valid_transitions(from).contains(&to) {
            Ok(())
        } else {
            Err(transition_error("purchase order", from, to))
        }
    }
}

/// Thirty-day cost picture for one material.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialCosting {
    pub total_stock_value: f64,
    pub waste_percentage: f64,
    pub waste_cost: f64,
    pub usage_last_30_days: f64,
    pub projected_cost_monthly: f64,
}

/// `usage` counts every outbound quantity in the window, waste included.
pub fn costing(current_stock: f64, unit_cost: f64, usage: f64, waste: f64) -> MaterialCosting {
    MaterialCosting {
        total_stock_value: round2(current_stock * unit_cost),
        waste_percentage: percentage(waste, usage),
        waste_cost: round2(waste * unit_cost),
        usage_last_30_days: round2(usage),
        projected_cost_monthly: round2(usage * unit_cost),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_signs_follow_type() {
        assert_eq!(signed_quantity("PURCHASE", -5.0), Ok(5.0));
        assert_eq!(signed_quantity("USAGE", 5.0), Ok(-5.0));
        assert_eq!(signed_quantity("WASTE", -2.5), Ok(-2.5));
        assert_eq!(signed_quantity("ADJUSTMENT", -3.0), Ok(-3.0));
        assert!(signed_quantity("ADJUSTMENT", 0.0).is_err());
        assert!(signed_quantity("THEFT", 1.0).is_err());
    }

    #[test]
    fn stock_levels() {
        let out = stock_level(0.0, 10.0, None).unwrap();
        assert_eq!((out.alert_type, out.severity), (ALERT_OUT_OF_STOCK, SEVERITY_CRITICAL));

        let low = stock_level(10.0, 10.0, Some(100.0)).unwrap();
        assert_eq!((low.alert_type, low.severity), (ALERT_LOW_STOCK, SEVERITY_WARNING));
        assert!(needs_reorder(&low));

        assert_eq!(stock_level(50.0, 10.0, Some(100.0)), None);

        let over = stock_level(120.0, 10.0, Some(100.0)).unwrap();
        assert_eq!(over.alert_type, ALERT_OVERSTOCK);
        assert_eq!(over.threshold, 100.0);
        assert!(!needs_reorder(&over));
    }

    #[test]
    fn reorder_tops_up_to_twice_the_point() {
        assert_eq!(reorder_quantity(10.0, 4.0, None), Some(16.0));
        assert_eq!(reorder_quantity(10.0, 4.0, Some(50.0)), Some(50.0));
        assert_eq!(reorder_quantity(10.0, 25.0, None), None);
        assert_eq!(reorder_quantity(0.0, 0.0, Some(0.0)), None);
    }

    #[test]
    fn po_lifecycle() {
        use state_machine::validate_transition;
        assert!(validate_transition(PO_DRAFT, PO_SUBMITTED).is_ok());
        assert!(validate_transition(PO_SUBMITTED, PO_APPROVED).is_ok());
        assert!(validate_transition(PO_APPROVED, PO_RECEIVED).is_ok());
        assert!(validate_transition(PO_DRAFT, PO_RECEIVED).is_err());
        assert!(validate_transition(PO_RECEIVED, PO_CANCELLED).is_err());
        assert!(validate_transition(PO_CANCELLED, PO_DRAFT).is_err());
        assert_eq!(format_po_number(2026, 4), "PO-2026-0004");
    }

    #[test]
    fn costing_rolls_waste_into_usage() {
        let c = costing(40.0, 2.5, 20.0, 5.0);
        assert_eq!(c.total_stock_value, 100.0);
        assert_eq!(c.waste_percentage, 25.0);
        assert_eq!(c.waste_cost, 12.5);
        assert_eq!(c.projected_cost_monthly, 50.0);
        assert_eq!(costing(0.0, 1.0, 0.0, 0.0).waste_percentage, 0.0);
    }

    #[test]
    fn levels_validate_ordering() {
        assert!(validate_levels(10.0, Some(100.0)).is_ok());
        assert!(validate_levels(10.0, Some(5.0)).is_err());
        assert!(validate_levels(-1.0, None).is_err());
        assert!(validate_rating(5.5).is_err());
    }
}
