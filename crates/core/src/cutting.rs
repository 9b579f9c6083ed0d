//! Cutting room rules: fabric issue checks, bundle splitting and
//! utilization.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::money::{percentage, round2};
use crate::validation::validate_one_of;

pub const UOM_KG: &str = "KG";
pub const UOM_M: &str = "M";
pub const VALID_UOMS: &[&str] = &[UOM_KG, UOM_M];

pub fn validate_uom(uom: &str) -> Result<(), String> {
    validate_one_of("uom", uom, VALID_UOMS)
}

/// Check that `requested` can be drawn from a batch holding `on_hand`.
pub fn validate_fabric_issue(on_hand: f64, requested: f64) -> Result<(), String> {
    if requested <= 0.0 {
        return Err("Issue quantity must be greater than zero".to_string());
    }
    if on_hand < requested {
        return Err(format!(
            "Insufficient fabric: {on_hand} on hand, {requested} requested"
        ));
    }
    Ok(())
}

/// Validate lay measurements.
pub fn validate_lay(plies: i32, gross_used: f64, offcuts: f64, defects: f64) -> Result<(), String> {
    if plies < 1 {
        return Err("plies must be at least 1".to_string());
    }
    if gross_used <= 0.0 {
        return Err("gross_used must be greater than zero".to_string());
    }
    if offcuts < 0.0 || defects < 0.0 {
        return Err("offcuts and defects must not be negative".to_string());
    }
    if offcuts + defects > gross_used {
        return Err("offcuts and defects cannot exceed gross_used".to_string());
    }
    Ok(())
}

/// A planned bundle for one size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundlePlan {
    pub size_code: String,
    pub qty: i32,
}

/// Split lay outputs into bundles.
///
/// For each `(size_code, qty)` output with a configured bundle size `n`,
/// emit `qty / n` full bundles of `n` pieces plus one remainder bundle when
/// `qty % n > 0`. Sizes with no configured (or a non-positive) bundle size
/// are skipped. Output order follows the lay outputs.
pub fn plan_bundles(outputs: &[(String, i32)], bundle_size_per_size: &BTreeMap<String, i32>) -> Vec<BundlePlan> {
    let mut plans = Vec::new();
    for (size_code, qty) in outputs {
        let Some(&size) = bundle_size_per_size.get(size_code) else {
            continue;
        };
        if size <= 0 || *qty <= 0 {
            continue;
        }
        let full = qty / size;
        let remainder = qty % size;
        for _ in 0..full {
            plans.push(BundlePlan {
                size_code: size_code.clone(),
                qty: size,
            });
        }
        if remainder > 0 {
            plans.push(BundlePlan {
                size_code: size_code.clone(),
                qty: remainder,
            });
        }
    }
    plans
}

/// QR payload printed on a bundle tag.
pub fn bundle_qr_code(order_number: &str, bundle_no: i32) -> String {
    format!("ash://bundle/{order_number}/{bundle_no:04}")
}

/// Cutting summary figures for an order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CuttingSummary {
    pub total_fabric_issued: f64,
    pub total_gross_used: f64,
    pub total_pieces_cut: i64,
    pub total_bundles: i64,
    pub fabric_utilization: f64,
}

impl CuttingSummary {
    pub fn new(issued: f64, gross_used: f64, pieces: i64, bundles: i64) -> Self {
        Self {
            total_fabric_issued: round2(issued),
            total_gross_used: round2(gross_used),
            total_pieces_cut: pieces,
            total_bundles: bundles,
            fabric_utilization: percentage(gross_used, issued),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(pairs: &[(&str, i32)]) -> BTreeMap<String, i32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn issue_rejected_when_short() {
        assert!(validate_fabric_issue(10.0, 10.0).is_ok());
        let err = validate_fabric_issue(4.5, 5.0).unwrap_err();
        assert!(err.contains("Insufficient fabric"));
        assert!(validate_fabric_issue(10.0, 0.0).is_err());
    }

    #[test]
    fn lay_validation() {
        assert!(validate_lay(40, 25.0, 1.5, 0.5).is_ok());
        assert!(validate_lay(0, 25.0, 0.0, 0.0).is_err());
        assert!(validate_lay(10, 5.0, 4.0, 2.0).is_err());
    }

    #[test]
    fn bundles_split_with_remainder() {
        let outputs = vec![("M".to_string(), 45), ("L".to_string(), 20)];
        let plans = plan_bundles(&outputs, &sizes(&[("M", 20), ("L", 10)]));
        let qtys: Vec<_> = plans.iter().map(|p| (p.size_code.as_str(), p.qty)).collect();
        assert_eq!(qtys, [("M", 20), ("M", 20), ("M", 5), ("L", 10), ("L", 10)]);
    }

    #[test]
    fn sizes_without_bundle_size_are_skipped() {
        let outputs = vec![("XS".to_string(), 12), ("S".to_string(), 7)];
        let plans = plan_bundles(&outputs, &sizes(&[("S", 10), ("XS", 0)]));
        assert_eq!(
            plans,
            vec![BundlePlan {
                size_code: "S".to_string(),
                qty: 7
            }]
        );
    }

    #[test]
    fn qr_code_format() {
        assert_eq!(bundle_qr_code("RX-2026-000001", 3), "ash://bundle/RX-2026-000001/0003");
    }

    #[test]
    fn utilization_rounds_and_guards_zero() {
        let s = CuttingSummary::new(120.0, 100.0, 800, 40);
        assert_eq!(s.fabric_utilization, 83.33);
        assert_eq!(CuttingSummary::new(0.0, 0.0, 0, 0).fabric_utilization, 0.0);
    }
}
