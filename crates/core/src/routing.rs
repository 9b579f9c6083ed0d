//! Routing (production step) generation and step status rules.
//!
//! A routing is the ordered list of production steps an order passes
//! through. It is generated once from the printing methods on the order's
//! line items.

use serde::Serialize;

use crate::validation::{transition_error, validate_one_of};

pub const STEP_PENDING: &str = "pending";
pub const STEP_IN_PROGRESS: &str = "in_progress";
pub const STEP_COMPLETED: &str = "completed";
pub const STEP_SKIPPED: &str = "skipped";

pub const VALID_STEP_STATUSES: &[&str] = &[STEP_PENDING, STEP_IN_PROGRESS, STEP_COMPLETED, STEP_SKIPPED];

/// A routing step to be inserted for an order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepTemplate {
    pub step_number: i32,
    pub name: String,
    pub department: &'static str,
    pub estimated_hours: f64,
    pub requires_qc: bool,
}

/// Display name for a printing method (`"dtf"` -> `"DTF"`, `"silkscreen"` -> `"Silkscreen"`).
pub fn method_display_name(method: &str) -> String {
    if method.eq_ignore_ascii_case("dtf") {
        return "DTF".to_string();
    }
    let mut chars = method.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Build the default routing for an order.
///
/// One printing step is emitted per distinct method, in first-seen order.
pub fn generate_steps<'a, I>(printing_methods: I) -> Vec<StepTemplate>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut methods: Vec<&str> = Vec::new();
    for m in printing_methods {
        if !methods.contains(&m) {
            methods.push(m);
        }
    }

    let mut steps: Vec<(String, &'static str, f64, bool)> = vec![
        ("Order Processing".to_string(), "Admin", 0.5, false),
        ("Cutting".to_string(), "Cutting", 2.0, true),
    ];
    for m in methods {
        steps.push((format!("{} Printing", method_display_name(m)), "Printing", 4.0, true));
    }
    steps.push(("Sewing".to_string(), "Sewing", 8.0, false));
    steps.push(("Quality Control".to_string(), "QC", 1.0, false));
    steps.push(("Finishing & Packing".to_string(), "Finishing", 2.0, true));

    steps
        .into_iter()
        .enumerate()
        .map(|(i, (name, department, estimated_hours, requires_qc))| StepTemplate {
            step_number: i as i32 + 1,
            name,
            department,
            estimated_hours,
            requires_qc,
        })
        .collect()
}

pub fn validate_step_status(status: &str) -> Result<(), String> {
    validate_one_of("routing step status", status, VALID_STEP_STATUSES)
}

/// Validate a step status change. Completed and skipped steps are final.
pub fn validate_step_transition(from: &str, to: &str) -> Result<(), String> {
    let ok = match from {
        STEP_PENDING => matches!(to, STEP_IN_PROGRESS | STEP_COMPLETED | STEP_SKIPPED),
        STEP_IN_PROGRESS => matches!(to, STEP_COMPLETED | STEP_PENDING),
        _ => false,
    };
    if ok || from == to {
        Ok(())
    } else {
        Err(transition_error("routing step", from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_method_routing_has_six_steps() {
        let steps = generate_steps(["silkscreen"]);
        let names: Vec<_> = steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Order Processing",
                "Cutting",
                "Silkscreen Printing",
                "Sewing",
                "Quality Control",
                "Finishing & Packing"
            ]
        );
        assert_eq!(steps[0].step_number, 1);
        assert_eq!(steps[5].step_number, 6);
    }

    #[test]
    fn duplicate_methods_collapse() {
        let steps = generate_steps(["dtf", "embroidery", "dtf"]);
        assert_eq!(steps.len(), 7);
        assert_eq!(steps[2].name, "DTF Printing");
        assert_eq!(steps[3].name, "Embroidery Printing");
        assert!(steps[2].requires_qc);
        assert_eq!(steps[2].estimated_hours, 4.0);
    }

    #[test]
    fn qc_flags_follow_step_table() {
        let steps = generate_steps(Vec::<&str>::new());
        let qc: Vec<_> = steps.iter().map(|s| (s.department, s.requires_qc)).collect();
        assert_eq!(
            qc,
            [
                ("Admin", false),
                ("Cutting", true),
                ("Sewing", false),
                ("QC", false),
                ("Finishing", true)
            ]
        );
    }

    #[test]
    fn step_transitions() {
        assert!(validate_step_transition(STEP_PENDING, STEP_IN_PROGRESS).is_ok());
        assert!(validate_step_transition(STEP_IN_PROGRESS, STEP_COMPLETED).is_ok());
        assert!(validate_step_transition(STEP_COMPLETED, STEP_IN_PROGRESS).is_err());
        assert!(validate_step_transition(STEP_SKIPPED, STEP_PENDING).is_err());
    }
}
