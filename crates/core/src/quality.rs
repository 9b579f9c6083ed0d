//! Quality control vocabulary and the inspection lifecycle.

use crate::validation::{transition_error, validate_one_of};

pub const VALID_DEFECT_CATEGORIES: &[&str] = &["FABRIC", "SEWING", "PRINTING", "FINISHING"];

pub const SEVERITY_CRITICAL: &str = "CRITICAL";
pub const SEVERITY_MAJOR: &str = "MAJOR";
pub const SEVERITY_MINOR: &str = "MINOR";
pub const VALID_SEVERITIES: &[&str] = &[SEVERITY_CRITICAL, SEVERITY_MAJOR, SEVERITY_MINOR];

pub const VALID_CHECKLIST_TYPES: &[&str] = &["INLINE_PRINTING", "INLINE_SEWING", "FINAL"];

pub const INSPECTION_PENDING: &str = "PENDING";
pub const INSPECTION_IN_PROGRESS: &str = "IN_PROGRESS";
pub const INSPECTION_COMPLETED: &str = "COMPLETED";

/// Days until an auto-created CAPA from a rejected inspection is due.
pub const AUTO_CAPA_DUE_DAYS: i64 = 7;

pub fn validate_defect_category(value: &str) -> Result<(), String> {
    validate_one_of("defect category", value, VALID_DEFECT_CATEGORIES)
}

pub fn validate_severity(value: &str) -> Result<(), String> {
    validate_one_of("severity", value, VALID_SEVERITIES)
}

pub fn validate_checklist_type(value: &str) -> Result<(), String> {
    validate_one_of("inspection type", value, VALID_CHECKLIST_TYPES)
}

pub fn validate_lot_size(lot_size: i64) -> Result<(), String> {
    if lot_size >= 1 {
        Ok(())
    } else {
        Err("lot_size must be at least 1".to_string())
    }
}

/// The counter column incremented when a defect of `severity` is recorded.
pub fn severity_counter_column(severity: &str) -> Option<&'static str> {
    match severity {
        SEVERITY_CRITICAL => Some("critical_found"),
        SEVERITY_MAJOR => Some("major_found"),
        SEVERITY_MINOR => Some("minor_found"),
        _ => None,
    }
}

pub mod state_machine {
    use super::*;

    pub fn valid_transitions(from: &str) -> &'static [&'static str] {
        match from {
            INSPECTION_PENDING => &[INSPECTION_IN_PROGRESS],
            INSPECTION_IN_PROGRESS => &[INSPECTION_COMPLETED],
            _ => &[],
        }
    }

    pub fn validate_transition(from: &str, to: &str) -> Result<(), String> {
        if valid_transitions(from).contains(&to) {
            Ok(())
        } else {
            Err(transition_error("inspection", from, to))
        }
    }
}

/// Defects can only be recorded while an inspection is in progress.
pub fn validate_can_record_defect(status: &str) -> Result<(), String> {
    if status == INSPECTION_IN_PROGRESS {
        Ok(())
    } else {
        Err(format!("Cannot record defects on an inspection that is {status}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_maps_to_counter() {
        assert_eq!(severity_counter_column(SEVERITY_CRITICAL), Some("critical_found"));
        assert_eq!(severity_counter_column(SEVERITY_MINOR), Some("minor_found"));
        assert_eq!(severity_counter_column("COSMETIC"), None);
    }

    #[test]
    fn inspection_lifecycle() {
        use state_machine::validate_transition;
        assert!(validate_transition(INSPECTION_PENDING, INSPECTION_IN_PROGRESS).is_ok());
        assert!(validate_transition(INSPECTION_IN_PROGRESS, INSPECTION_COMPLETED).is_ok());
        assert!(validate_transition(INSPECTION_PENDING, INSPECTION_COMPLETED).is_err());
        assert!(validate_transition(INSPECTION_COMPLETED, INSPECTION_IN_PROGRESS).is_err());
    }

    #[test]
    fn defects_only_while_in_progress() {
        assert!(validate_can_record_defect(INSPECTION_IN_PROGRESS).is_ok());
        assert!(validate_can_record_defect(INSPECTION_PENDING).is_err());
    }

    #[test]
    fn vocabularies() {
        assert!(validate_defect_category("PRINTING").is_ok());
        assert!(validate_defect_category("PACKAGING").is_err());
        assert!(validate_checklist_type("FINAL").is_ok());
        assert!(validate_lot_size(0).is_err());
    }
}
