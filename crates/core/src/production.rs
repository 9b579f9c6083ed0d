//! Bundle status flow on the production floor.

use crate::validation::{transition_error, validate_one_of};

pub const BUNDLE_CREATED: &str = "CREATED";
pub const BUNDLE_IN_PROGRESS: &str = "IN_PROGRESS";
pub const BUNDLE_DONE: &str = "DONE";
pub const BUNDLE_ON_HOLD: &str = "ON_HOLD";

pub const VALID_BUNDLE_STATUSES: &[&str] =
    &[BUNDLE_CREATED, BUNDLE_IN_PROGRESS, BUNDLE_DONE, BUNDLE_ON_HOLD];

pub fn validate_bundle_status(value: &str) -> Result<(), String> {
    validate_one_of("bundle status", value, VALID_BUNDLE_STATUSES)
}

pub mod state_machine {
    use super::*;

    pub fn valid_transitions(from: &str) -> &'static [&'static str] {
        match from {
            BUNDLE_CREATED => &[BUNDLE_IN_PROGRESS, BUNDLE_ON_HOLD],
            BUNDLE_IN_PROGRESS => &[BUNDLE_DONE, BUNDLE_ON_HOLD],
            BUNDLE_ON_HOLD => &[BUNDLE_CREATED, BUNDLE_IN_PROGRESS],
            _ => &[],
        }
    }

    pub fn can_transition(from: &str, to: &str) -> bool {
        valid_transitions(from).contains(&to)
    }

    pub fn validate_transition(from: &str, to: &str) -> Result<(), String> {
        validate_bundle_status(to)?;
        if can_transition(from, to) {
            Ok(())
        } else {
            Err(transition_error("bundle", from, to))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::state_machine::*;
    use super::*;

    #[test]
    fn forward_flow() {
        assert!(can_transition(BUNDLE_CREATED, BUNDLE_IN_PROGRESS));
        assert!(can_transition(BUNDLE_IN_PROGRESS, BUNDLE_DONE));
        assert!(!can_transition(BUNDLE_CREATED, BUNDLE_DONE));
    }

    #[test]
    fn hold_and_release() {
        assert!(can_transition(BUNDLE_IN_PROGRESS, BUNDLE_ON_HOLD));
        assert!(can_transition(BUNDLE_ON_HOLD, BUNDLE_IN_PROGRESS));
        assert!(!can_transition(BUNDLE_DONE, BUNDLE_ON_HOLD));
    }

    #[test]
    fn unknown_target_is_rejected() {
        assert!(validate_transition(BUNDLE_CREATED, "SHIPPED").is_err());
    }
}
