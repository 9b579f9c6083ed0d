//! Audit logging constants.
//!
//! Every mutating handler records one audit row. The action vocabulary is
//! deliberately small so the audit list can be filtered reliably.

pub const ACTION_CREATE: &str = "create";
pub const ACTION_UPDATE: &str = "update";
pub const ACTION_DELETE: &str = "delete";
pub const ACTION_APPROVE: &str = "approve";
pub const ACTION_STATUS_CHANGE: &str = "status_change";

/// All recognised audit actions.
pub const VALID_ACTIONS: &[&str] = &[
    ACTION_CREATE,
    ACTION_UPDATE,
    ACTION_DELETE,
    ACTION_APPROVE,
    ACTION_STATUS_CHANGE,
];

/// Validate an audit action filter value.
pub fn validate_action(action: &str) -> Result<(), String> {
    if VALID_ACTIONS.contains(&action) {
        Ok(())
    } else {
        Err(format!(
            "Invalid audit action '{action}'. Must be one of: {}",
            VALID_ACTIONS.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_actions_pass() {
        assert!(validate_action(ACTION_STATUS_CHANGE).is_ok());
    }

    #[test]
    fn unknown_action_fails() {
        assert!(validate_action("purge").is_err());
    }
}
