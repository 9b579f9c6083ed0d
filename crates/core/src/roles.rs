//! Well-known role name constants.
//!
//! These must match the `chk_users_role` constraint in
//! `20261001000001_create_workspaces_and_users.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_STAFF: &str = "staff";

/// All assignable roles.
pub const VALID_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_MANAGER, ROLE_STAFF];

/// Validate that a role name is one of the known roles.
pub fn validate_role(role: &str) -> Result<(), String> {
    if VALID_ROLES.contains(&role) {
        Ok(())
    } else {
        Err(format!(
            "Invalid role '{role}'. Must be one of: {}",
            VALID_ROLES.join(", ")
        ))
    }
}

/// Whether the role may perform privileged actions (approvals, locks, deletes).
pub fn is_manager_or_above(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_MANAGER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_roles_validate() {
        for role in VALID_ROLES {
            assert!(validate_role(role).is_ok());
        }
    }

    #[test]
    fn unknown_role_rejected() {
        assert!(validate_role("owner").is_err());
    }

    #[test]
    fn staff_is_not_manager() {
        assert!(is_manager_or_above(ROLE_ADMIN));
        assert!(is_manager_or_above(ROLE_MANAGER));
        assert!(!is_manager_or_above(ROLE_STAFF));
    }
}
