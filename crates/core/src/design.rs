//! Design asset versioning and the client approval workflow.
//!
//! A design is sent to the client as a tokenised portal link. The token is
//! the only credential the portal needs, so it is generated from 32 bytes
//! of OS randomness and compared by exact match.

use rand::RngCore;

use crate::hashing::{sha256_hex, to_hex};
use crate::order::{STATUS_DESIGN_APPROVAL, STATUS_DESIGN_PENDING, STATUS_INTAKE};
use crate::types::Timestamp;

pub const ASSET_DRAFT: &str = "DRAFT";
pub const ASSET_PENDING_APPROVAL: &str = "PENDING_APPROVAL";
pub const ASSET_APPROVED: &str = "APPROVED";
pub const ASSET_LOCKED: &str = "LOCKED";

pub const APPROVAL_SENT: &str = "SENT";
pub const APPROVAL_APPROVED: &str = "APPROVED";
pub const APPROVAL_CHANGES_REQUESTED: &str = "CHANGES_REQUESTED";

pub const DEFAULT_EXPIRY_HOURS: i64 = 72;
pub const MAX_EXPIRY_HOURS: i64 = 168;

/// Length in bytes of the random portal token before hex encoding.
pub const PORTAL_TOKEN_BYTES: usize = 32;

/// Generate a 64-character lowercase hex portal token.
pub fn generate_portal_token() -> String {
    let mut bytes = [0u8; PORTAL_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    to_hex(&bytes)
}

/// Digest persisted for a portal token. The plaintext is only ever returned
/// once, in the send-approval response.
pub fn portal_token_hash(token: &str) -> String {
    sha256_hex(token.as_bytes())
}

/// Clamp a requested expiry to `1..=MAX_EXPIRY_HOURS`, defaulting to 72.
pub fn clamp_expiry_hours(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_EXPIRY_HOURS).clamp(1, MAX_EXPIRY_HOURS)
}

/// Only approved designs can be locked for production.
pub fn validate_lock(status: &str) -> Result<(), String> {
    if status == ASSET_APPROVED {
        Ok(())
    } else {
        Err(format!("Only APPROVED designs can be locked (current: {status})"))
    }
}

/// Locked designs are frozen; sending another version is refused.
pub fn validate_can_send(status: &str) -> Result<(), String> {
    if status == ASSET_LOCKED {
        Err("Design is locked and cannot be sent for approval".to_string())
    } else {
        Ok(())
    }
}

/// A portal token is usable while the approval is SENT and unexpired.
pub fn is_token_usable(approval_status: &str, expires_at: Timestamp, now: Timestamp) -> bool {
    approval_status == APPROVAL_SENT && expires_at > now
}

/// The order status after a client approves a design, or `None` when the
/// order is past the design stage and stays where it is.
pub fn order_status_after_approval(order_status: &str) -> Option<&'static str> {
    match order_status {
        STATUS_INTAKE | STATUS_DESIGN_PENDING => Some(STATUS_DESIGN_APPROVAL),
        _ => None,
    }
}

/// Change requests must say what to change.
pub fn validate_change_request(comments: Option<&str>) -> Result<(), String> {
    match comments {
        Some(c) if !c.trim().is_empty() => Ok(()),
        _ => Err("Comments are required when requesting changes".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn token_is_64_hex_chars_and_unique() {
        let a = generate_portal_token();
        let b = generate_portal_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn stored_token_hash_is_not_the_token() {
        let token = generate_portal_token();
        let hash = portal_token_hash(&token);
        assert_ne!(hash, token);
        assert_eq!(hash, portal_token_hash(&token));
        assert_ne!(hash, portal_token_hash(&generate_portal_token()));
    }

    #[test]
    fn expiry_is_clamped() {
        assert_eq!(clamp_expiry_hours(None), 72);
        assert_eq!(clamp_expiry_hours(Some(500)), 168);
        assert_eq!(clamp_expiry_hours(Some(0)), 1);
    }

    #[test]
    fn lock_requires_approval() {
        assert!(validate_lock(ASSET_APPROVED).is_ok());
        assert!(validate_lock(ASSET_DRAFT).is_err());
        assert!(validate_can_send(ASSET_LOCKED).is_err());
    }

    #[test]
    fn token_usability() {
        let now = Utc::now();
        assert!(is_token_usable(APPROVAL_SENT, now + Duration::hours(1), now));
        assert!(!is_token_usable(APPROVAL_SENT, now - Duration::seconds(1), now));
        assert!(!is_token_usable(APPROVAL_APPROVED, now + Duration::hours(1), now));
    }

    #[test]
    fn approval_advances_early_orders_only() {
        assert_eq!(order_status_after_approval("intake"), Some("design_approval"));
        assert_eq!(order_status_after_approval("design_pending"), Some("design_approval"));
        assert_eq!(order_status_after_approval("in_progress"), None);
    }

    #[test]
    fn change_request_needs_comments() {
        assert!(validate_change_request(None).is_err());
        assert!(validate_change_request(Some(" ")).is_err());
        assert!(validate_change_request(Some("Move logo up 2cm")).is_ok());
    }
}
