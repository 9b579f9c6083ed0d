//! Client and brand rules.

/// Order statuses that block deleting a client.
pub const DELETE_BLOCKING_ORDER_STATUSES: &[&str] = &["draft", "confirmed", "in_progress"];

/// Maximum number of recent orders embedded in a client detail response.
pub const RECENT_ORDERS_LIMIT: i64 = 10;

/// Normalise a brand code: trimmed and upper-cased. Empty codes become `None`.
pub fn normalize_brand_code(code: Option<&str>) -> Option<String> {
    code.map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_uppercase)
}

/// Validate that a brand code is short and alphanumeric.
pub fn validate_brand_code(code: &str) -> Result<(), String> {
    if code.len() > 10 {
        return Err("Brand code must be at most 10 characters".to_string());
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("Brand code must be alphanumeric".to_string());
    }
    Ok(())
}

/// Fail when `active_orders` is non-zero.
pub fn validate_deletable(active_orders: i64) -> Result<(), String> {
    if active_orders > 0 {
        Err(format!(
            "Cannot delete client with {active_orders} active order(s)"
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_code_normalised() {
        assert_eq!(normalize_brand_code(Some(" rx ")), Some("RX".to_string()));
        assert_eq!(normalize_brand_code(Some("   ")), None);
        assert_eq!(normalize_brand_code(None), None);
    }

    #[test]
    fn brand_code_rules() {
        assert!(validate_brand_code("REEFER1").is_ok());
        assert!(validate_brand_code("RE-1").is_err());
        assert!(validate_brand_code("ABCDEFGHIJK").is_err());
    }

    #[test]
    fn client_with_active_orders_not_deletable() {
        assert!(validate_deletable(0).is_ok());
        let msg = validate_deletable(2).unwrap_err();
        assert!(msg.contains("2 active order"));
    }
}
