//! Small validation helpers shared by the domain modules.

/// Validate that `value` is one of `allowed`.
///
/// The error names the field and lists the accepted values, matching the
/// message shape used across the API.
pub fn validate_one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), String> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(format!(
            "Invalid {field} '{value}'. Must be one of: {}",
            allowed.join(", ")
        ))
    }
}

/// Validate that a string is non-blank after trimming.
pub fn validate_required(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{field} is required"))
    } else {
        Ok(())
    }
}

/// Human-readable `from -> to` transition error.
pub fn transition_error(entity: &str, from: &str, to: &str) -> String {
    format!("Invalid {entity} transition: {from} -> {to}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_of_lists_allowed_values() {
        let err = validate_one_of("uom", "LB", &["KG", "M"]).unwrap_err();
        assert_eq!(err, "Invalid uom 'LB'. Must be one of: KG, M");
        assert!(validate_one_of("uom", "KG", &["KG", "M"]).is_ok());
    }

    #[test]
    fn required_rejects_whitespace() {
        assert!(validate_required("name", "  ").is_err());
        assert!(validate_required("name", "Reefer").is_ok());
    }
}
