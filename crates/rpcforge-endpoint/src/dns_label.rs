// SPDX-License-Identifier: MIT OR Apache-2.0
//! DNS label (LDH) validation for `hostLabel` values.

/// Validate `value` as a single DNS label: letters, digits, and hyphens
/// only, not starting or ending with a hyphen, 1–63 characters.
pub fn validate(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("must not be empty".to_string());
    }
    if value.len() > 63 {
        return Err(format!("must be at most 63 characters, was {}", value.len()));
    }
    if value.starts_with('-') || value.ends_with('-') {
        return Err("must not start or end with a hyphen".to_string());
    }
    if !value.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        return Err("must contain only letters, digits, and hyphens".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_ldh_label() {
        assert!(validate("my-bucket-1").is_ok());
    }

    #[test]
    fn rejects_leading_hyphen() {
        assert!(validate("-bucket").is_err());
    }

    #[test]
    fn rejects_underscore() {
        assert!(validate("my_bucket").is_err());
    }

    #[test]
    fn rejects_overlong_label() {
        assert!(validate(&"a".repeat(64)).is_err());
    }
}
