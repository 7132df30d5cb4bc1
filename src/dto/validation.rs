//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a string field is neither empty nor whitespace-only.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("not_blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank_accepts_content() {
        assert!(not_blank("quiz night").is_ok());
        assert!(not_blank(" x ").is_ok());
    }

    #[test]
    fn test_not_blank_rejects_empty_and_whitespace() {
        assert!(not_blank("").is_err());
        assert!(not_blank("   ").is_err());
        assert!(not_blank("\t\n").is_err());
    }
}
