//! Input validation helpers
//!
//! Centralized text length constants and validation functions.

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Notes, descriptions, reasons (elevation reason, shift notes)
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: ids, currency codes
pub const MAX_SHORT_TEXT_LEN: usize = 100;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty"))
            .with_detail("field", field));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("cover register", "reason", MAX_NOTE_LEN).is_ok());
        assert!(validate_required_text("   ", "reason", MAX_NOTE_LEN).is_err());
        let long = "x".repeat(MAX_NOTE_LEN + 1);
        let err = validate_required_text(&long, "reason", MAX_NOTE_LEN).unwrap_err();
        assert!(err.message.contains("too long"));
    }

    #[test]
    fn test_optional_text() {
        assert!(validate_optional_text(&None, "notes", 10).is_ok());
        assert!(validate_optional_text(&Some("short".into()), "notes", 10).is_ok());
        assert!(validate_optional_text(&Some("x".repeat(11)), "notes", 10).is_err());
    }
}
