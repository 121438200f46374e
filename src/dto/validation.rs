//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted party or participant name, in characters.
pub const MAX_NAME_LEN: u64 = 64;
/// Longest accepted song title, in characters.
pub const MAX_TITLE_LEN: u64 = 200;

/// Rejects values made only of whitespace.
///
/// # Examples
///
/// ```ignore
/// validate_not_blank("Alice") // Ok
/// validate_not_blank("   ")   // Err
/// ```
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("value must contain at least one non-whitespace character".into());
        return Err(err);
    }
    Ok(())
}
