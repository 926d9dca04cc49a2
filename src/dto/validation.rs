//! Validation helpers for inbound WebSocket payloads.

use validator::ValidationError;

/// Longest username accepted, in characters.
pub const MAX_USERNAME_CHARS: usize = 32;
/// Longest arena identifier accepted, in bytes.
pub const MAX_ARENA_ID_LEN: usize = 64;
/// Largest answer accepted, in cells.
pub const MAX_ANSWER_CELLS: usize = 64;

/// Validates that a username is non-blank, at most [`MAX_USERNAME_CHARS`] characters
/// and free of control characters.
///
/// # Examples
///
/// ```ignore
/// validate_username("Alice")   // Ok
/// validate_username("   ")     // Err - blank
/// validate_username("a\nb")    // Err - control character
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        let mut err = ValidationError::new("username_blank");
        err.message = Some("Username must not be blank".into());
        return Err(err);
    }

    let len = username.chars().count();
    if len > MAX_USERNAME_CHARS {
        let mut err = ValidationError::new("username_length");
        err.message = Some(
            format!("Username must be at most {MAX_USERNAME_CHARS} characters (got {len})")
                .into(),
        );
        return Err(err);
    }

    if username.chars().any(char::is_control) {
        let mut err = ValidationError::new("username_format");
        err.message = Some("Username must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that an arena identifier is non-empty and at most [`MAX_ARENA_ID_LEN`] bytes.
pub fn validate_arena_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > MAX_ARENA_ID_LEN {
        let mut err = ValidationError::new("arena_id_length");
        err.message = Some(
            format!(
                "Arena ID must be between 1 and {MAX_ARENA_ID_LEN} characters (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}

/// Validates that an answer lists at most [`MAX_ANSWER_CELLS`] cells.
pub fn validate_answer(answer: &[u32]) -> Result<(), ValidationError> {
    if answer.len() > MAX_ANSWER_CELLS {
        let mut err = ValidationError::new("answer_length");
        err.message = Some(
            format!(
                "Answer must contain at most {MAX_ANSWER_CELLS} cells (got {})",
                answer.len()
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}
