//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest external video id accepted from clients.
const MAX_YOUTUBE_ID_LEN: usize = 64;

/// Validates an external video id: URL-safe characters only, no whitespace.
///
/// An empty id is accepted so a draft can be cleared field by field; the
/// tracking gate rejects it later.
///
/// # Examples
///
/// ```ignore
/// validate_youtube_id("dQw4w9WgXcQ") // Ok
/// validate_youtube_id("")            // Ok - cleared
/// validate_youtube_id("abc 123")     // Err - whitespace
/// ```
pub fn validate_youtube_id(id: &str) -> Result<(), ValidationError> {
    let id = id.trim();
    if id.len() > MAX_YOUTUBE_ID_LEN {
        let mut err = ValidationError::new("youtube_id_length");
        err.message = Some(
            format!(
                "Video id must be at most {MAX_YOUTUBE_ID_LEN} characters (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        let mut err = ValidationError::new("youtube_id_format");
        err.message = Some("Video id may only contain letters, digits, '-' and '_'".into());
        return Err(err);
    }

    Ok(())
}
