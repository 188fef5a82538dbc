//! Validation helpers for DTOs.

use validator::ValidationError;

/// Alphabet used for room join codes. Ambiguous glyphs (0/O, 1/I/L) are
/// excluded so codes survive being read aloud.
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
/// Length of a room join code.
pub const ROOM_CODE_LENGTH: usize = 6;

const MAX_NAME_LENGTH: usize = 32;

/// Validates that a room code is exactly six characters from the join-code
/// alphabet.
///
/// # Examples
///
/// ```ignore
/// validate_room_code("ABC234") // Ok
/// validate_room_code("abc234") // Err - lowercase
/// validate_room_code("ABC0II") // Err - ambiguous glyphs
/// ```
pub fn validate_room_code(code: &str) -> Result<(), ValidationError> {
    if code.len() != ROOM_CODE_LENGTH {
        let mut err = ValidationError::new("room_code_length");
        err.message = Some(
            format!(
                "Room code must be exactly {} characters (got {})",
                ROOM_CODE_LENGTH,
                code.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !code
        .bytes()
        .all(|byte| ROOM_CODE_ALPHABET.contains(&byte))
    {
        let mut err = ValidationError::new("room_code_format");
        err.message = Some("Room code contains characters outside the join-code alphabet".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a player display name: non-blank after trimming and at most 32
/// characters.
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("player_name_blank");
        err.message = Some("Player name must not be blank".into());
        return Err(err);
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        let mut err = ValidationError::new("player_name_length");
        err.message =
            Some(format!("Player name must be at most {MAX_NAME_LENGTH} characters").into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_room_code_valid() {
        assert!(validate_room_code("ABC234").is_ok());
        assert!(validate_room_code("ZZZZZZ").is_ok());
        assert!(validate_room_code("234567").is_ok());
    }

    #[test]
    fn test_validate_room_code_invalid_length() {
        assert!(validate_room_code("ABC23").is_err()); // too short
        assert!(validate_room_code("ABC2345").is_err()); // too long
        assert!(validate_room_code("").is_err()); // empty
    }

    #[test]
    fn test_validate_room_code_invalid_format() {
        assert!(validate_room_code("abc234").is_err()); // lowercase
        assert!(validate_room_code("ABC10O").is_err()); // ambiguous glyphs
        assert!(validate_room_code("ABC 34").is_err()); // space
    }

    #[test]
    fn test_validate_player_name() {
        assert!(validate_player_name("Alice").is_ok());
        assert!(validate_player_name("  ").is_err());
        assert!(validate_player_name(&"x".repeat(33)).is_err());
        assert!(validate_player_name(&"x".repeat(32)).is_ok());
    }
}
