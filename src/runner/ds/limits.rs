//! Size limits on script-built strings and arrays. Going past one is a
//! `RangeError`, never an allocation failure.

use crate::runner::ds::error::JErrorType;

/// Longest string a script can build, in UTF-16 code units.
pub const MAX_STRING_LENGTH: usize = (1 << 29) - 24;

/// Longest array a script can build. Arrays are stored densely, so this is
/// well below the 2^32 - 1 the language allows.
pub const MAX_ARRAY_LENGTH: usize = 1 << 24;

pub fn invalid_string_length() -> JErrorType {
    JErrorType::RangeError("Invalid string length".to_string())
}

pub fn invalid_array_length() -> JErrorType {
    JErrorType::RangeError("Invalid array length".to_string())
}

/// Fails when a string of `units` UTF-16 code units would be too long.
pub fn check_string_length(units: f64) -> Result<(), JErrorType> {
    if units > MAX_STRING_LENGTH as f64 {
        Err(invalid_string_length())
    } else {
        Ok(())
    }
}

/// Fails when an array of `len` elements would be too long.
pub fn check_array_length(len: f64) -> Result<(), JErrorType> {
    if len > MAX_ARRAY_LENGTH as f64 {
        Err(invalid_array_length())
    } else {
        Ok(())
    }
}

/// Whether text of `bytes` UTF-8 bytes is over the limit. UTF-8 never has
/// fewer bytes than UTF-16 has units, so `units` is only counted near it.
fn too_long(bytes: usize, units: impl FnOnce() -> usize) -> bool {
    bytes > MAX_STRING_LENGTH && units() > MAX_STRING_LENGTH
}

/// `a + b` for strings, bounded by [`MAX_STRING_LENGTH`].
pub fn concat(mut a: String, b: &str) -> Result<String, JErrorType> {
    if too_long(a.len() + b.len(), || a.encode_utf16().count() + b.encode_utf16().count()) {
        return Err(invalid_string_length());
    }
    a.push_str(b);
    Ok(a)
}

/// `parts.join(separator)`, bounded by [`MAX_STRING_LENGTH`].
pub fn join(parts: &[String], separator: &str) -> Result<String, JErrorType> {
    let separators = parts.len().saturating_sub(1);
    let bytes = parts
        .iter()
        .map(String::len)
        .fold(separators.saturating_mul(separator.len()), usize::saturating_add);
    let units = || {
        parts
            .iter()
            .map(|p| p.encode_utf16().count())
            .fold(separators.saturating_mul(separator.encode_utf16().count()), usize::saturating_add)
    };
    if too_long(bytes, units) {
        return Err(invalid_string_length());
    }
    Ok(parts.join(separator))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_length_is_only_a_first_guess() {
        assert!(!too_long(10, || unreachable!()));
        // Three bytes but one code unit per character.
        assert!(!too_long(MAX_STRING_LENGTH + 3, || MAX_STRING_LENGTH));
        assert!(too_long(MAX_STRING_LENGTH + 3, || MAX_STRING_LENGTH + 1));
    }

    #[test]
    fn short_strings_join_and_concat() {
        assert_eq!(concat("ab".to_string(), "cd").unwrap(), "abcd");
        assert_eq!(join(&["€".to_string(), "€".to_string()], "-").unwrap(), "€-€");
        assert_eq!(join(&[], ",").unwrap(), "");
    }

    #[test]
    fn lengths_are_checked_before_allocating() {
        assert!(check_array_length(MAX_ARRAY_LENGTH as f64).is_ok());
        assert_eq!(
            check_array_length(4294967295.0).unwrap_err().to_string(),
            "RangeError: Invalid array length"
        );
        assert!(check_string_length(2f64.powi(62)).is_err());
    }
}
