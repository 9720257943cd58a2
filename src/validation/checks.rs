//! # Field Checks
//!
//! Reusable checks for provider field validators. Lengths are byte lengths.

use super::error::{FieldError, ValidationError};
use super::value::FieldValue;

/// Borrow the value as a string or fail with "field value must be a string"
pub fn assert_string<'a>(
    field: &str,
    value: &'a FieldValue,
    non_sensitive: bool,
) -> Result<&'a str, ValidationError> {
    value
        .as_str()
        .ok_or_else(|| FieldError::new(field, "field value must be a string", non_sensitive).into())
}

/// Like [`assert_string`], additionally rejecting control characters
pub fn assert_printable_string<'a>(
    field: &str,
    value: &'a FieldValue,
    non_sensitive: bool,
) -> Result<&'a str, ValidationError> {
    let value = assert_string(field, value, non_sensitive)?;

    if value.chars().any(char::is_control) {
        return Err(FieldError::new(
            field,
            "field value must not contain control characters",
            non_sensitive,
        )
        .into());
    }

    Ok(value)
}

pub fn validate_exact_length(
    field: &str,
    value: &str,
    expected: usize,
    non_sensitive: bool,
) -> Result<(), ValidationError> {
    if value.len() == expected {
        return Ok(());
    }

    Err(FieldError::new(
        field,
        format!(
            "field value must be exactly {expected} characters, got {}",
            value.len()
        ),
        non_sensitive,
    )
    .with_value(value)
    .into())
}

pub fn validate_min_length(
    field: &str,
    value: &str,
    min: usize,
    non_sensitive: bool,
) -> Result<(), ValidationError> {
    if value.len() >= min {
        return Ok(());
    }

    Err(FieldError::new(
        field,
        format!(
            "field value must be at least {min} characters, got {}",
            value.len()
        ),
        non_sensitive,
    )
    .with_value(value)
    .into())
}

pub fn validate_max_length(
    field: &str,
    value: &str,
    max: usize,
    non_sensitive: bool,
) -> Result<(), ValidationError> {
    if value.len() <= max {
        return Ok(());
    }

    Err(FieldError::new(
        field,
        format!(
            "field value must be at most {max} characters, got {}",
            value.len()
        ),
        non_sensitive,
    )
    .with_value(value)
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::RenderOptions;

    #[test]
    fn test_assert_string() {
        assert_eq!(assert_string("f", &FieldValue::from("x"), false).unwrap(), "x");
        let err = assert_string("f", &FieldValue::Bool(true), false).unwrap_err();
        assert_eq!(err.message(), "field value must be a string");
    }

    #[test]
    fn test_assert_printable_string() {
        assert!(assert_printable_string("f", &FieldValue::from("abc def"), false).is_ok());
        assert!(assert_printable_string("f", &FieldValue::from("abc\ndef"), false).is_err());
        assert!(assert_printable_string("f", &FieldValue::from("a\u{7f}"), false).is_err());
    }

    #[test]
    fn test_length_checks() {
        assert!(validate_exact_length("f", "abcd", 4, false).is_ok());
        assert_eq!(
            validate_exact_length("f", "abc", 4, false).unwrap_err().message(),
            "field value must be exactly 4 characters, got 3"
        );
        assert!(validate_min_length("f", "abc", 3, false).is_ok());
        assert_eq!(
            validate_min_length("f", "ab", 3, false).unwrap_err().message(),
            "field value must be at least 3 characters, got 2"
        );
        assert!(validate_max_length("f", "abc", 3, false).is_ok());
        assert_eq!(
            validate_max_length("f", "abcd", 3, false).unwrap_err().message(),
            "field value must be at most 3 characters, got 4"
        );
    }

    #[test]
    fn test_length_error_redacts_sensitive_value() {
        let err = validate_exact_length("secret", "hunter2", 40, false).unwrap_err();
        assert!(!err.render(&RenderOptions::REDACTED).contains("hunter2"));
        assert!(err
            .render(&RenderOptions { reveal_sensitive: true })
            .contains("(value: \"hunter2\")"));
    }
}
