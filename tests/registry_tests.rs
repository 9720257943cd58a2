//! # Registry Tests
//!
//! Field validation through the registry and matchers.
//!
//! These tests verify:
//! - Strict vs permissive handling of unknown fields
//! - Mismatch vs hard error classification of URI candidates
//! - Exact host and as-written path comparison
//! - Regex value matching
//! - Redaction of sensitive values, and the unsafe debug override

use credential_validator::constants::UNSAFE_DEBUG_ENV_VAR;
use credential_validator::pattern::Pattern;
use credential_validator::validation::{
    string_with_pattern, BaseValidator, FieldError, FieldRule, FieldValue, Fields,
    PatternMismatchError, RegexValueMatcher, Registry, RenderOptions, UriMatcher,
    ValidationError, ValidationMode,
};
use std::sync::Mutex;

/// Serializes tests that read or flip the unsafe debug variable
static ENV_GUARD: Mutex<()> = Mutex::new(());

fn fields(entries: &[(&str, &str)]) -> Fields {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), FieldValue::from(*v)))
        .collect()
}

fn uri_registry(field: &str, non_sensitive: bool) -> Registry {
    let rule = FieldRule::required().with_validator(string_with_pattern(UriMatcher));
    let rule = if non_sensitive { rule.non_sensitive() } else { rule };
    Registry::from([(field.to_string(), rule)])
}

#[test]
fn test_strict_mode_rejects_unknown_field() {
    let registry = Registry::from([("a".to_string(), FieldRule::required())]);
    let input = fields(&[("a", "1"), ("b", "2")]);

    let err = BaseValidator::default()
        .validate_with_registry(&input, &registry, ValidationMode::Strict)
        .unwrap_err();

    assert!(!err.is_mismatch());
    assert_eq!(err.field(), "b");
    assert_eq!(err.message(), "field is not allowed");
}

#[test]
fn test_permissive_mode_drops_unknown_field() {
    let registry = Registry::from([("a".to_string(), FieldRule::required())]);
    let input = fields(&[("a", "1"), ("b", "2")]);

    let validated = BaseValidator::default()
        .validate_with_registry(&input, &registry, ValidationMode::Permissive)
        .unwrap();

    assert_eq!(validated, fields(&[("a", "1")]));
}

#[test]
fn test_required_and_optional_fields() {
    let registry = Registry::from([
        ("a".to_string(), FieldRule::required()),
        ("b".to_string(), FieldRule::optional()),
    ]);
    let validator = BaseValidator::default();

    let err = validator
        .validate_with_registry(&fields(&[("b", "x")]), &registry, ValidationMode::Strict)
        .unwrap_err();
    assert_eq!(err.message(), "required field is missing");

    let err = validator
        .validate_with_registry(&fields(&[("a", "")]), &registry, ValidationMode::Strict)
        .unwrap_err();
    assert_eq!(err.message(), "required field cannot be empty");

    let validated = validator
        .validate_with_registry(&fields(&[("a", "x"), ("b", "")]), &registry, ValidationMode::Strict)
        .unwrap();
    assert_eq!(validated.len(), 2);
}

#[test]
fn test_http_candidate_against_https_pattern_is_mismatch() {
    let validator = BaseValidator::new(vec![Pattern::uri("ep", "https://x.example.com")]);

    let err = validator
        .validate_field_pattern("ep", "http://x.example.com", &Fields::new(), &UriMatcher, true)
        .unwrap_err();

    assert!(err.is_mismatch());
}

#[test]
fn test_scheme_mismatch_reason_from_matcher() {
    use credential_validator::validation::PatternMatcher;

    let normalized = Pattern::uri("ep", "https://x.example.com").to_normalized().unwrap();
    let err = UriMatcher
        .match_value("http://x.example.com", &normalized, &Fields::new(), true)
        .unwrap_err();

    assert!(err.is_mismatch());
    assert_eq!(err.message(), "scheme does not match allowed scheme");
}

#[test]
fn test_malformed_candidates_are_hard_errors() {
    let validator = BaseValidator::new(vec![Pattern::uri("ep", "https://x.example.com/token")]);

    for candidate in [
        "https://x.example.com/token?x=1",
        "https://x.example.com/token#frag",
        "https://user@x.example.com/token",
        "ftp://x.example.com/token",
        "not a uri",
    ] {
        let err = validator
            .validate_field_pattern("ep", candidate, &Fields::new(), &UriMatcher, true)
            .unwrap_err();
        assert!(!err.is_mismatch(), "{candidate} should be a hard error");
    }
}

#[test]
fn test_component_inequality_is_mismatch() {
    let validator = BaseValidator::new(vec![
        Pattern::host_path("ep", "x.example.com", "/token").with_port(8443)
    ]);

    for candidate in [
        "https://y.example.com:8443/token",
        "https://x.example.com:9443/token",
        "https://x.example.com/token",
        "https://x.example.com:8443/other",
    ] {
        let err = validator
            .validate_field_pattern("ep", candidate, &Fields::new(), &UriMatcher, true)
            .unwrap_err();
        assert!(err.is_mismatch(), "{candidate} should be a mismatch");
    }

    assert!(validator
        .validate_field_pattern("ep", "https://x.example.com:8443/token", &Fields::new(), &UriMatcher, true)
        .is_ok());
}

#[test]
fn test_host_comparison_is_case_sensitive() {
    let validator = BaseValidator::new(vec![Pattern::host_path("ep", "API.Example.com", "/token")]);

    let err = validator
        .validate_field_pattern("ep", "https://api.example.com/token", &Fields::new(), &UriMatcher, true)
        .unwrap_err();

    assert!(err.is_mismatch());
    assert_eq!(err.message(), "does not match any allowed patterns");
}

#[test]
fn test_dot_segments_are_not_resolved() {
    let validator = BaseValidator::new(vec![Pattern::uri("ep", "https://a.example.com/token")]);

    for candidate in [
        "https://a.example.com/evil/../token",
        "https://a.example.com/./token",
    ] {
        let err = validator
            .validate_field_pattern("ep", candidate, &Fields::new(), &UriMatcher, true)
            .unwrap_err();
        assert!(err.is_mismatch(), "{candidate} should be a mismatch");
    }
}

#[test]
fn test_later_pattern_can_match() {
    let validator = BaseValidator::new(vec![
        Pattern::uri("ep", "https://a.example.com/token"),
        Pattern::uri("other", "https://b.example.com/token"),
        Pattern::uri("ep", "https://b.example.com/token"),
    ]);

    let registry = uri_registry("ep", true);
    let validated = validator
        .validate_with_registry(
            &fields(&[("ep", "https://b.example.com/token")]),
            &registry,
            ValidationMode::Strict,
        )
        .unwrap();

    assert_eq!(validated.len(), 1);
}

#[test]
fn test_no_patterns_for_field_is_mismatch() {
    let err = BaseValidator::default()
        .validate_field_pattern("ep", "https://a.example.com/", &Fields::new(), &UriMatcher, true)
        .unwrap_err();

    assert!(err.is_mismatch());
    assert_eq!(err.message(), "does not match any allowed patterns");
}

#[test]
fn test_regex_value_matching() {
    let validator = BaseValidator::new(vec![Pattern::regex_value("id", "^[A-F0-9]{8}$")]);
    let registry = Registry::from([(
        "id".to_string(),
        FieldRule::required().with_validator(string_with_pattern(RegexValueMatcher)),
    )]);

    assert!(validator
        .validate_with_registry(&fields(&[("id", "DEADBEEF")]), &registry, ValidationMode::Strict)
        .is_ok());

    let err = validator
        .validate_with_registry(&fields(&[("id", "deadbeef")]), &registry, ValidationMode::Strict)
        .unwrap_err();
    assert!(err.is_mismatch());
}

#[test]
fn test_non_string_value_is_hard_error() {
    let validator = BaseValidator::new(vec![Pattern::regex_value("id", "^.*$")]);
    let registry = Registry::from([(
        "id".to_string(),
        FieldRule::required().with_validator(string_with_pattern(RegexValueMatcher)),
    )]);
    let input = Fields::from([("id".to_string(), FieldValue::Bool(true))]);

    let err = validator
        .validate_with_registry(&input, &registry, ValidationMode::Strict)
        .unwrap_err();
    assert!(!err.is_mismatch());
}

#[test]
fn test_sensitive_values_are_redacted() {
    let _guard = ENV_GUARD.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

    let mismatch: ValidationError = PatternMismatchError::with_values(
        "token",
        "path does not match allowed path",
        "/actual-secret",
        "/expected-secret",
        false,
    )
    .into();
    let hard: ValidationError = FieldError::new("token", "bad value", false)
        .with_value("hunter2")
        .into();

    for err in [&mismatch, &hard] {
        let redacted = err.render(&RenderOptions::REDACTED);
        assert!(!redacted.contains("secret"));
        assert!(!redacted.contains("hunter2"));
    }

    let revealed = mismatch.render(&RenderOptions {
        reveal_sensitive: true,
    });
    assert!(revealed.contains("/actual-secret"));
    assert!(revealed.contains("/expected-secret"));
    assert!(hard
        .render(&RenderOptions {
            reveal_sensitive: true
        })
        .contains("hunter2"));
}

#[test]
fn test_non_sensitive_values_are_shown() {
    let err = PatternMismatchError::with_values(
        "host",
        "host does not match allowed host",
        "a.example.com",
        "b.example.com",
        true,
    );

    assert_eq!(
        err.render(&RenderOptions::REDACTED),
        "pattern mismatch in field \"host\": host does not match allowed host (actual: \"a.example.com\", expected: \"b.example.com\")"
    );
}

#[test]
fn test_display_follows_unsafe_debug_env_var() {
    let _guard = ENV_GUARD.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

    let err: ValidationError = PatternMismatchError::with_values(
        "token",
        "does not match any allowed patterns",
        "s3cr3t-value",
        "",
        false,
    )
    .into();

    std::env::remove_var(UNSAFE_DEBUG_ENV_VAR);
    assert!(!err.to_string().contains("s3cr3t-value"));

    std::env::set_var(UNSAFE_DEBUG_ENV_VAR, "true");
    let revealed = err.to_string();
    std::env::remove_var(UNSAFE_DEBUG_ENV_VAR);

    assert!(revealed.contains("s3cr3t-value"));
    assert!(!err.to_string().contains("s3cr3t-value"));
}

#[test]
fn test_custom_field_validator_closure() {
    let registry = Registry::from([(
        "n".to_string(),
        FieldRule::required().with_validator(
            |_v: &BaseValidator,
             field: &str,
             value: &FieldValue,
             _fields: &Fields,
             non_sensitive: bool|
             -> Result<(), ValidationError> {
                match value.as_str() {
                    Some(s) if s.chars().all(|c| c.is_ascii_digit()) => Ok(()),
                    _ => Err(FieldError::new(field, "must be digits", non_sensitive).into()),
                }
            },
        ),
    )]);
    let validator = BaseValidator::default();

    assert!(validator
        .validate_with_registry(&fields(&[("n", "123")]), &registry, ValidationMode::Strict)
        .is_ok());
    assert_eq!(
        validator
            .validate_with_registry(&fields(&[("n", "12a")]), &registry, ValidationMode::Strict)
            .unwrap_err()
            .message(),
        "must be digits"
    );
}
