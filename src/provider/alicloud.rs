//! # Alibaba Cloud
//!
//! Access key credentials. Workload identity is not supported.

use super::{CredentialValidator, ProviderKind, SecretData};
use crate::pattern::{Pattern, ValidationContext};
use crate::validation::{
    assert_printable_string, coerce_bytes_to_strings, validate_exact_length, BaseValidator,
    FieldRule, FieldValue, Fields, RegexValueMatcher, Registry, ValidationError, ValidationMode,
};

const ACCESS_KEY_ID_LEN: usize = 24;
const ACCESS_KEY_SECRET_LEN: usize = 30;

pub fn default_patterns() -> Vec<Pattern> {
    vec![
        Pattern::regex_value("accessKeyID", "^LTAI[A-Za-z0-9]{20}$"),
        Pattern::regex_value("accessKeySecret", "^[A-Za-z0-9]{30}$"),
    ]
}

pub fn validation_context() -> ValidationContext {
    ValidationContext::new(true).with_regex_fields(["accessKeyID", "accessKeySecret"])
}

#[derive(Debug, Clone)]
pub struct AliCloudValidator {
    base: BaseValidator,
}

impl AliCloudValidator {
    pub fn new(allowed_patterns: Vec<Pattern>) -> Self {
        Self {
            base: BaseValidator::new(allowed_patterns),
        }
    }
}

impl Default for AliCloudValidator {
    fn default() -> Self {
        Self::new(default_patterns())
    }
}

impl CredentialValidator for AliCloudValidator {
    fn provider(&self) -> ProviderKind {
        ProviderKind::AliCloud
    }

    fn validate_secret(&self, data: &SecretData) -> Result<Fields, ValidationError> {
        let fields = coerce_bytes_to_strings(data);

        let registry = Registry::from([
            (
                "accessKeyID".to_string(),
                FieldRule::required()
                    .with_validator(fixed_length(ACCESS_KEY_ID_LEN))
                    .non_sensitive(),
            ),
            (
                "accessKeySecret".to_string(),
                FieldRule::required().with_validator(fixed_length(ACCESS_KEY_SECRET_LEN)),
            ),
        ]);

        self.base
            .validate_with_registry(&fields, &registry, ValidationMode::Permissive)
    }

    fn base(&self) -> &BaseValidator {
        &self.base
    }
}

/// Printable string of exactly `len` bytes matching the allowed regex patterns
fn fixed_length(
    len: usize,
) -> impl Fn(&BaseValidator, &str, &FieldValue, &Fields, bool) -> Result<(), ValidationError>
       + Send
       + Sync {
    move |v, field, value, fields, non_sensitive| {
        let value = assert_printable_string(field, value, non_sensitive)?;
        validate_exact_length(field, value, len, non_sensitive)?;
        v.validate_field_pattern(field, value, fields, &RegexValueMatcher, non_sensitive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::RenderOptions;

    fn secret(id: &str, key: &str) -> SecretData {
        SecretData::from([
            ("accessKeyID".to_string(), id.as_bytes().to_vec()),
            ("accessKeySecret".to_string(), key.as_bytes().to_vec()),
        ])
    }

    #[test]
    fn test_valid_access_key() {
        let id = format!("LTAI{}", "a1".repeat(10));
        let key = "B2".repeat(15);
        assert!(AliCloudValidator::default().validate_secret(&secret(&id, &key)).is_ok());
    }

    #[test]
    fn test_wrong_prefix_reveals_non_sensitive_id() {
        let id = format!("XXXX{}", "a1".repeat(10));
        let key = "B2".repeat(15);
        let err = AliCloudValidator::default()
            .validate_secret(&secret(&id, &key))
            .unwrap_err();

        assert!(err.is_mismatch());
        assert!(err.render(&RenderOptions::REDACTED).contains(&id));
    }

    #[test]
    fn test_secret_length() {
        let id = format!("LTAI{}", "a1".repeat(10));
        let err = AliCloudValidator::default()
            .validate_secret(&secret(&id, "short"))
            .unwrap_err();
        assert_eq!(err.message(), "field value must be exactly 30 characters, got 5");
    }

    #[test]
    fn test_workload_identity_not_supported() {
        let err = AliCloudValidator::default()
            .validate_workload_identity_config(Some(b"{}"))
            .unwrap_err();
        assert_eq!(err.message(), "workload identity not supported for alicloud");
    }
}
