//! # Hetzner Cloud
//!
//! API token credentials.

use super::{CredentialValidator, ProviderKind, SecretData};
use crate::pattern::{Pattern, ValidationContext};
use crate::validation::{
    assert_printable_string, coerce_bytes_to_strings, validate_exact_length, BaseValidator,
    FieldRule, FieldValue, Fields, RegexValueMatcher, Registry, ValidationError, ValidationMode,
};

const TOKEN_LEN: usize = 64;

pub fn default_patterns() -> Vec<Pattern> {
    vec![Pattern::regex_value("hcloudToken", "^[A-Za-z0-9]{64}$")]
}

pub fn validation_context() -> ValidationContext {
    ValidationContext::new(true).with_regex_fields(["hcloudToken"])
}

#[derive(Debug, Clone)]
pub struct HCloudValidator {
    base: BaseValidator,
}

impl HCloudValidator {
    pub fn new(allowed_patterns: Vec<Pattern>) -> Self {
        Self {
            base: BaseValidator::new(allowed_patterns),
        }
    }
}

impl Default for HCloudValidator {
    fn default() -> Self {
        Self::new(default_patterns())
    }
}

impl CredentialValidator for HCloudValidator {
    fn provider(&self) -> ProviderKind {
        ProviderKind::HCloud
    }

    fn validate_secret(&self, data: &SecretData) -> Result<Fields, ValidationError> {
        let fields = coerce_bytes_to_strings(data);

        let registry = Registry::from([(
            "hcloudToken".to_string(),
            FieldRule::required().with_validator(validate_token),
        )]);

        self.base
            .validate_with_registry(&fields, &registry, ValidationMode::Permissive)
    }

    fn base(&self) -> &BaseValidator {
        &self.base
    }
}

fn validate_token(
    v: &BaseValidator,
    field: &str,
    value: &FieldValue,
    fields: &Fields,
    non_sensitive: bool,
) -> Result<(), ValidationError> {
    let value = assert_printable_string(field, value, non_sensitive)?;
    validate_exact_length(field, value, TOKEN_LEN, non_sensitive)?;
    v.validate_field_pattern(field, value, fields, &RegexValueMatcher, non_sensitive)
}
