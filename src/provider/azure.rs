//! # Azure
//!
//! Service principal credentials.

use super::{CredentialValidator, ProviderKind, SecretData};
use crate::pattern::{Pattern, ValidationContext};
use crate::validation::{
    assert_string, coerce_bytes_to_strings, string_with_pattern, validate_max_length,
    validate_min_length, BaseValidator, FieldRule, FieldValue, Fields, RegexValueMatcher,
    Registry, ValidationError, ValidationMode,
};

const GUID_PATTERN: &str = "^[0-9A-Fa-f]{8}-([0-9A-Fa-f]{4}-){3}[0-9A-Fa-f]{12}$";
const CLIENT_SECRET_MIN_LEN: usize = 32;
const CLIENT_SECRET_MAX_LEN: usize = 44;

pub fn default_patterns() -> Vec<Pattern> {
    vec![
        Pattern::regex_value("subscriptionID", GUID_PATTERN),
        Pattern::regex_value("tenantID", GUID_PATTERN),
        Pattern::regex_value("clientID", GUID_PATTERN),
        Pattern::regex_value("clientSecret", r"^[A-Za-z0-9._:~+/=@?\[\]-]+$"),
    ]
}

pub fn validation_context() -> ValidationContext {
    ValidationContext::new(true).with_regex_fields([
        "subscriptionID",
        "tenantID",
        "clientID",
        "clientSecret",
    ])
}

#[derive(Debug, Clone)]
pub struct AzureValidator {
    base: BaseValidator,
}

impl AzureValidator {
    pub fn new(allowed_patterns: Vec<Pattern>) -> Self {
        Self {
            base: BaseValidator::new(allowed_patterns),
        }
    }
}

impl Default for AzureValidator {
    fn default() -> Self {
        Self::new(default_patterns())
    }
}

impl CredentialValidator for AzureValidator {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Azure
    }

    fn validate_secret(&self, data: &SecretData) -> Result<Fields, ValidationError> {
        let fields = coerce_bytes_to_strings(data);

        let guid = || {
            FieldRule::required()
                .with_validator(string_with_pattern(RegexValueMatcher))
                .non_sensitive()
        };

        let registry = Registry::from([
            ("subscriptionID".to_string(), guid()),
            ("tenantID".to_string(), guid()),
            ("clientID".to_string(), guid()),
            (
                "clientSecret".to_string(),
                FieldRule::required().with_validator(validate_client_secret),
            ),
        ]);

        self.base
            .validate_with_registry(&fields, &registry, ValidationMode::Permissive)
    }

    fn base(&self) -> &BaseValidator {
        &self.base
    }
}

fn validate_client_secret(
    v: &BaseValidator,
    field: &str,
    value: &FieldValue,
    fields: &Fields,
    non_sensitive: bool,
) -> Result<(), ValidationError> {
    let value = assert_string(field, value, non_sensitive)?;
    validate_min_length(field, value, CLIENT_SECRET_MIN_LEN, non_sensitive)?;
    validate_max_length(field, value, CLIENT_SECRET_MAX_LEN, non_sensitive)?;
    v.validate_field_pattern(field, value, fields, &RegexValueMatcher, non_sensitive)
}
