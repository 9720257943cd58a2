//! # GCP
//!
//! Service account credentials (`serviceaccount.json`).
//!
//! The JSON document is validated in strict mode: every key must be known.
//! URI fields are matched against the allowed patterns, which users may extend
//! via configuration or flags. `client_x509_cert_url` may reference the service
//! account e-mail through the `{client_email}` placeholder.

use super::pem::{PemBlock, DER_SEQUENCE};
use super::{CredentialValidator, ProviderKind, SecretData};
use crate::constants::CLIENT_EMAIL_PLACEHOLDER;
use crate::pattern::{Pattern, ValidationContext};
use crate::validation::{
    assert_string, coerce_bytes_to_strings, fields_from_json, string_with_pattern,
    BaseValidator, DomainMatcher, FieldError, FieldRule, FieldValue, Fields,
    PlaceholderUriMatcher, RegexValueMatcher, Registry, UriMatcher, ValidationError,
    ValidationMode,
};
use regex::Regex;
use std::sync::LazyLock;

/// Secret entry holding the service account document
pub const SERVICE_ACCOUNT_FIELD: &str = "serviceaccount.json";

const URI_FIELDS: [&str; 4] = [
    "token_uri",
    "auth_uri",
    "auth_provider_x509_cert_url",
    "client_x509_cert_url",
];

static PROJECT_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9-]{4,28}[a-z0-9]$")
        .expect("Failed to compile PROJECT_ID_REGEX - this should never happen")
});

pub fn default_patterns() -> Vec<Pattern> {
    vec![
        Pattern::regex_value("private_key_id", "^[a-fA-F0-9]{40}$"),
        Pattern::regex_value("client_id", "^[0-9]{15,25}$"),
        Pattern::regex_value(
            "client_email",
            r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.iam\.gserviceaccount\.com$",
        ),
        Pattern::regex_value(
            "client_email",
            r"^[0-9]+-compute@developer\.gserviceaccount\.com$",
        ),
        Pattern::host_path("universe_domain", "googleapis.com", ""),
        Pattern::uri("token_uri", "https://accounts.google.com/o/oauth2/token"),
        Pattern::uri("token_uri", "https://oauth2.googleapis.com/token"),
        Pattern::uri("auth_uri", "https://accounts.google.com/o/oauth2/auth"),
        Pattern::uri(
            "auth_provider_x509_cert_url",
            "https://www.googleapis.com/oauth2/v1/certs",
        ),
        Pattern::host_path(
            "client_x509_cert_url",
            "www.googleapis.com",
            format!("/robot/v1/metadata/x509/{CLIENT_EMAIL_PLACEHOLDER}"),
        ),
    ]
}

/// HTTPS only; users may add patterns for URI fields and `universe_domain`
pub fn validation_context() -> ValidationContext {
    ValidationContext::new(true)
        .with_regex_fields(["private_key_id", "client_id", "client_email"])
        .with_user_configurable_fields(URI_FIELDS.into_iter().chain(["universe_domain"]))
}

#[derive(Debug, Clone)]
pub struct GcpValidator {
    base: BaseValidator,
}

impl GcpValidator {
    pub fn new(allowed_patterns: Vec<Pattern>) -> Self {
        Self {
            base: BaseValidator::new(allowed_patterns),
        }
    }
}

impl Default for GcpValidator {
    fn default() -> Self {
        Self::new(default_patterns())
    }
}

impl CredentialValidator for GcpValidator {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Gcp
    }

    fn validate_secret(&self, data: &SecretData) -> Result<Fields, ValidationError> {
        let fields = coerce_bytes_to_strings(data);

        let registry = Registry::from([(
            SERVICE_ACCOUNT_FIELD.to_string(),
            FieldRule::required().with_validator(validate_service_account_json),
        )]);

        self.base
            .validate_with_registry(&fields, &registry, ValidationMode::Permissive)
    }

    fn base(&self) -> &BaseValidator {
        &self.base
    }
}

fn service_account_registry() -> Registry {
    let regex = || string_with_pattern(RegexValueMatcher);
    let uri = || string_with_pattern(UriMatcher);

    Registry::from([
        (
            "type".to_string(),
            FieldRule::required()
                .with_validator(validate_service_account_type)
                .non_sensitive(),
        ),
        (
            "project_id".to_string(),
            FieldRule::required()
                .with_validator(validate_project_id)
                .non_sensitive(),
        ),
        (
            "private_key_id".to_string(),
            FieldRule::optional().with_validator(regex()).non_sensitive(),
        ),
        (
            "private_key".to_string(),
            FieldRule::optional().with_validator(validate_private_key),
        ),
        (
            "client_email".to_string(),
            FieldRule::optional().with_validator(regex()),
        ),
        (
            "client_id".to_string(),
            FieldRule::optional().with_validator(regex()),
        ),
        (
            "auth_uri".to_string(),
            FieldRule::optional().with_validator(uri()).non_sensitive(),
        ),
        (
            "token_uri".to_string(),
            FieldRule::optional().with_validator(uri()).non_sensitive(),
        ),
        (
            "auth_provider_x509_cert_url".to_string(),
            FieldRule::optional().with_validator(uri()).non_sensitive(),
        ),
        (
            "client_x509_cert_url".to_string(),
            FieldRule::optional()
                .with_validator(string_with_pattern(PlaceholderUriMatcher::client_email()))
                .non_sensitive(),
        ),
        (
            "universe_domain".to_string(),
            FieldRule::optional()
                .with_validator(string_with_pattern(DomainMatcher))
                .non_sensitive(),
        ),
    ])
}

fn validate_service_account_json(
    v: &BaseValidator,
    field: &str,
    value: &FieldValue,
    _fields: &Fields,
    non_sensitive: bool,
) -> Result<(), ValidationError> {
    let document = assert_string(field, value, non_sensitive)?;

    let parsed: serde_json::Value = serde_json::from_str(document).map_err(|e| {
        FieldError::new(field, "failed to unmarshal service account JSON", non_sensitive)
            .with_cause(e)
    })?;

    let nested = fields_from_json(parsed).ok_or_else(|| {
        FieldError::new(
            field,
            "service account JSON must be an object",
            non_sensitive,
        )
    })?;

    v.validate_nested_fields_strict(&nested, &service_account_registry())
}

fn validate_service_account_type(
    _v: &BaseValidator,
    field: &str,
    value: &FieldValue,
    _fields: &Fields,
    non_sensitive: bool,
) -> Result<(), ValidationError> {
    let value = assert_string(field, value, non_sensitive)?;

    if value != "service_account" {
        return Err(
            FieldError::new(field, "type must be 'service_account'", non_sensitive)
                .with_value(value)
                .into(),
        );
    }

    Ok(())
}

fn validate_project_id(
    _v: &BaseValidator,
    field: &str,
    value: &FieldValue,
    _fields: &Fields,
    non_sensitive: bool,
) -> Result<(), ValidationError> {
    let value = assert_string(field, value, non_sensitive)?;

    if !PROJECT_ID_REGEX.is_match(value) {
        return Err(FieldError::new(
            field,
            "field does not match the expected format",
            non_sensitive,
        )
        .with_value(value)
        .into());
    }

    Ok(())
}

/// Structural check of a PKCS#8 private key PEM document
///
/// Requires exactly one `PRIVATE KEY` block without headers or surrounding data
/// whose base64 body decodes to a DER sequence. The key material itself is not parsed.
fn validate_private_key(
    _v: &BaseValidator,
    field: &str,
    value: &FieldValue,
    _fields: &Fields,
    non_sensitive: bool,
) -> Result<(), ValidationError> {
    let value = assert_string(field, value, non_sensitive)?;
    let fail = |message: &str| -> ValidationError { FieldError::new(field, message, non_sensitive).into() };

    if !value.starts_with("-----BEGIN ") {
        return Err(fail("field value must start with a PEM BEGIN line"));
    }

    let block = PemBlock::parse(value)
        .ok_or_else(|| fail("field value must be a valid PEM-encoded private key"))?;

    if !block.is_only_block() {
        return Err(fail(
            "field value must contain exactly one PEM block (unexpected data after END line)",
        ));
    }

    if block.label != "PRIVATE KEY" {
        return Err(fail(
            "field value must be a PKCS#8 PEM block (BEGIN PRIVATE KEY)",
        ));
    }

    if block.has_headers {
        return Err(fail("field value must not include PEM headers"));
    }

    let der = block.der().map_err(|e| {
        ValidationError::from(
            FieldError::new(field, "field value cannot be parsed", non_sensitive).with_cause(e),
        )
    })?;

    // PKCS#8 PrivateKeyInfo is a DER SEQUENCE
    if der.first() != Some(&DER_SEQUENCE) {
        return Err(fail("field value cannot be parsed"));
    }

    Ok(())
}
