//! # STACKIT
//!
//! Service account key (`serviceaccount.json`) plus the `project-id` it belongs to.
//!
//! The service account document and its nested `credentials` object are
//! validated in strict mode. Identifiers and key attributes are matched
//! against regex patterns. `aud` is the only field users may add patterns for;
//! without a matching pattern it must be an `https` URL below `stackit.cloud`.
//!
//! STACKIT secrets may also carry OpenStack credentials. Those are validated
//! with the OpenStack rules and kept when valid; failing them is not an error.

use super::pem::{PemBlock, DER_SEQUENCE};
use super::{CredentialValidator, OpenStackValidator, ProviderKind, SecretData};
use crate::pattern::{NormalizedPattern, Pattern, ValidationContext};
use crate::validation::{
    assert_printable_string, assert_string, coerce_bytes_to_strings, fields_from_json,
    string_with_pattern, BaseValidator, FieldError, FieldRule, FieldValue, Fields,
    PatternMatcher, PatternMismatchError, RegexValueMatcher, Registry, UriMatcher,
    ValidationError, ValidationMode,
};
use tracing::debug;
use url::Url;

/// Secret entry holding the service account key document
pub const SERVICE_ACCOUNT_FIELD: &str = "serviceaccount.json";

/// Secret entry holding the project UUID
pub const PROJECT_ID_FIELD: &str = "project-id";

const AUD_FIELD: &str = "aud";
const AUD_HOST_SUFFIX: &str = ".stackit.cloud";

const UUID_REGEX: &str = "^[0-9a-fA-F-]{36}$";

/// DER encoding of the rsaEncryption algorithm OID (1.2.840.113549.1.1.1)
const RSA_ENCRYPTION_OID: [u8; 11] = [
    0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01,
];

pub fn default_patterns() -> Vec<Pattern> {
    vec![
        Pattern::regex_value(PROJECT_ID_FIELD, UUID_REGEX),
        Pattern::regex_value("id", UUID_REGEX),
        Pattern::regex_value("sub", UUID_REGEX),
        Pattern::regex_value("kid", UUID_REGEX),
        Pattern::regex_value("keyType", "^(USER_MANAGED|SYSTEM_MANAGED)$"),
        Pattern::regex_value("keyOrigin", "^(USER_PROVIDED|GENERATED)$"),
        Pattern::regex_value("keyAlgorithm", "^(RSA_2048|RSA_4096)$"),
        Pattern::regex_value("iss", r"^[\w.-]+@([\w-]+\.)?sa\.stackit\.cloud$"),
    ]
}

/// HTTPS only; users may add regex or URI patterns for `aud`
pub fn validation_context() -> ValidationContext {
    ValidationContext::new(true)
        .with_regex_fields([
            PROJECT_ID_FIELD,
            "id",
            "sub",
            "kid",
            "keyType",
            "keyOrigin",
            "keyAlgorithm",
            "iss",
            AUD_FIELD,
        ])
        .with_user_configurable_fields([AUD_FIELD])
}

#[derive(Debug, Clone)]
pub struct StackitValidator {
    base: BaseValidator,
    /// Validates optional OpenStack credentials in the same secret
    openstack: OpenStackValidator,
}

impl StackitValidator {
    pub fn new(allowed_patterns: Vec<Pattern>) -> Self {
        Self {
            base: BaseValidator::new(allowed_patterns),
            openstack: OpenStackValidator::default(),
        }
    }
}

impl Default for StackitValidator {
    fn default() -> Self {
        Self::new(default_patterns())
    }
}

impl CredentialValidator for StackitValidator {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Stackit
    }

    fn validate_secret(&self, data: &SecretData) -> Result<Fields, ValidationError> {
        let fields = coerce_bytes_to_strings(data);

        let registry = Registry::from([
            (
                SERVICE_ACCOUNT_FIELD.to_string(),
                FieldRule::required().with_validator(validate_service_account_json),
            ),
            (
                PROJECT_ID_FIELD.to_string(),
                FieldRule::required()
                    .with_validator(validate_project_id)
                    .non_sensitive(),
            ),
        ]);

        let mut validated =
            self.base
                .validate_with_registry(&fields, &registry, ValidationMode::Permissive)?;

        match self.openstack.validate_secret(data) {
            Ok(openstack) => validated.extend(openstack),
            Err(e) => debug!(field = %e.field(), "Skipping OpenStack credentials in STACKIT secret"),
        }

        Ok(validated)
    }

    fn base(&self) -> &BaseValidator {
        &self.base
    }
}

fn service_account_registry() -> Registry {
    let regex = || string_with_pattern(RegexValueMatcher);

    Registry::from([
        (
            "id".to_string(),
            FieldRule::optional().with_validator(regex()).non_sensitive(),
        ),
        (
            "publicKey".to_string(),
            FieldRule::optional()
                .with_validator(validate_public_key)
                .non_sensitive(),
        ),
        (
            "createdAt".to_string(),
            FieldRule::optional()
                .with_validator(validate_rfc3339_time)
                .non_sensitive(),
        ),
        (
            "validUntil".to_string(),
            FieldRule::optional()
                .with_validator(validate_rfc3339_time)
                .non_sensitive(),
        ),
        (
            "keyType".to_string(),
            FieldRule::optional().with_validator(regex()).non_sensitive(),
        ),
        (
            "keyOrigin".to_string(),
            FieldRule::optional().with_validator(regex()).non_sensitive(),
        ),
        (
            "keyAlgorithm".to_string(),
            FieldRule::optional().with_validator(regex()).non_sensitive(),
        ),
        (
            "active".to_string(),
            FieldRule::optional()
                .with_validator(validate_bool)
                .non_sensitive(),
        ),
        (
            "credentials".to_string(),
            FieldRule::required().with_validator(validate_credentials),
        ),
    ])
}

fn credentials_registry() -> Registry {
    let regex = || string_with_pattern(RegexValueMatcher);

    Registry::from([
        (
            "kid".to_string(),
            FieldRule::required().with_validator(regex()).non_sensitive(),
        ),
        (
            "iss".to_string(),
            FieldRule::required().with_validator(regex()).non_sensitive(),
        ),
        (
            "sub".to_string(),
            FieldRule::required().with_validator(regex()).non_sensitive(),
        ),
        (
            AUD_FIELD.to_string(),
            FieldRule::required()
                .with_validator(validate_audience)
                .non_sensitive(),
        ),
        (
            "privateKey".to_string(),
            FieldRule::required().with_validator(validate_private_key),
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
        FieldError::new(field, "no valid json", non_sensitive).with_cause(e)
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

fn validate_credentials(
    v: &BaseValidator,
    field: &str,
    value: &FieldValue,
    _fields: &Fields,
    non_sensitive: bool,
) -> Result<(), ValidationError> {
    let FieldValue::Mapping(credentials) = value else {
        return Err(FieldError::new(field, "field value must be an object", non_sensitive).into());
    };

    v.validate_nested_fields_strict(credentials, &credentials_registry())
}

fn validate_project_id(
    v: &BaseValidator,
    field: &str,
    value: &FieldValue,
    fields: &Fields,
    non_sensitive: bool,
) -> Result<(), ValidationError> {
    let value = assert_printable_string(field, value, non_sensitive)?;
    v.validate_field_pattern(field, value, fields, &RegexValueMatcher, non_sensitive)
}

/// Regex patterns match the raw value, all other patterns are URI patterns
///
/// An audience need not be a URI, so a value the URI matcher rejects outright
/// is a mismatch here and the remaining patterns are still tried.
#[derive(Debug, Clone, Copy, Default)]
struct AudienceMatcher;

impl PatternMatcher for AudienceMatcher {
    fn match_value(
        &self,
        value: &str,
        pattern: &NormalizedPattern,
        fields: &Fields,
        non_sensitive: bool,
    ) -> Result<(), ValidationError> {
        if pattern.regex_value.is_some() {
            RegexValueMatcher.match_value(value, pattern, fields, non_sensitive)
        } else {
            UriMatcher
                .match_value(value, pattern, fields, non_sensitive)
                .map_err(|e| {
                    if e.is_mismatch() {
                        return e;
                    }
                    PatternMismatchError::with_values(
                        &pattern.field,
                        "value is not an allowed URI",
                        value,
                        "",
                        non_sensitive,
                    )
                    .with_cause(e)
                    .into()
                })
        }
    }
}

/// Allowed patterns first, then an `https` URL on a `stackit.cloud` subdomain
fn validate_audience(
    v: &BaseValidator,
    field: &str,
    value: &FieldValue,
    fields: &Fields,
    non_sensitive: bool,
) -> Result<(), ValidationError> {
    let value = assert_printable_string(field, value, non_sensitive)?;

    match v.validate_field_pattern(field, value, fields, &AudienceMatcher, non_sensitive) {
        Ok(()) => return Ok(()),
        Err(e) => debug!(field = %field, reason = %e.message(), "No allowed pattern for audience, checking default"),
    }

    let parsed = Url::parse(value).map_err(|e| {
        FieldError::new(field, "field cannot be parsed as url", non_sensitive).with_cause(e)
    })?;

    if !parsed
        .host_str()
        .is_some_and(|host| host.ends_with(AUD_HOST_SUFFIX))
    {
        return Err(FieldError::new(field, "field is not a valid url", non_sensitive)
            .with_value(value)
            .into());
    }

    if parsed.scheme() != "https" {
        return Err(
            FieldError::new(field, "field is using a url without https", non_sensitive)
                .with_value(value)
                .into(),
        );
    }

    Ok(())
}

fn validate_bool(
    _v: &BaseValidator,
    field: &str,
    value: &FieldValue,
    _fields: &Fields,
    non_sensitive: bool,
) -> Result<(), ValidationError> {
    match value {
        FieldValue::Bool(_) => Ok(()),
        _ => Err(FieldError::new(field, "field value must be a bool", non_sensitive).into()),
    }
}

fn validate_rfc3339_time(
    _v: &BaseValidator,
    field: &str,
    value: &FieldValue,
    _fields: &Fields,
    non_sensitive: bool,
) -> Result<(), ValidationError> {
    let value = assert_printable_string(field, value, non_sensitive)?;

    chrono::DateTime::parse_from_rfc3339(value).map_err(|e| {
        FieldError::new(field, "field cannot be parsed as time", non_sensitive)
            .with_value(value)
            .with_cause(e)
    })?;

    Ok(())
}

/// Structural check of an RSA public key PEM document
///
/// Requires exactly one PEM block whose body decodes to a DER sequence naming
/// the rsaEncryption algorithm.
fn validate_public_key(
    _v: &BaseValidator,
    field: &str,
    value: &FieldValue,
    _fields: &Fields,
    non_sensitive: bool,
) -> Result<(), ValidationError> {
    let value = assert_string(field, value, non_sensitive)?;
    let der = pem_der(field, value, "public", non_sensitive)?.1;

    if !der
        .windows(RSA_ENCRYPTION_OID.len())
        .any(|window| window == RSA_ENCRYPTION_OID)
    {
        return Err(FieldError::new(field, "field value must be an RSA public key", non_sensitive).into());
    }

    Ok(())
}

/// Structural check of a PKCS#8 or PKCS#1 private key PEM document
fn validate_private_key(
    _v: &BaseValidator,
    field: &str,
    value: &FieldValue,
    _fields: &Fields,
    non_sensitive: bool,
) -> Result<(), ValidationError> {
    let value = assert_string(field, value, non_sensitive)?;
    let (label, _) = pem_der(field, value, "private", non_sensitive)?;

    if !matches!(label, "PRIVATE KEY" | "RSA PRIVATE KEY") {
        return Err(FieldError::new(field, "unknown private key type", non_sensitive).into());
    }

    Ok(())
}

/// Label and DER body of the only PEM block in `value`
fn pem_der<'a>(
    field: &str,
    value: &'a str,
    kind: &str,
    non_sensitive: bool,
) -> Result<(&'a str, Vec<u8>), ValidationError> {
    let fail = |message: &str| -> ValidationError { FieldError::new(field, message, non_sensitive).into() };

    if !value.starts_with("-----BEGIN ") {
        return Err(fail("field value must start with a PEM BEGIN line"));
    }

    let block = PemBlock::parse(value)
        .ok_or_else(|| fail(&format!("field value must be a valid PEM-encoded {kind} key")))?;

    if !block.is_only_block() {
        return Err(fail(
            "field value must contain exactly one PEM block (unexpected data after END line)",
        ));
    }

    let der = block.der().map_err(|e| {
        ValidationError::from(
            FieldError::new(field, "field value cannot be parsed", non_sensitive).with_cause(e),
        )
    })?;

    if der.first() != Some(&DER_SEQUENCE) {
        return Err(fail("field value cannot be parsed"));
    }

    Ok((block.label, der))
}
