//! # OpenStack
//!
//! Password or application credential authentication, plus validation of the
//! Keystone `authURL` against user-configured patterns.
//!
//! There are no built-in `authURL` patterns: an auth URL is only accepted when
//! configuration or flags allow it.

use super::{CredentialValidator, ProviderKind, SecretData};
use crate::pattern::{Pattern, ValidationContext};
use crate::validation::{
    assert_printable_string, coerce_bytes_to_strings, string_with_pattern, validate_max_length,
    BaseValidator, FieldError, FieldRule, FieldValue, Fields, Registry, UriMatcher,
    ValidationError, ValidationMode,
};

const DOMAIN_NAME_MAX_LEN: usize = 64;
const TENANT_NAME_MAX_LEN: usize = 64;
const USERNAME_MAX_LEN: usize = 255;
const PASSWORD_MAX_LEN: usize = 4096;
const APPLICATION_CREDENTIAL_ID_MAX_LEN: usize = 255;
const APPLICATION_CREDENTIAL_NAME_MAX_LEN: usize = 255;
const APPLICATION_CREDENTIAL_SECRET_MAX_LEN: usize = 4096;

pub const AUTH_URL_FIELD: &str = "authURL";

pub fn default_patterns() -> Vec<Pattern> {
    Vec::new()
}

/// `http` is allowed; patterns decide which scheme a deployment accepts
pub fn validation_context() -> ValidationContext {
    ValidationContext::new(false).with_user_configurable_fields([AUTH_URL_FIELD])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthMethod {
    Password,
    ApplicationCredential,
}

#[derive(Debug, Clone, Default)]
pub struct OpenStackValidator {
    base: BaseValidator,
}

impl OpenStackValidator {
    pub fn new(allowed_patterns: Vec<Pattern>) -> Self {
        Self {
            base: BaseValidator::new(allowed_patterns),
        }
    }

    /// Validate a Keystone auth URL against the allowed `authURL` patterns
    pub fn validate_auth_url(&self, auth_url: &str) -> Result<(), ValidationError> {
        let fields = Fields::from([(AUTH_URL_FIELD.to_string(), FieldValue::from(auth_url))]);

        let registry = Registry::from([(
            AUTH_URL_FIELD.to_string(),
            FieldRule::required()
                .with_validator(string_with_pattern(UriMatcher))
                .non_sensitive(),
        )]);

        self.base.validate_nested_fields_strict(&fields, &registry)
    }

    fn detect_auth_method(data: &SecretData) -> Result<AuthMethod, ValidationError> {
        let present = |key: &str| data.get(key).is_some_and(|v| !v.is_empty());

        match (present("password"), present("applicationCredentialSecret")) {
            (true, true) => Err(FieldError::new(
                "password",
                "cannot specify both 'password' and 'applicationCredentialSecret'",
                true,
            )
            .into()),
            (true, false) => Ok(AuthMethod::Password),
            (false, true) => Ok(AuthMethod::ApplicationCredential),
            (false, false) => Err(FieldError::new(
                "password",
                "must either specify 'password' or 'applicationCredentialSecret'",
                true,
            )
            .into()),
        }
    }

    fn validate_password_auth(&self, fields: &Fields) -> Result<Fields, ValidationError> {
        let registry = Registry::from([
            (
                "domainName".to_string(),
                FieldRule::required()
                    .with_validator(max_length(DOMAIN_NAME_MAX_LEN))
                    .non_sensitive(),
            ),
            (
                "tenantName".to_string(),
                FieldRule::required()
                    .with_validator(max_length(TENANT_NAME_MAX_LEN))
                    .non_sensitive(),
            ),
            (
                "username".to_string(),
                FieldRule::required()
                    .with_validator(max_length(USERNAME_MAX_LEN))
                    .non_sensitive(),
            ),
            (
                "password".to_string(),
                FieldRule::required().with_validator(max_length(PASSWORD_MAX_LEN)),
            ),
        ]);

        self.base
            .validate_with_registry(fields, &registry, ValidationMode::Permissive)
    }

    fn validate_application_credential_auth(
        &self,
        fields: &Fields,
    ) -> Result<Fields, ValidationError> {
        let registry = Registry::from([
            (
                "domainName".to_string(),
                FieldRule::optional()
                    .with_validator(max_length(DOMAIN_NAME_MAX_LEN))
                    .non_sensitive(),
            ),
            (
                "applicationCredentialID".to_string(),
                FieldRule::optional()
                    .with_validator(max_length(APPLICATION_CREDENTIAL_ID_MAX_LEN))
                    .non_sensitive(),
            ),
            (
                "applicationCredentialName".to_string(),
                FieldRule::optional()
                    .with_validator(max_length(APPLICATION_CREDENTIAL_NAME_MAX_LEN))
                    .non_sensitive(),
            ),
            (
                "applicationCredentialSecret".to_string(),
                FieldRule::required()
                    .with_validator(max_length(APPLICATION_CREDENTIAL_SECRET_MAX_LEN)),
            ),
        ]);

        let validated =
            self.base
                .validate_with_registry(fields, &registry, ValidationMode::Permissive)?;

        let id = string_value(fields, "applicationCredentialID")?;
        let name = string_value(fields, "applicationCredentialName")?;

        if id.is_empty() && name.is_empty() {
            return Err(FieldError::new(
                "applicationCredentialID",
                "either 'applicationCredentialID' or 'applicationCredentialName' must be provided",
                true,
            )
            .into());
        }

        if !name.is_empty() && string_value(fields, "domainName")?.is_empty() {
            return Err(FieldError::new(
                "domainName",
                "'domainName' must be provided when using 'applicationCredentialName'",
                true,
            )
            .into());
        }

        Ok(validated)
    }
}

impl CredentialValidator for OpenStackValidator {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenStack
    }

    fn validate_secret(&self, data: &SecretData) -> Result<Fields, ValidationError> {
        let method = Self::detect_auth_method(data)?;
        let fields = coerce_bytes_to_strings(data);

        match method {
            AuthMethod::Password => self.validate_password_auth(&fields),
            AuthMethod::ApplicationCredential => self.validate_application_credential_auth(&fields),
        }
    }

    fn base(&self) -> &BaseValidator {
        &self.base
    }
}

/// Printable string of at most `max` bytes
fn max_length(
    max: usize,
) -> impl Fn(&BaseValidator, &str, &FieldValue, &Fields, bool) -> Result<(), ValidationError>
       + Send
       + Sync {
    move |_v, field, value, _fields, non_sensitive| {
        let value = assert_printable_string(field, value, non_sensitive)?;
        validate_max_length(field, value, max, non_sensitive)
    }
}

/// String value of an optional field; absent is empty
fn string_value<'a>(fields: &'a Fields, field: &str) -> Result<&'a str, ValidationError> {
    match fields.get(field) {
        None => Ok(""),
        Some(value) => value
            .as_str()
            .ok_or_else(|| FieldError::new(field, "field value must be a string", true).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::parse_allowed_patterns;

    fn secret(entries: &[(&str, &str)]) -> SecretData {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn test_password_auth() {
        let validated = OpenStackValidator::default()
            .validate_secret(&secret(&[
                ("domainName", "default"),
                ("tenantName", "project"),
                ("username", "admin"),
                ("password", "s3cret"),
                ("authURL", "https://keystone.example.com/v3"),
            ]))
            .unwrap();

        assert_eq!(validated.len(), 4);
        assert!(!validated.contains_key("authURL"));
    }

    #[test]
    fn test_password_auth_requires_tenant() {
        let err = OpenStackValidator::default()
            .validate_secret(&secret(&[
                ("domainName", "default"),
                ("username", "admin"),
                ("password", "s3cret"),
            ]))
            .unwrap_err();
        assert_eq!(err.field(), "tenantName");
        assert_eq!(err.message(), "required field is missing");
    }

    #[test]
    fn test_conflicting_auth_methods() {
        let err = OpenStackValidator::default()
            .validate_secret(&secret(&[
                ("password", "a"),
                ("applicationCredentialSecret", "b"),
            ]))
            .unwrap_err();
        assert_eq!(
            err.message(),
            "cannot specify both 'password' and 'applicationCredentialSecret'"
        );
    }

    #[test]
    fn test_no_auth_method() {
        let err = OpenStackValidator::default()
            .validate_secret(&secret(&[("username", "admin"), ("password", "")]))
            .unwrap_err();
        assert_eq!(
            err.message(),
            "must either specify 'password' or 'applicationCredentialSecret'"
        );
    }

    #[test]
    fn test_application_credential_by_id() {
        let validated = OpenStackValidator::default()
            .validate_secret(&secret(&[
                ("applicationCredentialID", "abc123"),
                ("applicationCredentialSecret", "secret"),
            ]))
            .unwrap();
        assert_eq!(validated.len(), 2);
    }

    #[test]
    fn test_application_credential_needs_id_or_name() {
        let err = OpenStackValidator::default()
            .validate_secret(&secret(&[("applicationCredentialSecret", "secret")]))
            .unwrap_err();
        assert!(err.message().starts_with("either 'applicationCredentialID'"));
    }

    #[test]
    fn test_application_credential_name_requires_domain() {
        let err = OpenStackValidator::default()
            .validate_secret(&secret(&[
                ("applicationCredentialName", "ci"),
                ("applicationCredentialSecret", "secret"),
            ]))
            .unwrap_err();
        assert_eq!(
            err.message(),
            "'domainName' must be provided when using 'applicationCredentialName'"
        );
    }

    #[test]
    fn test_username_too_long() {
        let long = "u".repeat(256);
        let err = OpenStackValidator::default()
            .validate_secret(&secret(&[
                ("domainName", "default"),
                ("tenantName", "project"),
                ("username", &long),
                ("password", "s3cret"),
            ]))
            .unwrap_err();
        assert_eq!(err.message(), "field value must be at most 255 characters, got 256");
    }

    #[test]
    fn test_auth_url_requires_configured_pattern() {
        let err = OpenStackValidator::default()
            .validate_auth_url("https://keystone.example.com/v3")
            .unwrap_err();
        assert!(err.is_mismatch());
    }

    #[test]
    fn test_auth_url_with_user_patterns() {
        let ctx = validation_context();
        let patterns = parse_allowed_patterns(
            Some(&ctx),
            &[r#"{"field":"authURL","host":"keystone.example.com","regexPath":"^/v3/?$","scheme":"http","port":5000}"#.to_string()],
            &["authURL=https://identity.example.org/v3".to_string()],
        )
        .unwrap();
        let validator = OpenStackValidator::new(patterns);

        assert!(validator.validate_auth_url("http://keystone.example.com:5000/v3/").is_ok());
        assert!(validator.validate_auth_url("https://identity.example.org/v3").is_ok());
        assert!(validator
            .validate_auth_url("https://keystone.example.com:5000/v3")
            .unwrap_err()
            .is_mismatch());
        assert!(!validator
            .validate_auth_url("https://identity.example.org/v3?token=x")
            .unwrap_err()
            .is_mismatch());
    }
}
