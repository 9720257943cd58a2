//! # Pattern Matchers
//!
//! Matchers compare one candidate value against one normalized pattern.
//!
//! A matcher returns:
//! - `Ok(())` when the value matches
//! - [`ValidationError::Mismatch`] when it does not; the caller tries the next pattern
//! - [`ValidationError::Field`] when the value or pattern is unusable; the caller aborts

use super::error::{FieldError, PatternMismatchError, ValidationError};
use super::value::Fields;
use crate::constants::{CLIENT_EMAIL_FIELD, CLIENT_EMAIL_PLACEHOLDER};
use crate::pattern::{parse_and_validate_endpoint_url, NormalizedPattern};
use regex::Regex;
use std::borrow::Cow;

/// Matches a candidate value against a single normalized pattern
pub trait PatternMatcher: Send + Sync {
    fn match_value(
        &self,
        value: &str,
        pattern: &NormalizedPattern,
        fields: &Fields,
        non_sensitive: bool,
    ) -> Result<(), ValidationError>;
}

impl<F> PatternMatcher for F
where
    F: Fn(&str, &NormalizedPattern, &Fields, bool) -> Result<(), ValidationError> + Send + Sync,
{
    fn match_value(
        &self,
        value: &str,
        pattern: &NormalizedPattern,
        fields: &Fields,
        non_sensitive: bool,
    ) -> Result<(), ValidationError> {
        self(value, pattern, fields, non_sensitive)
    }
}

/// Matches the raw value against the pattern's `regexValue`
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexValueMatcher;

impl PatternMatcher for RegexValueMatcher {
    fn match_value(
        &self,
        value: &str,
        pattern: &NormalizedPattern,
        _fields: &Fields,
        non_sensitive: bool,
    ) -> Result<(), ValidationError> {
        let Some(regex_value) = pattern.regex_value.as_deref() else {
            return Err(FieldError::new(
                &pattern.field,
                "pattern does not have regexValue set",
                non_sensitive,
            )
            .into());
        };

        let regex = Regex::new(regex_value).map_err(|e| {
            FieldError::new(&pattern.field, "invalid regex pattern", non_sensitive).with_cause(e)
        })?;

        if regex.is_match(value) {
            return Ok(());
        }

        Err(PatternMismatchError::with_values(
            &pattern.field,
            "does not match regex pattern",
            value,
            regex_value,
            non_sensitive,
        )
        .into())
    }
}

/// Matches an endpoint URI against scheme, host, port and path of the pattern
///
/// Hygiene problems with the candidate (unparsable, userinfo, query, fragment,
/// unknown scheme) are hard errors. Scheme, host, port and path inequality
/// against the pattern are mismatches.
#[derive(Debug, Clone, Copy, Default)]
pub struct UriMatcher;

impl PatternMatcher for UriMatcher {
    fn match_value(
        &self,
        value: &str,
        pattern: &NormalizedPattern,
        _fields: &Fields,
        non_sensitive: bool,
    ) -> Result<(), ValidationError> {
        let field = pattern.field.as_str();
        let mismatch = |message: &str, actual: &str, expected: &str| -> ValidationError {
            PatternMismatchError::with_values(field, message, actual, expected, non_sensitive).into()
        };

        // Both schemes pass here; exact scheme equality is a mismatch below
        let endpoint = parse_and_validate_endpoint_url(value, false).map_err(|e| {
            FieldError::new(field, "failed to validate URI", non_sensitive).with_cause(e)
        })?;

        let expected_scheme = pattern.effective_scheme();
        if endpoint.scheme != expected_scheme {
            return Err(mismatch(
                "scheme does not match allowed scheme",
                &endpoint.scheme,
                expected_scheme,
            ));
        }

        let Some(host) = pattern.host.as_deref() else {
            return Err(FieldError::new(
                field,
                "pattern does not specify an allowed host",
                non_sensitive,
            )
            .into());
        };

        if endpoint.host != host {
            return Err(mismatch(
                "host does not match allowed host",
                &endpoint.host,
                host,
            ));
        }

        let actual_port = endpoint.port.map(|p| p.to_string()).unwrap_or_default();
        match pattern.port {
            Some(port) if endpoint.port.map(u32::from) != Some(port) => {
                return Err(mismatch(
                    "port does not match allowed port",
                    &actual_port,
                    &port.to_string(),
                ));
            }
            None if endpoint.port.is_some() => {
                return Err(mismatch(
                    "port does not match allowed port",
                    &actual_port,
                    "(none)",
                ));
            }
            _ => {}
        }

        if let Some(path) = pattern.path.as_deref() {
            if endpoint.path != path {
                return Err(mismatch(
                    "path does not match allowed path",
                    &endpoint.path,
                    path,
                ));
            }
        } else if let Some(regex_path) = pattern.regex_path.as_deref() {
            let regex = Regex::new(regex_path).map_err(|e| {
                FieldError::new(field, "invalid regex pattern", non_sensitive).with_cause(e)
            })?;

            if !regex.is_match(&endpoint.path) {
                return Err(mismatch(
                    "path does not match regex pattern",
                    &endpoint.path,
                    regex_path,
                ));
            }
        }

        Ok(())
    }
}

/// Matches a bare domain (e.g. `universe_domain`) against the pattern host
#[derive(Debug, Clone, Copy, Default)]
pub struct DomainMatcher;

impl PatternMatcher for DomainMatcher {
    fn match_value(
        &self,
        value: &str,
        pattern: &NormalizedPattern,
        _fields: &Fields,
        non_sensitive: bool,
    ) -> Result<(), ValidationError> {
        let field = pattern.field.as_str();

        // An empty path stands for "no path"
        let has_path = pattern.path.as_deref().is_some_and(|p| !p.is_empty());
        if has_path || pattern.regex_path.is_some() || pattern.port.is_some() {
            return Err(FieldError::new(
                field,
                "domain patterns must not specify URI, path, or port",
                non_sensitive,
            )
            .into());
        }

        let host = match pattern.host.as_deref() {
            Some(host) if !host.is_empty() => host,
            _ => {
                return Err(FieldError::new(
                    field,
                    "allowed domain (Host) must be set",
                    non_sensitive,
                )
                .into())
            }
        };

        if value != host {
            return Err(PatternMismatchError::with_values(
                field,
                "domain does not match allowed domain",
                value,
                host,
                non_sensitive,
            )
            .into());
        }

        Ok(())
    }
}

/// [`UriMatcher`] whose pattern path may reference a sibling field
///
/// A single occurrence of `placeholder` in the pattern `path` is replaced by
/// the raw value of `source_field` before matching. The candidate path is
/// compared percent-decoded, so the value is substituted unescaped.
/// `regexPath` is never expanded.
#[derive(Debug, Clone)]
pub struct PlaceholderUriMatcher {
    pub placeholder: String,
    pub source_field: String,
}

impl PlaceholderUriMatcher {
    pub fn new(placeholder: impl Into<String>, source_field: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            source_field: source_field.into(),
        }
    }

    /// `{client_email}` expanded from the `client_email` field
    pub fn client_email() -> Self {
        Self::new(CLIENT_EMAIL_PLACEHOLDER, CLIENT_EMAIL_FIELD)
    }

    fn expand<'a>(
        &self,
        pattern: &'a NormalizedPattern,
        fields: &Fields,
    ) -> Result<Cow<'a, NormalizedPattern>, ValidationError> {
        let Some(path) = pattern.path.as_deref() else {
            return Ok(Cow::Borrowed(pattern));
        };

        let occurrences = path.matches(self.placeholder.as_str()).count();
        if occurrences == 0 {
            return Ok(Cow::Borrowed(pattern));
        }

        if occurrences > 1 {
            return Err(FieldError::new(
                &pattern.field,
                format!(
                    "invalid pattern: multiple {} placeholder occurrences in Path",
                    self.placeholder
                ),
                true,
            )
            .into());
        }

        let Some(value) = fields.get(&self.source_field).and_then(|v| v.as_str()) else {
            return Err(PatternMismatchError::new(
                &pattern.field,
                format!(
                    "{} required for pattern with {}",
                    self.source_field, self.placeholder
                ),
            )
            .into());
        };

        let mut expanded = pattern.clone();
        expanded.path = Some(path.replacen(self.placeholder.as_str(), value, 1));
        Ok(Cow::Owned(expanded))
    }
}

impl PatternMatcher for PlaceholderUriMatcher {
    fn match_value(
        &self,
        value: &str,
        pattern: &NormalizedPattern,
        fields: &Fields,
        non_sensitive: bool,
    ) -> Result<(), ValidationError> {
        let expanded = self.expand(pattern, fields)?;
        UriMatcher.match_value(value, &expanded, fields, non_sensitive)
    }
}
