//! # Allowed Patterns
//!
//! Declarative description of the values a credential field may take.
//!
//! A [`Pattern`] is active in exactly one of three modes:
//! - `regexValue`: the raw field value is matched against a regex
//! - `uri`: a complete endpoint (scheme, host, optional port, path)
//! - component: `host` plus exactly one of `path` / `regexPath`
//!
//! Patterns are validated against a [`ValidationContext`] before use and
//! normalized into a [`NormalizedPattern`] each time they are matched.

mod error;
mod normalize;
mod parse;
mod validate;

pub use error::{EndpointError, PatternError};
pub use normalize::NormalizedPattern;
pub use parse::{merge_provider_patterns, parse_allowed_patterns};
pub use validate::{parse_and_validate_endpoint_url, validate_scheme_host_port, Endpoint};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Provider-specific validation rules that are not exposed in configuration
///
/// Constructed once per provider validator and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationContext {
    /// Fields that are allowed to use `regexValue` validation
    pub allowed_regex_fields: BTreeSet<String>,
    /// When true only `https` is accepted, otherwise `http` is accepted as well
    pub strict_https: bool,
    /// Fields that user-provided patterns (config file or flags) may target
    /// An empty set means no user-provided patterns are accepted at all.
    /// Built-in patterns are not subject to this restriction.
    pub allowed_user_configurable_fields: BTreeSet<String>,
}

impl ValidationContext {
    #[must_use]
    pub fn new(strict_https: bool) -> Self {
        Self {
            strict_https,
            ..Self::default()
        }
    }

    /// Allow `regexValue` patterns for the given fields
    #[must_use]
    pub fn with_regex_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_regex_fields
            .extend(fields.into_iter().map(Into::into));
        self
    }

    /// Allow user-provided patterns for the given fields
    #[must_use]
    pub fn with_user_configurable_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_user_configurable_fields
            .extend(fields.into_iter().map(Into::into));
        self
    }
}

/// One allowed shape for one credential field
///
/// Deserializing a pattern always marks it as user-provided: anything arriving
/// through configuration is subject to [`ValidationContext::allowed_user_configurable_fields`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "PatternDocument")]
pub struct Pattern {
    /// Name of the credential field (e.g. `token_uri`, `universe_domain`)
    pub field: String,
    /// Allowed hostname, required in component mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Allowed port; requires an exact match when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u32>,
    /// Allowed path; placeholders are substituted by the matcher before comparison
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Complete endpoint, alternative to host + path
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uri: String,
    /// Regex for the path (mutually exclusive with `path`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex_path: Option<String>,
    /// Regex for the raw field value; stands alone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex_value: Option<String>,
    /// Scheme for component mode, `https` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// Whether the pattern came from user configuration rather than built-in defaults
    #[serde(skip)]
    pub is_user_provided: bool,
}

impl Pattern {
    /// Pattern validating the raw value of `field` against `regex`
    pub fn regex_value(field: impl Into<String>, regex: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            regex_value: Some(regex.into()),
            ..Self::default()
        }
    }

    /// Pattern allowing exactly one endpoint URI for `field`
    pub fn uri(field: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            uri: uri.into(),
            ..Self::default()
        }
    }

    /// Component-form pattern allowing `host` with an exact `path`
    pub fn host_path(
        field: impl Into<String>,
        host: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            host: Some(host.into()),
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Component-form pattern allowing `host` with a path matching `regex_path`
    pub fn host_regex_path(
        field: impl Into<String>,
        host: impl Into<String>,
        regex_path: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            host: Some(host.into()),
            regex_path: Some(regex_path.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    #[must_use]
    pub fn with_port(mut self, port: u32) -> Self {
        self.port = Some(port);
        self
    }

    #[must_use]
    pub fn user_provided(mut self) -> Self {
        self.is_user_provided = true;
        self
    }
}

/// Wire shape of a pattern; has no user-provided marker so input can never set it
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PatternDocument {
    field: String,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<u32>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    regex_path: Option<String>,
    #[serde(default)]
    regex_value: Option<String>,
    #[serde(default)]
    scheme: Option<String>,
}

impl From<PatternDocument> for Pattern {
    fn from(doc: PatternDocument) -> Self {
        Self {
            field: doc.field,
            host: doc.host,
            port: doc.port,
            path: doc.path,
            uri: doc.uri,
            regex_path: doc.regex_path,
            regex_value: doc.regex_value,
            scheme: doc.scheme,
            is_user_provided: true,
        }
    }
}

/// Canonical `key:value` list for logs; never used for comparison
impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let port = self.port.map(|p| p.to_string());
        let uri = (!self.uri.is_empty()).then_some(self.uri.as_str());
        write_canonical(
            f,
            &[
                ("regexValue", self.regex_value.as_deref()),
                ("uri", uri),
                ("scheme", self.scheme.as_deref()),
                ("host", self.host.as_deref()),
                ("port", port.as_deref()),
                ("path", self.path.as_deref()),
                ("regexPath", self.regex_path.as_deref()),
            ],
        )
    }
}

pub(crate) fn write_canonical(
    f: &mut fmt::Formatter<'_>,
    parts: &[(&str, Option<&str>)],
) -> fmt::Result {
    let rendered: Vec<String> = parts
        .iter()
        .filter_map(|(key, value)| value.map(|v| format!("{key}:{v}")))
        .collect();

    if rendered.is_empty() {
        return f.write_str("unknown");
    }

    f.write_str(&rendered.join(","))
}
