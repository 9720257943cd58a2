//! # Pattern Normalization
//!
//! Converts a [`Pattern`] into a [`NormalizedPattern`] whose scheme, host,
//! port and path are comparable against a parsed candidate endpoint.

use super::validate::Endpoint;
use super::{write_canonical, Pattern, PatternError};
use crate::constants::DEFAULT_SCHEME;
use std::fmt;

/// A pattern with its URI (if any) broken into components
///
/// Built fresh on every match attempt and never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedPattern {
    pub field: String,
    pub scheme: Option<String>,
    pub host: Option<String>,
    /// Only set when written explicitly; schemes never imply a default port
    pub port: Option<u32>,
    pub path: Option<String>,
    pub regex_path: Option<String>,
    pub regex_value: Option<String>,
}

impl NormalizedPattern {
    /// Scheme to compare against, `https` when the pattern does not set one
    pub fn effective_scheme(&self) -> &str {
        self.scheme
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SCHEME)
    }
}

impl Pattern {
    /// Normalize the pattern for matching
    ///
    /// Component and regex patterns are copied unchanged. URI patterns are
    /// parsed and the URI is replaced by its components.
    pub fn to_normalized(&self) -> Result<NormalizedPattern, PatternError> {
        if self.uri.is_empty() {
            return Ok(NormalizedPattern {
                field: self.field.clone(),
                scheme: self.scheme.clone(),
                host: self.host.clone(),
                port: self.port,
                path: self.path.clone(),
                regex_path: self.regex_path.clone(),
                regex_value: self.regex_value.clone(),
            });
        }

        let endpoint = Endpoint::parse(&self.uri).map_err(|source| PatternError::InvalidUri {
            field: self.field.clone(),
            source,
        })?;

        Ok(NormalizedPattern {
            field: self.field.clone(),
            scheme: Some(endpoint.scheme),
            host: Some(endpoint.host),
            port: endpoint.port.map(u32::from),
            path: Some(endpoint.path),
            regex_path: self.regex_path.clone(),
            regex_value: self.regex_value.clone(),
        })
    }
}

/// Component-form pattern equivalent to the normalized one
impl From<NormalizedPattern> for Pattern {
    fn from(normalized: NormalizedPattern) -> Self {
        Self {
            field: normalized.field,
            host: normalized.host,
            port: normalized.port,
            path: normalized.path,
            uri: String::new(),
            regex_path: normalized.regex_path,
            regex_value: normalized.regex_value,
            scheme: normalized.scheme,
            is_user_provided: false,
        }
    }
}

impl fmt::Display for NormalizedPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let port = self.port.map(|p| p.to_string());
        write_canonical(
            f,
            &[
                ("regexValue", self.regex_value.as_deref()),
                ("scheme", self.scheme.as_deref()),
                ("host", self.host.as_deref()),
                ("port", port.as_deref()),
                ("path", self.path.as_deref()),
                ("regexPath", self.regex_path.as_deref()),
            ],
        )
    }
}
