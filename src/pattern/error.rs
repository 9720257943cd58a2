//! # Pattern Errors
//!
//! Errors raised while validating, normalizing or parsing pattern declarations.

use thiserror::Error;

/// Scheme, host, port and URL hygiene violations of an endpoint
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("invalid URI: {0}")]
    InvalidUri(#[source] url::ParseError),
    #[error("scheme must be one of {{{allowed}}}, got {scheme:?}")]
    SchemeNotAllowed { allowed: String, scheme: String },
    #[error("hostname is required")]
    HostnameRequired,
    #[error("port must be between 1 and 65535")]
    PortOutOfRange,
    #[error("must not contain userinfo")]
    UserInfo,
    #[error("must not contain query parameters")]
    QueryParameters,
    #[error("must not contain fragments")]
    Fragment,
}

/// Error type for pattern declarations
/// Every variant names the offending field or pattern text.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("validation context is required")]
    MissingContext,
    #[error("field is required")]
    MissingField,
    #[error("field {field} cannot be configured by users; no user-configurable fields are allowed for this provider")]
    NoUserConfigurableFields { field: String },
    #[error("field {field} cannot be configured by users")]
    NotUserConfigurable { field: String },
    #[error("regexValue is not allowed for field {field}")]
    RegexValueNotAllowed { field: String },
    #[error("regexValue is not allowed for field {field}, only allowed for: {allowed}")]
    RegexValueRestricted { field: String, allowed: String },
    #[error("regexValue cannot be used together with uri, host, path, regexPath, or port for field {field}")]
    RegexValueNotAlone { field: String },
    #[error("regexValue must not be empty for field {field}")]
    EmptyRegexValue { field: String },
    #[error("invalid regexValue pattern for field {field}: {source}")]
    InvalidRegexValue {
        field: String,
        #[source]
        source: regex::Error,
    },
    #[error("uri cannot be used together with host, path, regexPath, or port for field {field}")]
    UriNotAlone { field: String },
    #[error("invalid value for field {field}: {source}")]
    InvalidEndpoint {
        field: String,
        #[source]
        source: EndpointError,
    },
    #[error("host is required when uri is not provided for field {field}")]
    MissingHost { field: String },
    #[error("either uri must be provided, or at least one of path or regexPath must be set for field {field}")]
    MissingPath { field: String },
    #[error("path and regexPath are mutually exclusive for field {field}")]
    PathConflict { field: String },
    #[error("regexPath must not be empty for field {field}")]
    EmptyRegexPath { field: String },
    #[error("invalid regex pattern for field {field}: {source}")]
    InvalidRegexPath {
        field: String,
        #[source]
        source: regex::Error,
    },
    #[error("failed to parse URI for field {field}: {source}")]
    InvalidUri {
        field: String,
        #[source]
        source: url::ParseError,
    },
    #[error("could not parse JSON pattern {pattern}: {source}")]
    Json {
        pattern: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("validation failed for JSON pattern {pattern}: {source}")]
    InvalidJsonPattern {
        pattern: String,
        #[source]
        source: Box<PatternError>,
    },
    #[error("invalid URI pattern: {pattern}")]
    MissingSeparator { pattern: String },
    #[error("invalid URI pattern {pattern}: {source}")]
    InvalidUriPattern {
        pattern: String,
        #[source]
        source: Box<PatternError>,
    },
    #[error("failed to parse {provider} flag allowed patterns: {source}")]
    InvalidFlagPatterns {
        provider: String,
        #[source]
        source: Box<PatternError>,
    },
    #[error("failed to normalize {provider} pattern: {source}")]
    NormalizeProviderPattern {
        provider: String,
        #[source]
        source: Box<PatternError>,
    },
    #[error("invalid {provider} allowed pattern: {source}")]
    InvalidProviderPattern {
        provider: String,
        #[source]
        source: Box<PatternError>,
    },
}
