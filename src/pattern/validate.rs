//! # Pattern Validation
//!
//! Validates pattern declarations against a [`ValidationContext`] and raw
//! endpoint URIs against scheme/host/port and URL hygiene rules.

use super::{EndpointError, Pattern, PatternError, ValidationContext};
use crate::constants::{DEFAULT_SCHEME, INSECURE_SCHEME, MAX_PORT, MIN_PORT};
use percent_encoding::percent_decode_str;
use regex::Regex;
use url::{Host, Url};

/// Components of a parsed endpoint URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: String,
    /// Lowercased hostname without IPv6 brackets
    pub host: String,
    /// Port, only when one was written in the URI (including scheme defaults)
    pub port: Option<u16>,
    /// Percent-decoded path as written, dot segments kept; empty when the
    /// URI has no path at all
    pub path: String,
}

impl Endpoint {
    /// Parse `raw` into its components without applying any policy
    pub fn parse(raw: &str) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(raw)?;
        Ok(Self::from_url(raw, &parsed))
    }

    fn from_url(raw: &str, parsed: &Url) -> Self {
        Self {
            scheme: parsed.scheme().to_string(),
            host: hostname(parsed),
            port: written_port(raw, parsed),
            path: written_path(raw, parsed),
        }
    }
}

fn hostname(parsed: &Url) -> String {
    match parsed.host() {
        Some(Host::Domain(domain)) => domain.to_ascii_lowercase(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        None => String::new(),
    }
}

/// Authority section of `raw` without userinfo
fn authority(raw: &str) -> &str {
    let rest = raw.split_once("://").map_or("", |(_, rest)| rest);
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..end];
    authority.rsplit_once('@').map_or(authority, |(_, host)| host)
}

// The url crate drops ports equal to the scheme default; keep them when written.
fn written_port(raw: &str, parsed: &Url) -> Option<u16> {
    if let Some(port) = parsed.port() {
        return Some(port);
    }

    let authority = authority(raw);
    let after_host = authority.rsplit_once(']').map_or(authority, |(_, rest)| rest);
    let has_port = after_host
        .rsplit_once(':')
        .is_some_and(|(_, port)| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()));

    if has_port {
        parsed.port_or_known_default()
    } else {
        None
    }
}

// Percent-decoded path as written. The url crate resolves dot segments and
// reports "/" for hierarchical URIs without a path; neither applies here.
fn written_path(raw: &str, parsed: &Url) -> String {
    if parsed.cannot_be_a_base() {
        return percent_decode_str(parsed.path()).decode_utf8_lossy().into_owned();
    }

    let raw = raw.trim_matches(|c: char| c <= ' ');
    let rest = raw.split_once("://").map_or(raw, |(_, rest)| rest);
    let rest = &rest[..rest.find(['?', '#']).unwrap_or(rest.len())];
    let path = rest.find(['/', '\\']).map_or("", |start| &rest[start..]);

    percent_decode_str(path).decode_utf8_lossy().into_owned()
}

/// Parse and validate an endpoint URL against the allowed schemes, host and
/// port rules and URL hygiene (no userinfo, query or fragment)
///
/// Returns the parsed components for callers that need them.
pub fn parse_and_validate_endpoint_url(
    raw: &str,
    strict_https: bool,
) -> Result<Endpoint, EndpointError> {
    let parsed = Url::parse(raw).map_err(EndpointError::InvalidUri)?;
    let endpoint = Endpoint::from_url(raw, &parsed);

    validate_scheme_host_port(
        &endpoint.scheme,
        &endpoint.host,
        endpoint.port.map(u32::from),
        strict_https,
    )?;

    if !parsed.username().is_empty() || parsed.password().is_some() {
        return Err(EndpointError::UserInfo);
    }

    if parsed.query().is_some_and(|q| !q.is_empty()) {
        return Err(EndpointError::QueryParameters);
    }

    if parsed.fragment().is_some_and(|f| !f.is_empty()) {
        return Err(EndpointError::Fragment);
    }

    Ok(endpoint)
}

/// Validate scheme, host and optional port
///
/// `https` is always allowed; `http` only when `strict_https` is false.
pub fn validate_scheme_host_port(
    scheme: &str,
    host: &str,
    port: Option<u32>,
    strict_https: bool,
) -> Result<(), EndpointError> {
    let mut allowed = vec![DEFAULT_SCHEME];
    if !strict_https {
        allowed.push(INSECURE_SCHEME);
    }

    if !allowed.contains(&scheme) {
        return Err(EndpointError::SchemeNotAllowed {
            allowed: allowed.join(", "),
            scheme: scheme.to_string(),
        });
    }

    if host.is_empty() {
        return Err(EndpointError::HostnameRequired);
    }

    if let Some(port) = port {
        if !(MIN_PORT..=MAX_PORT).contains(&port) {
            return Err(EndpointError::PortOutOfRange);
        }
    }

    Ok(())
}

impl Pattern {
    /// Validate the pattern declaration with provider-specific context
    ///
    /// Checks run in a fixed order and the first failure is returned.
    pub fn validate(&self, ctx: Option<&ValidationContext>) -> Result<(), PatternError> {
        let ctx = ctx.ok_or(PatternError::MissingContext)?;

        if self.field.is_empty() {
            return Err(PatternError::MissingField);
        }

        let field = || self.field.clone();

        if self.is_user_provided {
            if ctx.allowed_user_configurable_fields.is_empty() {
                return Err(PatternError::NoUserConfigurableFields { field: field() });
            }
            if !ctx.allowed_user_configurable_fields.contains(&self.field) {
                return Err(PatternError::NotUserConfigurable { field: field() });
            }
        }

        if let Some(regex_value) = &self.regex_value {
            return self.validate_regex_value_mode(ctx, regex_value);
        }

        if !self.uri.is_empty() {
            if self.has_components() {
                return Err(PatternError::UriNotAlone { field: field() });
            }

            parse_and_validate_endpoint_url(&self.uri, ctx.strict_https).map_err(|source| {
                PatternError::InvalidEndpoint {
                    field: field(),
                    source,
                }
            })?;

            return Ok(());
        }

        let host = match self.host.as_deref() {
            Some(host) if !host.is_empty() => host,
            _ => return Err(PatternError::MissingHost { field: field() }),
        };

        let scheme = self
            .scheme
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SCHEME);

        validate_scheme_host_port(scheme, host, self.port, ctx.strict_https).map_err(|source| {
            PatternError::InvalidEndpoint {
                field: field(),
                source,
            }
        })?;

        match (&self.path, &self.regex_path) {
            (None, None) => Err(PatternError::MissingPath { field: field() }),
            (Some(_), Some(_)) => Err(PatternError::PathConflict { field: field() }),
            (None, Some(regex_path)) if regex_path.is_empty() => {
                Err(PatternError::EmptyRegexPath { field: field() })
            }
            (None, Some(regex_path)) => Regex::new(regex_path)
                .map(|_| ())
                .map_err(|source| PatternError::InvalidRegexPath {
                    field: field(),
                    source,
                }),
            (Some(_), None) => Ok(()),
        }
    }

    fn validate_regex_value_mode(
        &self,
        ctx: &ValidationContext,
        regex_value: &str,
    ) -> Result<(), PatternError> {
        let field = self.field.clone();

        if ctx.allowed_regex_fields.is_empty() {
            return Err(PatternError::RegexValueNotAllowed { field });
        }

        if !ctx.allowed_regex_fields.contains(&self.field) {
            let allowed = ctx
                .allowed_regex_fields
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(PatternError::RegexValueRestricted { field, allowed });
        }

        if !self.uri.is_empty() || self.has_components() {
            return Err(PatternError::RegexValueNotAlone { field });
        }

        if regex_value.is_empty() {
            return Err(PatternError::EmptyRegexValue { field });
        }

        Regex::new(regex_value)
            .map(|_| ())
            .map_err(|source| PatternError::InvalidRegexValue { field, source })
    }

    fn has_components(&self) -> bool {
        self.host.is_some() || self.path.is_some() || self.regex_path.is_some() || self.port.is_some()
    }
}
