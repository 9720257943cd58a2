//! # Pattern Parsing
//!
//! Parses user-supplied patterns from their two textual forms and merges them
//! with provider defaults and configuration.
//!
//! - Structured: a JSON object, e.g. `{"field":"token_uri","uri":"https://..."}`
//! - Compact: `<field>=<uri>`, split on the first `=`

use super::{Pattern, PatternError, ValidationContext};
use tracing::{debug, info};

/// Parse structured and compact pattern strings
///
/// Every returned pattern is marked user-provided and has passed
/// [`Pattern::validate`]. The first failing entry aborts parsing.
pub fn parse_allowed_patterns(
    ctx: Option<&ValidationContext>,
    structured: &[String],
    compact: &[String],
) -> Result<Vec<Pattern>, PatternError> {
    let mut patterns = Vec::with_capacity(structured.len() + compact.len());

    for raw in structured {
        let pattern: Pattern =
            serde_json::from_str(raw).map_err(|source| PatternError::Json {
                pattern: raw.clone(),
                source,
            })?;

        pattern
            .validate(ctx)
            .map_err(|source| PatternError::InvalidJsonPattern {
                pattern: raw.clone(),
                source: Box::new(source),
            })?;

        patterns.push(pattern);
    }

    for raw in compact {
        let Some((field, uri)) = raw.split_once('=') else {
            return Err(PatternError::MissingSeparator {
                pattern: raw.clone(),
            });
        };

        let pattern = Pattern::uri(field, uri).user_provided();
        pattern
            .validate(ctx)
            .map_err(|source| PatternError::InvalidUriPattern {
                pattern: raw.clone(),
                source: Box::new(source),
            })?;

        patterns.push(pattern);
    }

    Ok(patterns)
}

/// Merge built-in, configured and flag patterns for one provider
///
/// Order is defaults, then configuration, then flags. Each pattern is
/// validated against `ctx` and returned in normalized form (URI split into
/// components).
pub fn merge_provider_patterns(
    provider: &str,
    defaults: &[Pattern],
    configured: &[Pattern],
    ctx: &ValidationContext,
    structured: &[String],
    compact: &[String],
) -> Result<Vec<Pattern>, PatternError> {
    let from_flags = parse_allowed_patterns(Some(ctx), structured, compact).map_err(|source| {
        PatternError::InvalidFlagPatterns {
            provider: provider.to_string(),
            source: Box::new(source),
        }
    })?;

    if !configured.is_empty() {
        info!(provider = %provider, count = configured.len(), "Using custom allowed patterns from configuration");
    }

    if !from_flags.is_empty() {
        info!(provider = %provider, count = from_flags.len(), "Using custom allowed patterns from flags");
    }

    let mut merged = Vec::with_capacity(defaults.len() + configured.len() + from_flags.len());

    for pattern in defaults.iter().chain(configured).chain(&from_flags) {
        pattern
            .validate(Some(ctx))
            .map_err(|source| PatternError::InvalidProviderPattern {
                provider: provider.to_string(),
                source: Box::new(source),
            })?;

        let normalized =
            pattern
                .to_normalized()
                .map_err(|source| PatternError::NormalizeProviderPattern {
                    provider: provider.to_string(),
                    source: Box::new(source),
                })?;

        let mut normalized = Pattern::from(normalized);
        normalized.is_user_provided = pattern.is_user_provided;
        merged.push(normalized);
    }

    if !merged.is_empty() {
        let rendered: Vec<String> = merged.iter().map(ToString::to_string).collect();
        debug!(provider = %provider, count = merged.len(), patterns = ?rendered, "Final normalized allowed patterns");
    }

    Ok(merged)
}
