//! # Field Validation Registry
//!
//! A registry maps field names to [`FieldRule`]s and acts as an explicit
//! allowlist for the input. [`BaseValidator`] walks an input field map against
//! a registry and matches pattern-validated fields against the allowed patterns.

use super::error::{FieldError, PatternMismatchError, RenderOptions, ValidationError};
use super::matchers::PatternMatcher;
use super::value::{FieldValue, Fields};
use crate::pattern::Pattern;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Validates one field value
///
/// Nested objects are validated via [`BaseValidator::validate_nested_fields_strict`];
/// the parent registry collects the whole value.
pub trait FieldValidator: Send + Sync {
    fn validate(
        &self,
        validator: &BaseValidator,
        field: &str,
        value: &FieldValue,
        fields: &Fields,
        non_sensitive: bool,
    ) -> Result<(), ValidationError>;
}

impl<F> FieldValidator for F
where
    F: Fn(&BaseValidator, &str, &FieldValue, &Fields, bool) -> Result<(), ValidationError>
        + Send
        + Sync,
{
    fn validate(
        &self,
        validator: &BaseValidator,
        field: &str,
        value: &FieldValue,
        fields: &Fields,
        non_sensitive: bool,
    ) -> Result<(), ValidationError> {
        self(validator, field, value, fields, non_sensitive)
    }
}

/// Validation rules for one field
#[derive(Clone, Default)]
pub struct FieldRule {
    pub required: bool,
    pub validator: Option<Arc<dyn FieldValidator>>,
    /// Whether the value is safe to include in logs and error messages
    pub non_sensitive: bool,
}

impl FieldRule {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    pub fn optional() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_validator(mut self, validator: impl FieldValidator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    #[must_use]
    pub fn non_sensitive(mut self) -> Self {
        self.non_sensitive = true;
        self
    }
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRule")
            .field("required", &self.required)
            .field("has_validator", &self.validator.is_some())
            .field("non_sensitive", &self.non_sensitive)
            .finish()
    }
}

/// Field name to rule
pub type Registry = BTreeMap<String, FieldRule>;

/// How fields absent from the registry are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Unknown fields are an error
    Strict,
    /// Unknown fields are dropped from the output
    Permissive,
}

/// Wrap a matcher as a validator for string fields
///
/// Non-string values fail with "field value must be a string".
pub fn string_with_pattern<M>(matcher: M) -> StringPatternValidator<M>
where
    M: PatternMatcher,
{
    StringPatternValidator { matcher }
}

/// See [`string_with_pattern`]
#[derive(Debug, Clone)]
pub struct StringPatternValidator<M> {
    matcher: M,
}

impl<M: PatternMatcher> FieldValidator for StringPatternValidator<M> {
    fn validate(
        &self,
        validator: &BaseValidator,
        field: &str,
        value: &FieldValue,
        fields: &Fields,
        non_sensitive: bool,
    ) -> Result<(), ValidationError> {
        let Some(value) = value.as_str() else {
            return Err(
                FieldError::new(field, "field value must be a string", non_sensitive).into(),
            );
        };

        validator.validate_field_pattern(field, value, fields, &self.matcher, non_sensitive)
    }
}

/// Shared validation machinery for all providers
#[derive(Debug, Clone, Default)]
pub struct BaseValidator {
    allowed_patterns: Vec<Pattern>,
}

impl BaseValidator {
    pub fn new(allowed_patterns: Vec<Pattern>) -> Self {
        Self { allowed_patterns }
    }

    pub fn allowed_patterns(&self) -> &[Pattern] {
        &self.allowed_patterns
    }

    /// Validate `fields` against `registry`
    ///
    /// Returns the registry-matched fields present in the input. In strict
    /// mode any unknown field fails first; fields are then checked in name order.
    pub fn validate_with_registry(
        &self,
        fields: &Fields,
        registry: &Registry,
        mode: ValidationMode,
    ) -> Result<Fields, ValidationError> {
        if mode == ValidationMode::Strict {
            if let Some(unknown) = fields.keys().find(|key| !registry.contains_key(*key)) {
                return Err(FieldError::new(unknown, "field is not allowed", false).into());
            }
        }

        let mut validated = Fields::new();

        for (field, rule) in registry {
            let Some(value) = fields.get(field) else {
                if rule.required {
                    return Err(FieldError::new(
                        field,
                        "required field is missing",
                        rule.non_sensitive,
                    )
                    .into());
                }
                continue;
            };

            if rule.required && value.is_empty() {
                return Err(FieldError::new(
                    field,
                    "required field cannot be empty",
                    rule.non_sensitive,
                )
                .into());
            }

            if let Some(validator) = &rule.validator {
                validator.validate(self, field, value, fields, rule.non_sensitive)?;
            }

            validated.insert(field.clone(), value.clone());
        }

        Ok(validated)
    }

    /// Validate a nested object in strict mode, discarding the output
    pub fn validate_nested_fields_strict(
        &self,
        fields: &Fields,
        registry: &Registry,
    ) -> Result<(), ValidationError> {
        self.validate_with_registry(fields, registry, ValidationMode::Strict)
            .map(|_| ())
    }

    /// Match `value` against every allowed pattern for `field`, in order
    ///
    /// The first match wins. Mismatches move on to the next pattern; any
    /// other error aborts. No match at all yields a mismatch error.
    pub fn validate_field_pattern(
        &self,
        field: &str,
        value: &str,
        fields: &Fields,
        matcher: &dyn PatternMatcher,
        non_sensitive: bool,
    ) -> Result<(), ValidationError> {
        let shown = (non_sensitive || RenderOptions::from_env().reveal_sensitive).then_some(value);

        for pattern in self.allowed_patterns.iter().filter(|p| p.field == field) {
            trace!(field = %field, pattern = %pattern, value = ?shown, "Pattern match attempt");

            let normalized = pattern.to_normalized().map_err(|e| {
                FieldError::new(field, "failed to normalize pattern", non_sensitive).with_cause(e)
            })?;

            match matcher.match_value(value, &normalized, fields, non_sensitive) {
                Ok(()) => {
                    trace!(field = %field, pattern = %pattern, value = ?shown, "Pattern match succeeded");
                    return Ok(());
                }
                Err(e) => {
                    debug!(field = %field, pattern = %pattern, value = ?shown, reason = %e, "Pattern match failed");
                    if !e.is_mismatch() {
                        return Err(e);
                    }
                }
            }
        }

        Err(PatternMismatchError::with_values(
            field,
            "does not match any allowed patterns",
            value,
            "",
            non_sensitive,
        )
        .into())
    }
}
