//! # Validation Errors
//!
//! Two disjoint error kinds:
//! - [`FieldError`]: hard failure, aborts validation immediately
//! - [`PatternMismatchError`]: soft failure, the next allowed pattern is tried
//!
//! Both carry the offending value separately from the message. Values and
//! causes only appear in rendered text when the field is marked non-sensitive
//! or the unsafe debug override is enabled; the decision is made at render time.

use crate::config::env_var_or_default_bool;
use crate::constants::UNSAFE_DEBUG_ENV_VAR;
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

type Cause = Box<dyn StdError + Send + Sync + 'static>;

/// Controls whether sensitive values are revealed when rendering errors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub reveal_sensitive: bool,
}

impl RenderOptions {
    /// Redacting options
    pub const REDACTED: Self = Self {
        reveal_sensitive: false,
    };

    /// Read the unsafe debug override from the environment
    ///
    /// Read fresh on every call so toggling the variable takes effect immediately.
    pub fn from_env() -> Self {
        Self {
            reveal_sensitive: env_var_or_default_bool(UNSAFE_DEBUG_ENV_VAR, false),
        }
    }
}

/// Hard validation failure for one field
pub struct FieldError {
    pub field: String,
    pub message: String,
    /// Offending value, empty when not recorded
    pub actual: String,
    pub non_sensitive: bool,
    cause: Option<Cause>,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>, non_sensitive: bool) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            actual: String::new(),
            non_sensitive,
            cause: None,
        }
    }

    #[must_use]
    pub fn with_value(mut self, actual: impl Into<String>) -> Self {
        self.actual = actual.into();
        self
    }

    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<Cause>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Render the error, redacting value and cause unless allowed
    pub fn render(&self, opts: &RenderOptions) -> String {
        let reveal = self.non_sensitive || opts.reveal_sensitive;

        let mut msg = format!(
            "validation error in field {:?}: {}",
            self.field, self.message
        );

        if reveal && !self.actual.is_empty() {
            msg.push_str(&format!(" (value: {:?})", self.actual));
        }

        if let Some(cause) = &self.cause {
            if reveal {
                msg.push_str(&format!(": {cause}"));
            }
        }

        msg
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&RenderOptions::from_env()))
    }
}

/// Never prints the value; `Display` is the only redaction-aware view
impl fmt::Debug for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldError")
            .field("field", &self.field)
            .field("message", &self.message)
            .field("non_sensitive", &self.non_sensitive)
            .field("has_value", &!self.actual.is_empty())
            .field("has_cause", &self.cause.is_some())
            .finish()
    }
}

impl StdError for FieldError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|c| c as &(dyn StdError + 'static))
    }
}

/// A candidate did not match one pattern
pub struct PatternMismatchError {
    pub field: String,
    pub message: String,
    pub actual: String,
    pub expected: String,
    pub non_sensitive: bool,
    cause: Option<Cause>,
}

impl PatternMismatchError {
    /// Mismatch without recorded values; treated as sensitive
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            actual: String::new(),
            expected: String::new(),
            non_sensitive: false,
            cause: None,
        }
    }

    pub fn with_values(
        field: impl Into<String>,
        message: impl Into<String>,
        actual: impl Into<String>,
        expected: impl Into<String>,
        non_sensitive: bool,
    ) -> Self {
        Self {
            actual: actual.into(),
            expected: expected.into(),
            non_sensitive,
            ..Self::new(field, message)
        }
    }

    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<Cause>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn render(&self, opts: &RenderOptions) -> String {
        let head = format!("pattern mismatch in field {:?}: {}", self.field, self.message);

        if self.actual.is_empty() || !(self.non_sensitive || opts.reveal_sensitive) {
            return head;
        }

        if self.expected.is_empty() {
            format!("{head} (actual: {:?})", self.actual)
        } else {
            format!(
                "{head} (actual: {:?}, expected: {:?})",
                self.actual, self.expected
            )
        }
    }
}

impl fmt::Display for PatternMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&RenderOptions::from_env()))
    }
}

impl fmt::Debug for PatternMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternMismatchError")
            .field("field", &self.field)
            .field("message", &self.message)
            .field("non_sensitive", &self.non_sensitive)
            .field("has_value", &!self.actual.is_empty())
            .finish()
    }
}

impl StdError for PatternMismatchError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|c| c as &(dyn StdError + 'static))
    }
}

/// Outcome of a failed validation
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Hard failure
    #[error(transparent)]
    Field(#[from] FieldError),
    /// Soft failure; only surfaces when no allowed pattern matched
    #[error(transparent)]
    Mismatch(#[from] PatternMismatchError),
}

impl ValidationError {
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch(_))
    }

    /// Name of the field the error refers to
    pub fn field(&self) -> &str {
        match self {
            Self::Field(e) => &e.field,
            Self::Mismatch(e) => &e.field,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Field(e) => &e.message,
            Self::Mismatch(e) => &e.message,
        }
    }

    pub fn render(&self, opts: &RenderOptions) -> String {
        match self {
            Self::Field(e) => e.render(opts),
            Self::Mismatch(e) => e.render(opts),
        }
    }
}
