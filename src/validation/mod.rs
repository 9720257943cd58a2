//! # Field Validation
//!
//! Registry-driven validation of credential fields against allowed patterns.
//!
//! ## Flow
//!
//! 1. A provider builds a [`Registry`] of [`FieldRule`]s for its input
//! 2. [`BaseValidator::validate_with_registry`] enforces presence, emptiness
//!    and the allowlist, then calls each rule's [`FieldValidator`]
//! 3. Pattern-based validators iterate the allowed patterns through a
//!    [`PatternMatcher`]; mismatches try the next pattern, hard errors abort

mod checks;
mod error;
mod matchers;
mod registry;
mod value;

pub use checks::{
    assert_printable_string, assert_string, validate_exact_length, validate_max_length,
    validate_min_length,
};
pub use error::{FieldError, PatternMismatchError, RenderOptions, ValidationError};
pub use matchers::{
    DomainMatcher, PatternMatcher, PlaceholderUriMatcher, RegexValueMatcher, UriMatcher,
};
pub use registry::{
    string_with_pattern, BaseValidator, FieldRule, FieldValidator, Registry,
    StringPatternValidator, ValidationMode,
};
pub use value::{coerce_bytes_to_strings, fields_from_json, FieldValue, Fields};
