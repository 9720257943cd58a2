//! # Credential Validator
//!
//! Allowlist-driven validation of cloud provider credential material before it
//! is trusted by an orchestration tool.
//!
//! ## Overview
//!
//! 1. **Patterns** - declarative allowed patterns (regex value, URI, or
//!    host + path/regexPath) normalized into comparable components
//! 2. **Field validation** - a registry of per-field rules enforcing presence,
//!    strictness and the allowlist, with sensitive values redacted in errors
//! 3. **Providers** - validators for AWS, Azure, GCP, Hetzner Cloud,
//!    Alibaba Cloud and OpenStack built on the registry
//!
//! Nothing here fetches, caches or persists credentials, and no network calls
//! are made.

pub mod cli;
pub mod config;
pub mod constants;
pub mod logging;
pub mod pattern;
pub mod provider;
pub mod validation;

pub use pattern::{Pattern, PatternError, ValidationContext};
pub use provider::{validator_for, CredentialValidator, ProviderKind, SecretData};
pub use validation::{RenderOptions, ValidationError};
