//! # Constants
//!
//! Shared constants used throughout the validator.
//!
//! These values represent the built-in defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Scheme assumed for component-form patterns that do not set one
pub const DEFAULT_SCHEME: &str = "https";

/// Scheme additionally accepted when a context is not HTTPS-strict
pub const INSECURE_SCHEME: &str = "http";

/// Lowest valid TCP port
pub const MIN_PORT: u32 = 1;

/// Highest valid TCP port
pub const MAX_PORT: u32 = 65_535;

/// Environment variable that enables unsafe debug output
/// When set to a truthy value, redacted actual/expected values appear in error text and logs.
/// Intended for local debugging only.
pub const UNSAFE_DEBUG_ENV_VAR: &str = "CREDENTIAL_VALIDATOR_UNSAFE_DEBUG";

/// Placeholder substituted with the service account e-mail in GCP certificate URL paths
pub const CLIENT_EMAIL_PLACEHOLDER: &str = "{client_email}";

/// Sibling field providing the value for [`CLIENT_EMAIL_PLACEHOLDER`]
pub const CLIENT_EMAIL_FIELD: &str = "client_email";

/// Default tracing filter directive when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "credential_validator=info";
