//! # Logging
//!
//! Tracing subscriber setup for the CLI.
//!
//! `RUST_LOG` takes precedence. Without it the filter is built from
//! [`RuntimeConfig::log_level`], scoped to this crate.

use crate::config::RuntimeConfig;
use crate::constants::DEFAULT_LOG_FILTER;
use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
fn default_filter(config: &RuntimeConfig) -> EnvFilter {
    let directive = format!("credential_validator={}", config.log_level.to_lowercase());
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the global subscriber
///
/// Logs go to stderr so command output on stdout stays machine-readable.
/// Returns an error if a subscriber is already installed.
pub fn init(config: &RuntimeConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(config));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.json_logs() {
        builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {e}"))
    } else {
        builder
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {e}"))
    }
}
