//! # credcheck
//!
//! Validates cloud provider credentials against allowed patterns.
//! See [`credential_validator::cli`] for commands.

use anyhow::Result;
use clap::Parser;
use credential_validator::cli::{self, Cli};
use credential_validator::config::RuntimeConfig;
use credential_validator::logging;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let runtime = RuntimeConfig::from_env();
    logging::init(&runtime)?;

    if runtime.unsafe_debug {
        tracing::warn!("Unsafe debug output is enabled; credential values may appear in errors");
    }

    cli::run(cli, &mut std::io::stdout().lock())
}
