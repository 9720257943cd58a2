//! # credcheck CLI
//!
//! Command-line front end for the credential validator.
//!
//! ## Usage
//!
//! ```bash
//! # Validate an AWS access key stored as a JSON object of strings
//! credcheck validate --provider aws --file secret.json
//!
//! # Allow an extra token endpoint for GCP
//! credcheck validate --provider gcp --file secret.json \
//!   --allowed-uri-pattern token_uri=https://oauth2.example.com/token
//!
//! # Validate an AWS workload identity provider config
//! credcheck validate --provider aws --file provider-config.json --workload-identity
//!
//! # Show the merged allowed patterns for a provider
//! credcheck patterns --provider openstack --config credcheck.yaml
//!
//! # Show build information
//! credcheck version
//! ```
//!
//! Only field names are ever printed on success. Errors are rendered with
//! values redacted unless `CREDENTIAL_VALIDATOR_UNSAFE_DEBUG` is set.

use crate::config::AppConfig;
use crate::pattern::{merge_provider_patterns, Pattern};
use crate::provider::openstack::AUTH_URL_FIELD;
use crate::provider::{validator_for, OpenStackValidator, ProviderKind, SecretData};
use crate::validation::RenderOptions;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Cloud credential allowlist validator
#[derive(Debug, Parser)]
#[command(name = "credcheck")]
#[command(
    about = "Validate cloud provider credentials against allowed patterns",
    long_about = None,
    after_help = "\
Providers:
  aws, azure, gcp, hcloud, alicloud, openstack, stackit

Examples:
  credcheck validate --provider hcloud --file secret.json
  credcheck patterns --provider gcp
"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate secret data for a provider
    Validate {
        #[command(flatten)]
        patterns: PatternArgs,

        /// JSON object of string values holding the secret data
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,

        /// Treat FILE as a raw workload identity provider config instead of secret data
        #[arg(long)]
        workload_identity: bool,
    },
    /// Print the merged allowed patterns for a provider
    Patterns {
        #[command(flatten)]
        patterns: PatternArgs,
    },
    /// Show build information
    Version,
}

/// Pattern sources shared by commands
#[derive(Debug, clap::Args)]
pub struct PatternArgs {
    /// Provider name
    #[arg(short, long, value_name = "PROVIDER")]
    pub provider: ProviderKind,

    /// YAML or JSON configuration file with provider allowed patterns
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Additional allowed pattern as a JSON object (repeatable)
    #[arg(long = "allowed-pattern", value_name = "JSON")]
    pub allowed_patterns: Vec<String>,

    /// Additional allowed URI pattern as <field>=<uri> (repeatable)
    #[arg(long = "allowed-uri-pattern", value_name = "FIELD=URI")]
    pub allowed_uri_patterns: Vec<String>,
}

impl PatternArgs {
    /// Defaults, then configuration, then flags, validated and normalized
    pub fn merged_patterns(&self) -> Result<Vec<Pattern>> {
        let kind = self.provider;

        let config = match &self.config {
            Some(path) => AppConfig::load_from_file(path)?,
            None => AppConfig::default(),
        };

        let patterns = merge_provider_patterns(
            kind.as_str(),
            &kind.default_patterns(),
            config.allowed_patterns(kind),
            &kind.validation_context(),
            &self.allowed_patterns,
            &self.allowed_uri_patterns,
        )?;

        Ok(patterns)
    }
}

/// Run a parsed command, writing results to `out`
pub fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    match cli.command {
        Commands::Validate {
            patterns,
            file,
            workload_identity,
        } => validate_command(&patterns, &file, workload_identity, out),
        Commands::Patterns { patterns } => {
            for pattern in patterns.merged_patterns()? {
                writeln!(out, "{pattern}")?;
            }
            Ok(())
        }
        Commands::Version => {
            writeln!(out, "credcheck {}", env!("CARGO_PKG_VERSION"))?;
            writeln!(out, "Build timestamp: {}", env!("BUILD_TIMESTAMP"))?;
            writeln!(out, "Build datetime: {}", env!("BUILD_DATETIME"))?;
            writeln!(out, "Git hash: {}", env!("BUILD_GIT_HASH"))?;
            Ok(())
        }
    }
}

fn validate_command(
    args: &PatternArgs,
    file: &Path,
    workload_identity: bool,
    out: &mut impl Write,
) -> Result<()> {
    let kind = args.provider;
    let patterns = args.merged_patterns()?;
    debug!(provider = %kind, count = patterns.len(), "Merged allowed patterns");

    let raw = std::fs::read(file)
        .with_context(|| format!("Failed to read input file: {}", file.display()))?;

    let opts = RenderOptions::from_env();

    if workload_identity {
        let validator = validator_for(kind, patterns);
        let validated = validator
            .validate_workload_identity_config(Some(&raw))
            .map_err(|e| anyhow::anyhow!(e.render(&opts)))
            .context("Workload identity config is invalid")?;
        info!(provider = %kind, fields = validated.len(), "Workload identity config is valid");
        return print_fields(out, validated.keys());
    }

    let data = read_secret_data(&raw)
        .with_context(|| format!("Failed to parse secret data: {}", file.display()))?;

    if kind == ProviderKind::OpenStack {
        if let Some(auth_url) = data.get(AUTH_URL_FIELD) {
            let auth_url = String::from_utf8_lossy(auth_url);
            OpenStackValidator::new(patterns.clone())
                .validate_auth_url(&auth_url)
                .map_err(|e| anyhow::anyhow!(e.render(&opts)))
                .context("Auth URL is not allowed")?;
        }
    }

    let validator = validator_for(kind, patterns);
    let validated = validator
        .validate_secret(&data)
        .map_err(|e| anyhow::anyhow!(e.render(&opts)))
        .context("Secret data is invalid")?;

    info!(provider = %kind, fields = validated.len(), "Secret data is valid");
    print_fields(out, validated.keys())
}

/// Decode a JSON object of string values into secret data
fn read_secret_data(raw: &[u8]) -> Result<SecretData> {
    let entries: BTreeMap<String, String> =
        serde_json::from_slice(raw).context("Expected a JSON object of string values")?;

    Ok(entries
        .into_iter()
        .map(|(key, value)| (key, value.into_bytes()))
        .collect())
}

fn print_fields<'a>(out: &mut impl Write, fields: impl Iterator<Item = &'a String>) -> Result<()> {
    for field in fields {
        writeln!(out, "{field}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_string(args: &[&str]) -> Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("credcheck").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        run(cli, &mut out)?;
        Ok(String::from_utf8(out).expect("output should be UTF-8"))
    }

    fn write_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write temp file");
        file
    }

    #[test]
    fn test_validate_prints_field_names_only() {
        let token = "Ab3".repeat(21) + "x";
        let file = write_file(&format!(r#"{{"hcloudToken":"{token}","extra":"x"}}"#));

        let output = run_to_string(&[
            "validate",
            "--provider",
            "hcloud",
            "--file",
            file.path().to_str().unwrap(),
        ])
        .unwrap();

        assert_eq!(output, "hcloudToken\n");
        assert!(!output.contains(&token));
    }

    #[test]
    fn test_validate_failure_is_redacted() {
        let file = write_file(r#"{"hcloudToken":"definitely-not-valid"}"#);

        let err = run_to_string(&[
            "validate",
            "--provider",
            "hcloud",
            "--file",
            file.path().to_str().unwrap(),
        ])
        .unwrap_err();

        let rendered = format!("{err:#}");
        assert!(rendered.contains("hcloudToken"));
        assert!(!rendered.contains("definitely-not-valid"));
    }

    #[test]
    fn test_validate_rejects_non_object_input() {
        let file = write_file("[1, 2, 3]");
        let err = run_to_string(&[
            "validate",
            "--provider",
            "aws",
            "--file",
            file.path().to_str().unwrap(),
        ])
        .unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse secret data"));
    }

    #[test]
    fn test_patterns_includes_flag_patterns() {
        let output = run_to_string(&[
            "patterns",
            "--provider",
            "openstack",
            "--allowed-uri-pattern",
            "authURL=https://keystone.example.com:5000/v3",
        ])
        .unwrap();

        assert_eq!(output.lines().count(), 1);
        assert!(output.contains("keystone.example.com"));
        assert!(output.contains("5000"));
    }

    #[test]
    fn test_patterns_rejects_flags_for_fixed_provider() {
        let err = run_to_string(&[
            "patterns",
            "--provider",
            "aws",
            "--allowed-uri-pattern",
            "accessKeyID=https://example.com",
        ])
        .unwrap_err();
        assert!(format!("{err:#}").contains("aws"));
    }

    #[test]
    fn test_patterns_for_stackit_audience() {
        let output = run_to_string(&[
            "patterns",
            "--provider",
            "stackit",
            "--allowed-uri-pattern",
            "aud=https://sts.example.com/token",
        ])
        .unwrap();

        let defaults = ProviderKind::Stackit.default_patterns().len();
        assert_eq!(output.lines().count(), defaults + 1);
        assert!(output.contains("host:sts.example.com,path:/token"));
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        assert!(Cli::try_parse_from(["credcheck", "patterns", "--provider", "digitalocean"]).is_err());
    }
}
