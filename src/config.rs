//! # Configuration
//!
//! Two layers of configuration:
//! - [`AppConfig`]: file-based provider settings (allowed patterns), YAML or JSON
//! - [`RuntimeConfig`]: process settings loaded from environment variables

use crate::constants::UNSAFE_DEBUG_ENV_VAR;
use crate::pattern::Pattern;
use crate::provider::ProviderKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File-based configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Provider-specific configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderConfig>,
}

/// Allowed-pattern overrides per provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcp: Option<ProviderPatternConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openstack: Option<ProviderPatternConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stackit: Option<ProviderPatternConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderPatternConfig {
    /// Patterns deserialized here are always user-provided
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_patterns: Vec<Pattern>,
}

impl AppConfig {
    /// Load configuration from a YAML or JSON file
    ///
    /// The format is chosen by extension (`.json` is JSON, anything else YAML).
    /// A missing file yields the default configuration; an empty file likewise.
    /// Configured patterns are validated against their provider's context.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))
            }
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config: Self = if is_json {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to decode as JSON: {}", path.display()))?
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to decode as YAML: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configured patterns against each provider's context
    pub fn validate(&self) -> Result<()> {
        for kind in ProviderKind::ALL {
            let ctx = kind.validation_context();
            for (index, pattern) in self.allowed_patterns(kind).iter().enumerate() {
                pattern.validate(Some(&ctx)).with_context(|| {
                    format!(
                        "Invalid {kind} provider configuration: invalid allowed pattern at index {index}"
                    )
                })?;
            }
        }

        Ok(())
    }

    /// Configured patterns for `kind`; empty when the provider has none
    pub fn allowed_patterns(&self, kind: ProviderKind) -> &[Pattern] {
        let Some(provider) = &self.provider else {
            return &[];
        };

        let section = match kind {
            ProviderKind::Gcp => provider.gcp.as_ref(),
            ProviderKind::OpenStack => provider.openstack.as_ref(),
            ProviderKind::Stackit => provider.stackit.as_ref(),
            _ => None,
        };

        section.map_or(&[], |s| s.allowed_patterns.as_slice())
    }
}

/// Process-level settings
///
/// All settings have defaults and can be overridden via environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Log level used when `RUST_LOG` is not set (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
    /// Reveal redacted values in errors and logs
    pub unsafe_debug: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
            log_format: "text".to_string(),
            unsafe_debug: false,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            log_level: env_var_or_default_str("LOG_LEVEL", "INFO"),
            log_format: env_var_or_default_str("LOG_FORMAT", "text"),
            unsafe_debug: env_var_or_default_bool(UNSAFE_DEBUG_ENV_VAR, false),
        }
    }

    /// Whether logs should be emitted as JSON
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// Read environment variable as boolean or return default
pub(crate) fn env_var_or_default_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| {
            let v_lower = v.to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write temp file");
        file
    }

    #[test]
    fn test_missing_file_yields_default() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = AppConfig::load_from_file(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_yaml_patterns_are_user_provided() {
        let file = write_config(
            ".yaml",
            r"
provider:
  openstack:
    allowedPatterns:
      - field: authURL
        uri: https://keystone.example.com:5000/v3
",
        );

        let config = AppConfig::load_from_file(file.path()).unwrap();
        let patterns = config.allowed_patterns(ProviderKind::OpenStack);
        assert_eq!(patterns.len(), 1);
        assert!(patterns[0].is_user_provided);
        assert!(config.allowed_patterns(ProviderKind::Gcp).is_empty());
    }

    #[test]
    fn test_load_json_by_extension() {
        let file = write_config(
            ".json",
            r#"{"provider":{"gcp":{"allowedPatterns":[{"field":"token_uri","host":"oauth2.example.com","path":"/token"}]}}}"#,
        );

        let config = AppConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.allowed_patterns(ProviderKind::Gcp).len(), 1);
    }

    #[test]
    fn test_load_rejects_non_configurable_field() {
        let file = write_config(
            ".yaml",
            r"
provider:
  gcp:
    allowedPatterns:
      - field: client_id
        regexValue: '^[0-9]+$'
",
        );

        let err = AppConfig::load_from_file(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("cannot be configured by users"));
    }

    #[test]
    fn test_load_stackit_audience_patterns() {
        let file = write_config(
            ".yaml",
            r"
provider:
  stackit:
    allowedPatterns:
      - field: aud
        uri: https://sts.example.com/token
      - field: aud
        regexValue: '^urn:example:[a-z]+$'
",
        );

        let config = AppConfig::load_from_file(file.path()).unwrap();
        let patterns = config.allowed_patterns(ProviderKind::Stackit);
        assert_eq!(patterns.len(), 2);
        assert!(patterns.iter().all(|p| p.is_user_provided));

        let rejected = write_config(
            ".yaml",
            r"
provider:
  stackit:
    allowedPatterns:
      - field: iss
        regexValue: '^.*$'
",
        );
        let err = AppConfig::load_from_file(rejected.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid stackit provider configuration"));
    }

    #[test]
    fn test_empty_file_yields_default() {
        let file = write_config(".yaml", "   \n");
        assert_eq!(
            AppConfig::load_from_file(file.path()).unwrap(),
            AppConfig::default()
        );
    }

    #[test]
    fn test_runtime_config_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.log_level, "INFO");
        assert!(!config.json_logs());
        assert!(!config.unsafe_debug);
    }
}
