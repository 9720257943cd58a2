//! # Provider Validators
//!
//! Credential validators for each supported cloud provider.
//!
//! Each provider implements [`CredentialValidator`] on top of a
//! [`BaseValidator`] holding its allowed patterns, and exposes:
//! - its built-in default patterns
//! - the [`ValidationContext`] its patterns (built-in and user-provided) are checked against

use crate::pattern::{Pattern, ValidationContext};
use crate::validation::{BaseValidator, FieldError, Fields, ValidationError};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub mod alicloud;
pub mod aws;
pub mod azure;
pub mod gcp;
pub mod hcloud;
pub mod openstack;
mod pem;
pub mod stackit;

pub use alicloud::AliCloudValidator;
pub use aws::AwsValidator;
pub use azure::AzureValidator;
pub use gcp::GcpValidator;
pub use hcloud::HCloudValidator;
pub use openstack::OpenStackValidator;
pub use stackit::StackitValidator;

/// Raw secret data, keyed by secret entry name
pub type SecretData = BTreeMap<String, Vec<u8>>;

/// Validates credentials for one provider
pub trait CredentialValidator: Send + Sync + fmt::Debug {
    fn provider(&self) -> ProviderKind;

    /// Validate secret data, returning only the registry-matched fields
    fn validate_secret(&self, data: &SecretData) -> Result<Fields, ValidationError>;

    /// Validate a workload identity provider config document (raw JSON)
    fn validate_workload_identity_config(
        &self,
        _provider_config: Option<&[u8]>,
    ) -> Result<Fields, ValidationError> {
        Err(FieldError::new(
            "providerConfig",
            format!("workload identity not supported for {}", self.provider()),
            true,
        )
        .into())
    }

    fn base(&self) -> &BaseValidator;
}

/// Supported providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderKind {
    Aws,
    Azure,
    Gcp,
    HCloud,
    AliCloud,
    OpenStack,
    Stackit,
}

impl ProviderKind {
    pub const ALL: [Self; 7] = [
        Self::Aws,
        Self::Azure,
        Self::Gcp,
        Self::HCloud,
        Self::AliCloud,
        Self::OpenStack,
        Self::Stackit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Azure => "azure",
            Self::Gcp => "gcp",
            Self::HCloud => "hcloud",
            Self::AliCloud => "alicloud",
            Self::OpenStack => "openstack",
            Self::Stackit => "stackit",
        }
    }

    /// Built-in allowed patterns
    pub fn default_patterns(self) -> Vec<Pattern> {
        match self {
            Self::Aws => aws::default_patterns(),
            Self::Azure => azure::default_patterns(),
            Self::Gcp => gcp::default_patterns(),
            Self::HCloud => hcloud::default_patterns(),
            Self::AliCloud => alicloud::default_patterns(),
            Self::OpenStack => openstack::default_patterns(),
            Self::Stackit => stackit::default_patterns(),
        }
    }

    /// Context all patterns of this provider are validated against
    pub fn validation_context(self) -> ValidationContext {
        match self {
            Self::Aws => aws::validation_context(),
            Self::Azure => azure::validation_context(),
            Self::Gcp => gcp::validation_context(),
            Self::HCloud => hcloud::validation_context(),
            Self::AliCloud => alicloud::validation_context(),
            Self::OpenStack => openstack::validation_context(),
            Self::Stackit => stackit::validation_context(),
        }
    }

    /// Whether users may supply additional patterns for this provider
    pub fn accepts_user_patterns(self) -> bool {
        !self
            .validation_context()
            .allowed_user_configurable_fields
            .is_empty()
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown provider name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown provider {0:?}, expected one of: aws, azure, gcp, hcloud, alicloud, openstack, stackit")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownProvider(s.to_string()))
    }
}

/// Build the validator for `kind` using `allowed_patterns`
///
/// Pass the provider's merged patterns (see
/// [`merge_provider_patterns`](crate::pattern::merge_provider_patterns)).
pub fn validator_for(
    kind: ProviderKind,
    allowed_patterns: Vec<Pattern>,
) -> Box<dyn CredentialValidator> {
    match kind {
        ProviderKind::Aws => Box::new(AwsValidator::new(allowed_patterns)),
        ProviderKind::Azure => Box::new(AzureValidator::new(allowed_patterns)),
        ProviderKind::Gcp => Box::new(GcpValidator::new(allowed_patterns)),
        ProviderKind::HCloud => Box::new(HCloudValidator::new(allowed_patterns)),
        ProviderKind::AliCloud => Box::new(AliCloudValidator::new(allowed_patterns)),
        ProviderKind::OpenStack => Box::new(OpenStackValidator::new(allowed_patterns)),
        ProviderKind::Stackit => Box::new(StackitValidator::new(allowed_patterns)),
    }
}
