//! Static configuration for the membership gate and the role grant step.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

use crate::roles::RoleSpec;
use crate::secret::Secret;

/// Organization enforced when none is configured.
pub const DEFAULT_ORGANIZATION: &str = "nidus-lab";

/// Membership API root used when none is configured.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// `Accept` header sent with every membership request by default.
pub const DEFAULT_ACCEPT: &str = "application/vnd.github+json";

/// `User-Agent` header sent with every membership request by default.
pub const DEFAULT_USER_AGENT: &str = concat!("membership-gate/", env!("CARGO_PKG_VERSION"));

/// Default bound on the outbound membership call.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Authenticator config key holding the organization.
pub const ORGANIZATION_KEY: &str = "githubOrg";

/// Authenticator config key holding the service credential.
pub const SERVICE_CREDENTIAL_KEY: &str = "githubServiceToken";

/// Authenticator config key holding the comma-separated role list.
pub const ROLES_KEY: &str = "roles";

/// Membership gate configuration.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateConfig {
    /// Organization the subject must be an active member of. Blank values
    /// fall back to [`DEFAULT_ORGANIZATION`].
    #[serde(deserialize_with = "deserialize_organization")]
    pub organization: String,

    /// Optional credential with organization read permission. Preferred over
    /// the per-user token when present.
    pub service_credential: Option<Secret<String>>,

    /// Root of the membership API.
    pub api_base_url: String,

    /// `Accept` header value.
    pub accept: String,

    /// `User-Agent` header value.
    pub user_agent: String,

    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            organization: DEFAULT_ORGANIZATION.to_owned(),
            service_credential: None,
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            accept: DEFAULT_ACCEPT.to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl GateConfig {
    /// Builds a configuration from the host's flat authenticator config map.
    ///
    /// Reads [`ORGANIZATION_KEY`] and [`SERVICE_CREDENTIAL_KEY`]; everything
    /// else keeps its default. A missing or blank organization falls back to
    /// [`DEFAULT_ORGANIZATION`].
    pub fn from_authenticator_config(config: &HashMap<String, String>) -> Self {
        let organization = organization_or_default(
            config.get(ORGANIZATION_KEY).map(String::as_str).unwrap_or_default(),
        );

        let service_credential = config
            .get(SERVICE_CREDENTIAL_KEY)
            .filter(|token| !token.trim().is_empty())
            .map(|token| Secret::new(token.clone()));

        Self {
            organization,
            service_credential,
            ..Self::default()
        }
    }
}

/// Trims `org`, substituting [`DEFAULT_ORGANIZATION`] when nothing is left.
pub(crate) fn organization_or_default(org: &str) -> String {
    match org.trim() {
        "" => DEFAULT_ORGANIZATION.to_owned(),
        org => org.to_owned(),
    }
}

fn deserialize_organization<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(|org| organization_or_default(&org))
}

/// Role grant step configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoleGrantConfig {
    /// Comma-separated role list, e.g. `"admin, ci:deployer"`.
    pub roles: String,
}

impl RoleGrantConfig {
    /// Builds a configuration from the host's flat authenticator config map.
    pub fn from_authenticator_config(config: &HashMap<String, String>) -> Self {
        Self {
            roles: config.get(ROLES_KEY).cloned().unwrap_or_default(),
        }
    }

    /// Parses the configured role list.
    pub fn role_specs(&self) -> Vec<RoleSpec> {
        RoleSpec::parse_list(&self.roles)
    }
}
