#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::utils::error::{DiscoveryError, Result};
use crate::utils::validation::{validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://x402-discovery-api.onrender.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Process-lifetime configuration. Built once at start-up and handed to each
/// component; nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    pub base_url: String,
    /// Payout wallet used for registrations that do not name one.
    pub default_wallet: Option<String>,
    pub default_network: String,
    pub request_timeout_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_wallet: None,
            default_network: crate::core::registration::DEFAULT_NETWORK.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl DiscoveryConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// `{base_url}/{prefix}/{service_id}` with every segment of the service
    /// ID percent-encoded. `/` inside the ID stays a separator; `?` and `#`
    /// cannot leak into the query or fragment.
    pub fn service_url(&self, prefix: &str, service_id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| DiscoveryError::InvalidConfigValue {
            field: "base_url".to_string(),
            value: self.base_url.clone(),
            reason: e.to_string(),
        })?;

        url.path_segments_mut()
            .map_err(|_| DiscoveryError::InvalidConfigValue {
                field: "base_url".to_string(),
                value: self.base_url.clone(),
                reason: "cannot be used as a base URL".to_string(),
            })?
            .pop_if_empty()
            .extend(prefix.split('/').filter(|s| !s.is_empty()))
            .extend(service_id.split('/'));
        Ok(url)
    }

    pub fn catalog_url(&self) -> String {
        self.endpoint("catalog")
    }

    /// Published key set for verifying attestation signatures.
    pub fn jwks_url(&self) -> String {
        self.endpoint("jwks")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Validate for DiscoveryConfig {
    fn validate(&self) -> Result<()> {
        validate_url("base_url", &self.base_url)?;
        validate_range("request_timeout_secs", self.request_timeout_secs, 1, 120)?;
        Ok(())
    }
}
