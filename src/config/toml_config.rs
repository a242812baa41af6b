use crate::config::DiscoveryConfig;
use crate::utils::error::{DiscoveryError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional on-disk configuration, e.g. `x402-discovery.toml`:
///
/// ```toml
/// [discovery]
/// base_url = "https://x402-discovery-api.onrender.com"
/// default_wallet = "${X402_WALLET}"
/// request_timeout_secs = 15
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub discovery: Option<DiscoverySection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoverySection {
    pub base_url: Option<String>,
    pub default_wallet: Option<String>,
    pub default_network: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DiscoveryError::Config {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${X402_WALLET})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DiscoveryError::Config {
            message: format!("invalid env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 將檔案中有設定的欄位覆蓋到 `config`
    pub fn apply_to(&self, config: &mut DiscoveryConfig) {
        let Some(section) = &self.discovery else {
            return;
        };

        if let Some(base_url) = &section.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(wallet) = section.default_wallet.as_deref().filter(|w| !w.is_empty()) {
            config.default_wallet = Some(wallet.to_string());
        }
        if let Some(network) = &section.default_network {
            config.default_network = network.clone();
        }
        if let Some(timeout) = section.request_timeout_secs {
            config.request_timeout_secs = timeout;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::Validate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_and_apply() {
        let toml_content = r#"
[discovery]
base_url = "http://localhost:9000"
default_network = "base-sepolia"
request_timeout_secs = 10
"#;

        let file = TomlConfig::from_toml_str(toml_content).unwrap();
        let mut config = DiscoveryConfig::default();
        file.apply_to(&mut config);

        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.default_network, "base-sepolia");
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.default_wallet, None);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("X402_DISCOVERY_TEST_WALLET", "0x1234");

        let toml_content = r#"
[discovery]
default_wallet = "${X402_DISCOVERY_TEST_WALLET}"
"#;

        let file = TomlConfig::from_toml_str(toml_content).unwrap();
        let mut config = DiscoveryConfig::default();
        file.apply_to(&mut config);
        assert_eq!(config.default_wallet.as_deref(), Some("0x1234"));

        std::env::remove_var("X402_DISCOVERY_TEST_WALLET");
    }

    #[test]
    fn test_invalid_base_url_fails_validation() {
        let file = TomlConfig::from_toml_str("[discovery]\nbase_url = \"invalid-url\"\n").unwrap();
        let mut config = DiscoveryConfig::default();
        file.apply_to(&mut config);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_file_keeps_defaults() {
        let file = TomlConfig::from_toml_str("").unwrap();
        let mut config = DiscoveryConfig::default();
        file.apply_to(&mut config);
        assert_eq!(config, DiscoveryConfig::default());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[discovery]\nbase_url = \"https://discovery.example.com\"\n")
            .unwrap();

        let file = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(
            file.discovery.unwrap().base_url.as_deref(),
            Some("https://discovery.example.com")
        );
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("[discovery\nbase_url = 1").unwrap_err();
        assert!(matches!(err, DiscoveryError::Config { .. }));
    }
}
