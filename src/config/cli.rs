use crate::config::toml_config::TomlConfig;
use crate::config::DiscoveryConfig;
use crate::domain::model::{QualityTier, DEFAULT_MAX_PRICE_USD};
use crate::utils::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "x402-discovery")]
#[command(about = "Find, inspect, register and attest x402 pay-per-call services")]
pub struct CliArgs {
    /// Discovery backend base URL
    #[arg(long, env = "X402_DISCOVERY_URL")]
    pub base_url: Option<String>,

    /// Default payout wallet for registrations
    #[arg(long, env = "X402_WALLET")]
    pub wallet: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Top 5 services matching a query and constraints
    Discover {
        /// Free-text search over name and description
        #[arg(short, long)]
        query: Option<String>,

        /// Capability tag or category, e.g. research
        #[arg(long)]
        capability: Option<String>,

        /// Maximum acceptable price per call in USD
        #[arg(long, default_value_t = DEFAULT_MAX_PRICE_USD)]
        max_price: f64,

        /// Minimum quality tier: gold, silver, bronze or unverified
        #[arg(long, default_value = "unverified")]
        min_quality: QualityTier,
    },
    /// Whole catalog grouped by category
    Browse {
        #[arg(long)]
        category: Option<String>,
    },
    /// Live health of one service
    Health { service_id: String },
    /// Register a new service
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        endpoint_url: String,

        #[arg(long)]
        description: String,

        #[arg(long)]
        price: f64,

        /// Comma-separated capability tags
        #[arg(long, default_value = "")]
        capability_tags: String,

        #[arg(long)]
        category: Option<String>,

        /// Payout wallet, defaults to --wallet
        #[arg(long)]
        wallet_address: Option<String>,

        #[arg(long)]
        network: Option<String>,

        #[arg(long)]
        auth_required: bool,

        #[arg(long)]
        not_agent_callable: bool,
    },
    /// Signed quality attestation for a service
    Attest {
        service_id: String,

        /// Print the token as-is instead of decoding it
        #[arg(long)]
        raw: bool,
    },
}

impl CliArgs {
    /// 預設值 → TOML 檔案 → 命令列 / 環境變數
    pub fn resolve_config(&self) -> Result<DiscoveryConfig> {
        let mut config = DiscoveryConfig::default();

        if let Some(path) = &self.config {
            TomlConfig::from_file(path)?.apply_to(&mut config);
        }

        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(wallet) = self.wallet.as_deref().filter(|w| !w.is_empty()) {
            config.default_wallet = Some(wallet.to_string());
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }

        Ok(config)
    }
}
