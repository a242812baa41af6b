pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{CliArgs, Command};

pub use adapters::HttpBackend;
pub use app::{DiscoverRequest, DiscoveryTools, RegisterRequest};
pub use config::DiscoveryConfig;
pub use crate::core::service::DiscoveryService;
pub use utils::error::{DiscoveryError, Result};
