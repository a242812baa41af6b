use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Request to discovery backend failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Discovery backend returned HTTP {status}{}", detail_suffix(.detail))]
    Backend { status: u16, detail: Option<String> },

    #[error("{resource} '{id}' not found")]
    NotFound { resource: String, id: String },

    #[error(
        "Attestation signing is not configured on the backend (service '{service_id}'){}",
        detail_suffix(.detail)
    )]
    SigningNotConfigured {
        service_id: String,
        detail: Option<String>,
    },

    #[error("Malformed attestation token: {reason}")]
    MalformedToken { reason: String },

    #[error("Invalid field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid configuration value for '{field}' ({value}): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {}", d))
        .unwrap_or_default()
}

/// 錯誤分類，對應各元件的邊界
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transport,
    Backend,
    NotFound,
    Token,
    Validation,
    Configuration,
    Internal,
}

impl DiscoveryError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        Self::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) => ErrorCategory::Transport,
            Self::Backend { .. } | Self::SigningNotConfigured { .. } => ErrorCategory::Backend,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::MalformedToken { .. } => ErrorCategory::Token,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Config { .. } | Self::InvalidConfigValue { .. } => ErrorCategory::Configuration,
            Self::Serialization(_) | Self::Io(_) => ErrorCategory::Internal,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// 給使用者（或呼叫方 agent）的補救建議
    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::Transport(_) if self.is_timeout() => {
                "The discovery backend did not answer in time. Try again shortly; the call was not retried.".to_string()
            }
            Self::Transport(_) => {
                "Check network connectivity and the configured discovery base URL.".to_string()
            }
            Self::Backend { .. } => {
                "The discovery backend rejected the request. Check the request fields or try again later.".to_string()
            }
            Self::NotFound { .. } => {
                "Use the browse tool to list available service IDs.".to_string()
            }
            Self::SigningNotConfigured { .. } => {
                "The backend cannot sign attestations right now. Use the health tool for unsigned live status.".to_string()
            }
            Self::MalformedToken { .. } => {
                "Request the attestation again with raw=true and inspect the token manually.".to_string()
            }
            Self::Validation { field, .. } => {
                format!("Provide a valid value for '{}' and submit again.", field)
            }
            Self::Config { .. } | Self::InvalidConfigValue { .. } => {
                "Fix the configuration file, CLI flags or environment variables.".to_string()
            }
            Self::Serialization(_) | Self::Io(_) => {
                "Unexpected internal failure. Re-run with --verbose for details.".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Transport => format!("Could not reach the discovery backend: {}", self),
            ErrorCategory::Backend => format!("Discovery backend error: {}", self),
            ErrorCategory::NotFound => self.to_string(),
            ErrorCategory::Token => format!("Could not decode attestation: {}", self),
            ErrorCategory::Validation => format!("Submission rejected: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Internal => format!("Internal error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
