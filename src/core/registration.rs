//! Validation and normalization of new-service submissions.
//!
//! Defaults for optional fields are part of the contract and stable:
//! network [`DEFAULT_NETWORK`], `auth_required = false`,
//! `agent_callable = true`. Wallet and network fall back to the
//! process-wide configuration when the submission carries none.

use crate::config::DiscoveryConfig;
use crate::domain::model::{RegistrationPayload, RegistrationSubmission};
use crate::utils::error::{DiscoveryError, Result};
use crate::utils::validation::{require_non_empty, validate_url};

pub const DEFAULT_NETWORK: &str = "base";
pub const DEFAULT_AUTH_REQUIRED: bool = false;
pub const DEFAULT_AGENT_CALLABLE: bool = true;

pub fn normalize(
    submission: &RegistrationSubmission,
    config: &DiscoveryConfig,
) -> Result<RegistrationPayload> {
    let name = require_non_empty("name", submission.name.as_deref())?;
    let endpoint_url = require_non_empty("endpoint_url", submission.endpoint_url.as_deref())?;
    validate_url("endpoint_url", &endpoint_url).map_err(|e| match e {
        DiscoveryError::InvalidConfigValue { reason, .. } => {
            DiscoveryError::validation("endpoint_url", reason)
        }
        other => other,
    })?;
    let description = require_non_empty("description", submission.description.as_deref())?;

    let price_per_call = match submission.price_per_call {
        None => return Err(DiscoveryError::validation("price_per_call", "value is required")),
        Some(p) if !p.is_finite() => {
            return Err(DiscoveryError::validation("price_per_call", "must be a finite number"))
        }
        Some(p) if p < 0.0 => {
            return Err(DiscoveryError::validation(
                "price_per_call",
                format!("must not be negative, got {}", p),
            ))
        }
        Some(p) => p,
    };

    let capability_tags = split_tags(submission.capability_tags.as_deref().unwrap_or(""));
    let category = non_blank(submission.category.as_deref());
    if capability_tags.is_empty() && category.is_none() {
        return Err(DiscoveryError::validation(
            "capability_tags",
            "at least one capability tag or a category is required",
        ));
    }

    Ok(RegistrationPayload {
        name,
        endpoint_url,
        description,
        price_per_call,
        capability_tags,
        category,
        wallet_address: non_blank(submission.wallet_address.as_deref())
            .or_else(|| non_blank(config.default_wallet.as_deref())),
        network: non_blank(submission.network.as_deref())
            .or_else(|| non_blank(Some(&config.default_network)))
            .unwrap_or_else(|| DEFAULT_NETWORK.to_string()),
        auth_required: submission.auth_required.unwrap_or(DEFAULT_AUTH_REQUIRED),
        agent_callable: submission.agent_callable.unwrap_or(DEFAULT_AGENT_CALLABLE),
    })
}

/// Split a comma-delimited tag list, keeping first occurrences in order.
pub fn split_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_wallet(wallet: &str) -> DiscoveryConfig {
        DiscoveryConfig {
            default_wallet: Some(wallet.to_string()),
            ..Default::default()
        }
    }

    fn submission() -> RegistrationSubmission {
        RegistrationSubmission {
            name: Some("Deep Research".to_string()),
            endpoint_url: Some("https://research.example.com/v1".to_string()),
            description: Some("Multi-source web research".to_string()),
            price_per_call: Some(0.05),
            capability_tags: Some("research".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_tag_and_defaults() {
        let payload = normalize(&submission(), &DiscoveryConfig::default()).unwrap();
        assert_eq!(payload.capability_tags, vec!["research".to_string()]);
        assert_eq!(payload.network, "base");
        assert!(!payload.auth_required);
        assert!(payload.agent_callable);
        assert_eq!(payload.wallet_address, None);
        assert_eq!(payload.category, None);
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut s = submission();
        s.name = Some(String::new());
        let err = normalize(&s, &DiscoveryConfig::default()).unwrap_err();
        assert!(matches!(err, DiscoveryError::Validation { ref field, .. } if field == "name"));
    }

    #[test]
    fn test_negative_and_missing_price_rejected() {
        let mut s = submission();
        s.price_per_call = Some(-0.01);
        assert!(normalize(&s, &DiscoveryConfig::default()).is_err());

        s.price_per_call = None;
        assert!(normalize(&s, &DiscoveryConfig::default()).is_err());

        s.price_per_call = Some(0.0);
        assert_eq!(normalize(&s, &DiscoveryConfig::default()).unwrap().price_per_call, 0.0);
    }

    #[test]
    fn test_needs_tag_or_category() {
        let mut s = submission();
        s.capability_tags = Some(" , ,".to_string());
        assert!(normalize(&s, &DiscoveryConfig::default()).is_err());

        s.category = Some("research".to_string());
        let payload = normalize(&s, &DiscoveryConfig::default()).unwrap();
        assert!(payload.capability_tags.is_empty());
        assert_eq!(payload.category.as_deref(), Some("research"));
    }

    #[test]
    fn test_invalid_endpoint_rejected_as_validation_error() {
        let mut s = submission();
        s.endpoint_url = Some("research.example.com".to_string());
        let err = normalize(&s, &DiscoveryConfig::default()).unwrap_err();
        assert!(
            matches!(err, DiscoveryError::Validation { ref field, .. } if field == "endpoint_url")
        );
    }

    #[test]
    fn test_split_tags_trims_and_dedups() {
        assert_eq!(
            split_tags(" research, summarization ,,research,data "),
            vec!["research", "summarization", "data"]
        );
        assert!(split_tags("").is_empty());
    }

    #[test]
    fn test_wallet_falls_back_to_default() {
        let payload = normalize(&submission(), &with_wallet("0xabc")).unwrap();
        assert_eq!(payload.wallet_address.as_deref(), Some("0xabc"));

        let mut s = submission();
        s.wallet_address = Some("0xdef".to_string());
        s.network = Some("base-sepolia".to_string());
        let payload = normalize(&s, &with_wallet("0xabc")).unwrap();
        assert_eq!(payload.wallet_address.as_deref(), Some("0xdef"));
        assert_eq!(payload.network, "base-sepolia");
    }
}
