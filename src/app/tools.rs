//! The tool surface exposed to an invoking agent. Every tool returns text
//! and none of them fails: errors are rendered with a cause and a
//! remediation hint.

use crate::app::render;
use crate::core::service::DiscoveryService;
use crate::domain::model::{
    QualityTier, QueryCriteria, RegistrationSubmission, DEFAULT_MAX_PRICE_USD,
};
use crate::domain::ports::DiscoveryBackend;
use crate::utils::error::Result;

#[derive(Debug, Clone)]
pub struct DiscoverRequest {
    pub query: Option<String>,
    pub capability: Option<String>,
    pub max_price_usd: f64,
    /// Tier name as supplied by the caller, e.g. `"silver"`.
    pub min_quality: String,
}

impl Default for DiscoverRequest {
    fn default() -> Self {
        Self {
            query: None,
            capability: None,
            max_price_usd: DEFAULT_MAX_PRICE_USD,
            min_quality: QualityTier::Unverified.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub name: String,
    pub endpoint_url: String,
    pub description: String,
    pub price_per_call: f64,
    /// Comma-separated.
    pub capability_tags: String,
    pub category: Option<String>,
    pub wallet_address: Option<String>,
    pub network: Option<String>,
    pub auth_required: Option<bool>,
    pub agent_callable: Option<bool>,
}

impl From<RegisterRequest> for RegistrationSubmission {
    fn from(req: RegisterRequest) -> Self {
        RegistrationSubmission {
            name: Some(req.name),
            endpoint_url: Some(req.endpoint_url),
            description: Some(req.description),
            price_per_call: Some(req.price_per_call),
            capability_tags: Some(req.capability_tags),
            category: req.category,
            wallet_address: req.wallet_address,
            network: req.network,
            auth_required: req.auth_required,
            agent_callable: req.agent_callable,
        }
    }
}

pub struct DiscoveryTools<B: DiscoveryBackend> {
    service: DiscoveryService<B>,
}

impl<B: DiscoveryBackend> DiscoveryTools<B> {
    pub fn new(service: DiscoveryService<B>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &DiscoveryService<B> {
        &self.service
    }

    pub async fn discover(&self, request: DiscoverRequest) -> String {
        let config = self.service.config();
        let criteria = match to_criteria(request) {
            Ok(criteria) => criteria,
            Err(e) => return render::failure("Discovery", &e, config),
        };

        match self.service.discover(&criteria).await {
            Ok(result) => render::ranked(&result, &criteria, config),
            Err(e) => {
                tracing::error!("❌ Discover failed: {}", e);
                render::failure("Discovery", &e, config)
            }
        }
    }

    pub async fn browse(&self, category: Option<&str>) -> String {
        let config = self.service.config();
        match self.service.browse(category).await {
            Ok(overview) => render::overview(&overview, category, config),
            Err(e) => {
                tracing::error!("❌ Browse failed: {}", e);
                render::failure("Browse", &e, config)
            }
        }
    }

    pub async fn health(&self, service_id: &str) -> String {
        match self.service.health(service_id).await {
            Ok(report) => render::health(&report),
            Err(e) => {
                tracing::warn!("Health check for '{}' failed: {}", service_id, e);
                render::failure("Health check", &e, self.service.config())
            }
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> String {
        let config = self.service.config();
        let submission = RegistrationSubmission::from(request);
        match self.service.register(&submission).await {
            Ok((payload, receipt)) => render::registration(&payload, &receipt, config),
            Err(e) => {
                tracing::error!("❌ Registration failed: {}", e);
                render::failure("Registration", &e, config)
            }
        }
    }

    pub async fn attest(&self, service_id: &str, raw: bool) -> String {
        let config = self.service.config();
        match self.service.attest(service_id, raw).await {
            Ok(outcome) => render::attestation(&outcome, config, chrono::Utc::now().timestamp()),
            Err(e) => {
                tracing::warn!("Attestation for '{}' failed: {}", service_id, e);
                render::failure("Attestation", &e, config)
            }
        }
    }
}

fn to_criteria(request: DiscoverRequest) -> Result<QueryCriteria> {
    Ok(QueryCriteria {
        capability: request.capability,
        max_price_usd: request.max_price_usd,
        min_quality: request.min_quality.parse()?,
        query: request.query,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_criteria_rejects_unknown_tier() {
        let request = DiscoverRequest {
            min_quality: "platinum".to_string(),
            ..Default::default()
        };
        assert!(to_criteria(request).is_err());

        let criteria = to_criteria(DiscoverRequest::default()).unwrap();
        assert_eq!(criteria, QueryCriteria::default());
    }
}
