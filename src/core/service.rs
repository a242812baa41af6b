use crate::config::DiscoveryConfig;
use crate::core::{attestation, ranking, registration};
use crate::domain::model::{
    AttestationOutcome, CatalogOverview, CatalogQuery, HealthReport, QueryCriteria,
    RankedResult, RegistrationPayload, RegistrationReceipt, RegistrationSubmission,
    ServiceRecord,
};
use crate::domain::ports::DiscoveryBackend;
use crate::utils::error::{DiscoveryError, Result};
use crate::utils::validation::require_non_empty;
use std::collections::BTreeMap;

/// Structured discovery operations over a backend.
///
/// Each method is an independent request/response unit: a fresh catalog
/// fetch per discover/browse, at most one backend attempt, no shared
/// mutable state.
pub struct DiscoveryService<B: DiscoveryBackend> {
    backend: B,
    config: DiscoveryConfig,
}

impl<B: DiscoveryBackend> DiscoveryService<B> {
    pub fn new(backend: B, config: DiscoveryConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub async fn discover(&self, criteria: &QueryCriteria) -> Result<RankedResult> {
        let records = self.backend.fetch_catalog(&CatalogQuery::default()).await?;
        let fetched = records.len();
        let result = ranking::discover(records, criteria);

        tracing::info!(
            "🔍 Discover: {} fetched, {} matched, {} returned",
            fetched,
            result.total_matches,
            result.len()
        );
        Ok(result)
    }

    pub async fn browse(&self, category: Option<&str>) -> Result<CatalogOverview> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        let query = CatalogQuery {
            category: category.map(str::to_string),
            ..Default::default()
        };

        let records = self.backend.fetch_catalog(&query).await?;
        let overview = group_catalog(records, category);
        tracing::info!(
            "📚 Browse: {} services in {} categories",
            overview.total_services,
            overview.groups.len()
        );
        Ok(overview)
    }

    pub async fn health(&self, service_id: &str) -> Result<HealthReport> {
        let service_id = require_non_empty("service_id", Some(service_id))?;
        self.backend.health(&service_id).await
    }

    pub async fn register(
        &self,
        submission: &RegistrationSubmission,
    ) -> Result<(RegistrationPayload, RegistrationReceipt)> {
        let payload = registration::normalize(submission, &self.config)?;
        let receipt = self.backend.register(&payload).await?;

        tracing::info!(
            "📝 Registered '{}' as service_id={}",
            payload.name,
            receipt.service_id
        );
        Ok((payload, receipt))
    }

    pub async fn attest(&self, service_id: &str, raw: bool) -> Result<AttestationOutcome> {
        let service_id = require_non_empty("service_id", Some(service_id))?;
        let envelope = self.backend.attest(&service_id).await?;

        if raw {
            return Ok(AttestationOutcome::Raw {
                service_id,
                token: envelope.token,
            });
        }

        match attestation::decode(&envelope.token) {
            Ok(report) => Ok(AttestationOutcome::Decoded(report)),
            Err(err @ DiscoveryError::MalformedToken { .. }) => {
                tracing::warn!(
                    "⚠️ Attestation for {} could not be decoded, returning reduced report: {}",
                    service_id,
                    err
                );
                Ok(AttestationOutcome::Reduced(attestation::reduce(&envelope, &err)))
            }
            Err(err) => Err(err),
        }
    }
}

/// Group records by [`ServiceRecord::group_key`], optionally keeping only a
/// single category (matched against category or capability tags).
pub fn group_catalog(records: Vec<ServiceRecord>, category: Option<&str>) -> CatalogOverview {
    let mut groups: BTreeMap<String, Vec<ServiceRecord>> = BTreeMap::new();
    let mut total_services = 0;

    for record in records {
        if let Some(cat) = category {
            if record.category.as_deref() != Some(cat) && !record.has_tag(cat) {
                continue;
            }
        }
        total_services += 1;
        groups
            .entry(record.group_key().to_string())
            .or_default()
            .push(record);
    }

    CatalogOverview {
        groups: groups.into_iter().collect(),
        total_services,
    }
}
