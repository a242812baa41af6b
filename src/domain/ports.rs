use crate::domain::model::{
    AttestationEnvelope, CatalogQuery, HealthReport, RegistrationPayload, RegistrationReceipt,
    ServiceRecord,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// The remote discovery backend. Every call is one attempt with no caching:
/// two calls may observe different catalog snapshots, and there is no
/// read-your-writes guarantee between a registration and a later fetch.
#[async_trait]
pub trait DiscoveryBackend: Send + Sync {
    /// `GET /catalog`
    async fn fetch_catalog(&self, query: &CatalogQuery) -> Result<Vec<ServiceRecord>>;

    /// `GET /health/{service_id}`; a 404 maps to `DiscoveryError::NotFound`.
    async fn health(&self, service_id: &str) -> Result<HealthReport>;

    /// `POST /register`. Not idempotent, duplicates are the registry's concern.
    async fn register(&self, payload: &RegistrationPayload) -> Result<RegistrationReceipt>;

    /// `GET /v1/attest/{service_id}`
    async fn attest(&self, service_id: &str) -> Result<AttestationEnvelope>;
}
