use crate::config::DiscoveryConfig;
use crate::domain::model::{
    AttestationEnvelope, CatalogPage, CatalogQuery, HealthReport, RegistrationPayload,
    RegistrationReceipt, ServiceRecord,
};
use crate::domain::ports::DiscoveryBackend;
use crate::utils::error::{DiscoveryError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};

/// reqwest-backed client for the discovery backend's HTTP API.
///
/// One attempt per call, bounded by the configured timeout; no retries and
/// no response caching.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    config: DiscoveryConfig,
}

impl HttpBackend {
    pub fn new(config: DiscoveryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("x402-discovery/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// 盡量帶出後端錯誤回應中的 `detail`
    async fn error_detail(response: Response) -> Option<String> {
        let body = response.text().await.ok()?;
        match serde_json::from_str::<serde_json::Value>(&body).ok()?.get("detail")? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// 非 2xx 回應轉成 Backend 錯誤
    async fn backend_error(response: Response) -> DiscoveryError {
        let status = response.status().as_u16();
        let detail = Self::error_detail(response).await;
        DiscoveryError::Backend { status, detail }
    }
}

#[async_trait]
impl DiscoveryBackend for HttpBackend {
    async fn fetch_catalog(&self, query: &CatalogQuery) -> Result<Vec<ServiceRecord>> {
        let url = self.config.catalog_url();
        tracing::debug!("📡 Fetching catalog from: {} ({:?})", url, query);

        let mut request = self.client.get(&url);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await?;
        tracing::debug!("Catalog response status: {}", response.status());

        if !response.status().is_success() {
            return Err(Self::backend_error(response).await);
        }

        let page: CatalogPage = response.json().await?;
        tracing::debug!(
            "Catalog returned {} services (total reported: {:?})",
            page.services.len(),
            page.total
        );
        Ok(page.services)
    }

    async fn health(&self, service_id: &str) -> Result<HealthReport> {
        let url = self.config.service_url("health", service_id)?;
        tracing::debug!("📡 Checking health at: {}", url);

        let response = self.client.get(url).send().await?;
        tracing::debug!("Health response status: {}", response.status());

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DiscoveryError::not_found("Service", service_id));
        }
        if !response.status().is_success() {
            return Err(Self::backend_error(response).await);
        }

        let mut report: HealthReport = response.json().await?;
        if report.service_id.is_empty() {
            report.service_id = service_id.to_string();
        }
        Ok(report)
    }

    async fn register(&self, payload: &RegistrationPayload) -> Result<RegistrationReceipt> {
        let url = self.config.endpoint("register");
        tracing::debug!("📡 Registering '{}' at: {}", payload.name, url);

        let response = self.client.post(&url).json(payload).send().await?;
        tracing::debug!("Register response status: {}", response.status());

        if !response.status().is_success() {
            return Err(Self::backend_error(response).await);
        }

        Ok(response.json().await?)
    }

    async fn attest(&self, service_id: &str) -> Result<AttestationEnvelope> {
        let url = self.config.service_url("v1/attest", service_id)?;
        tracing::debug!("📡 Requesting attestation from: {}", url);

        let response = self.client.get(url).send().await?;
        tracing::debug!("Attest response status: {}", response.status());

        match response.status() {
            StatusCode::NOT_FOUND => return Err(DiscoveryError::not_found("Service", service_id)),
            StatusCode::SERVICE_UNAVAILABLE => {
                return Err(DiscoveryError::SigningNotConfigured {
                    service_id: service_id.to_string(),
                    detail: Self::error_detail(response).await,
                })
            }
            status if !status.is_success() => return Err(Self::backend_error(response).await),
            _ => {}
        }

        // 後端可能回 JSON 包裝，也可能直接回 token 字串
        let body = response.text().await?;
        let envelope = match serde_json::from_str::<AttestationEnvelope>(&body) {
            Ok(envelope) => envelope,
            Err(_) => AttestationEnvelope {
                token: body.trim().trim_matches('"').to_string(),
                ..Default::default()
            },
        };

        Ok(envelope)
    }
}
