use crate::utils::error::DiscoveryError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// 缺少價格的服務視為此價格，實際上只有不設上限時才會通過
pub const MISSING_PRICE_SENTINEL: f64 = 999.0;

pub const DEFAULT_MAX_PRICE_USD: f64 = 0.50;

/// RankedResult 的長度上限
pub const MAX_RESULTS: usize = 5;

/// 將 JSON null 當作預設值處理
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// 目錄資料來自第三方登記，單一欄位型別錯誤不應讓整頁解析失敗

/// 數字或數字字串，其他型別視為缺值
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite()))
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    })
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(scalar_text(Value::deserialize(deserializer)?))
}

fn lenient_text_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

/// 非字串的 tag 直接略過
fn lenient_tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Coarse reliability classification assigned by the discovery backend.
///
/// Ordering follows [`QualityTier::rank`]: a lower rank is a better tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Gold,
    Silver,
    Bronze,
    #[default]
    Unverified,
}

impl QualityTier {
    pub const ALL: [QualityTier; 4] = [
        QualityTier::Gold,
        QualityTier::Silver,
        QualityTier::Bronze,
        QualityTier::Unverified,
    ];

    pub fn rank(self) -> u8 {
        match self {
            QualityTier::Gold => 0,
            QualityTier::Silver => 1,
            QualityTier::Bronze => 2,
            QualityTier::Unverified => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QualityTier::Gold => "gold",
            QualityTier::Silver => "silver",
            QualityTier::Bronze => "bronze",
            QualityTier::Unverified => "unverified",
        }
    }

    /// True when `self` is at least as good as `floor`.
    pub fn meets(self, floor: QualityTier) -> bool {
        self.rank() <= floor.rank()
    }

    /// Catalog records may carry tiers this crate does not know about;
    /// those are treated as unverified.
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

impl FromStr for QualityTier {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gold" => Ok(QualityTier::Gold),
            "silver" => Ok(QualityTier::Silver),
            "bronze" => Ok(QualityTier::Bronze),
            "unverified" => Ok(QualityTier::Unverified),
            other => Err(DiscoveryError::validation(
                "min_quality",
                format!(
                    "unknown quality tier '{}', expected one of gold, silver, bronze, unverified",
                    other
                ),
            )),
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for QualityTier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(raw) => Self::parse_lenient(&raw),
            _ => Self::default(),
        })
    }
}

/// One catalog entry. Immutable per fetch; a later fetch may return a
/// different set of records or different field values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    #[serde(default, deserialize_with = "lenient_text_or_empty")]
    pub service_id: String,
    #[serde(default, deserialize_with = "lenient_text_or_empty")]
    pub name: String,
    #[serde(default, alias = "url", deserialize_with = "lenient_text_or_empty")]
    pub endpoint_url: String,
    #[serde(default, deserialize_with = "lenient_text_or_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub price_per_call: Option<f64>,
    #[serde(default)]
    pub quality_tier: QualityTier,
    #[serde(default, deserialize_with = "lenient_number")]
    pub uptime_pct: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub avg_latency_ms: Option<f64>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub capability_tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub category: Option<String>,
    #[serde(default = "unknown_status", deserialize_with = "status_or_unknown")]
    pub health_status: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub sdk_snippet: Option<String>,
}

fn unknown_status() -> String {
    "unknown".to_string()
}

fn status_or_unknown<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_text(deserializer)?.unwrap_or_else(unknown_status))
}

impl ServiceRecord {
    pub fn effective_price(&self) -> f64 {
        self.price_per_call.unwrap_or(MISSING_PRICE_SENTINEL)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.capability_tags.iter().any(|t| t == tag)
    }

    /// Grouping key used by browse: category, else first tag, else "other".
    pub fn group_key(&self) -> &str {
        self.category
            .as_deref()
            .filter(|c| !c.is_empty())
            .or_else(|| self.capability_tags.first().map(String::as_str))
            .unwrap_or("other")
    }
}

/// Envelope returned by `GET /catalog`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogPage {
    #[serde(default, deserialize_with = "nullable")]
    pub services: Vec<ServiceRecord>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total: Option<u64>,
}

/// Optional query parameters forwarded to `GET /catalog`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_quality: Option<QualityTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl CatalogQuery {
    pub fn is_empty(&self) -> bool {
        *self == CatalogQuery::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryCriteria {
    pub capability: Option<String>,
    /// Inclusive ceiling.
    pub max_price_usd: f64,
    /// Inclusive floor by rank.
    pub min_quality: QualityTier,
    pub query: Option<String>,
}

impl Default for QueryCriteria {
    fn default() -> Self {
        Self {
            capability: None,
            max_price_usd: DEFAULT_MAX_PRICE_USD,
            min_quality: QualityTier::Unverified,
            query: None,
        }
    }
}

impl QueryCriteria {
    /// 小寫化的查詢字串，空白查詢視為沒有查詢
    pub fn normalized_query(&self) -> Option<String> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    pub fn normalized_capability(&self) -> Option<&str> {
        self.capability
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredService {
    pub record: ServiceRecord,
    pub score: u32,
}

/// At most [`MAX_RESULTS`] entries, ordered by score descending then
/// quality rank ascending, catalog order breaking any remaining ties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedResult {
    pub entries: Vec<ScoredService>,
    /// Number of records that survived filtering before truncation.
    pub total_matches: usize,
}

impl RankedResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredService> {
        self.entries.iter()
    }

    pub fn top(&self) -> Option<&ServiceRecord> {
        self.entries.first().map(|e| &e.record)
    }
}

/// Catalog snapshot grouped for browsing, groups sorted by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogOverview {
    pub groups: Vec<(String, Vec<ServiceRecord>)>,
    pub total_services: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    #[serde(default, deserialize_with = "nullable")]
    pub service_id: String,
    #[serde(default = "unknown_status", deserialize_with = "status_or_unknown")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub latency_ms: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub uptime_pct: Option<f64>,
    #[serde(default)]
    pub checked_at: Option<String>,
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

/// Raw, unvalidated registration input as received from the tool caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationSubmission {
    pub name: Option<String>,
    pub endpoint_url: Option<String>,
    pub description: Option<String>,
    pub price_per_call: Option<f64>,
    /// Comma-delimited capability tags, e.g. `"research, summarization"`.
    pub capability_tags: Option<String>,
    pub category: Option<String>,
    pub wallet_address: Option<String>,
    pub network: Option<String>,
    pub auth_required: Option<bool>,
    pub agent_callable: Option<bool>,
}

/// Body of `POST /register`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationPayload {
    pub name: String,
    pub endpoint_url: String,
    pub description: String,
    pub price_per_call: f64,
    pub capability_tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    pub network: String,
    pub auth_required: bool,
    pub agent_callable: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegistrationReceipt {
    #[serde(default = "unknown_status", deserialize_with = "status_or_unknown")]
    pub service_id: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `GET /v1/attest/{service_id}`: the compact token plus
/// whatever top-level metadata the backend attached to it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AttestationEnvelope {
    #[serde(default, alias = "attestation", alias = "jwt", deserialize_with = "nullable")]
    pub token: String,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub issued_at: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualityMeasurements {
    pub health_status: String,
    pub uptime_pct: f64,
    pub avg_latency_ms: f64,
    pub successful_checks: u64,
    pub total_checks: u64,
    pub last_checked: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FacilitatorCompatibility {
    pub compatible: bool,
    pub count: u64,
    pub recommended: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VerificationOutcome {
    Ok,
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainVerification {
    pub provider: String,
    pub outcome: VerificationOutcome,
}

/// Authenticity of a decoded token. Decoding never establishes it: the
/// signature must be checked separately against the backend's JWKS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureStatus {
    #[default]
    Unverified,
}

/// What an attestation token claims. Built only by decoding, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct AttestationReport {
    pub service_id: String,
    pub quality: QualityMeasurements,
    pub facilitator: FacilitatorCompatibility,
    pub chain_verifications: Vec<ChainVerification>,
    /// Unix seconds, 0 when absent.
    pub issued_at: i64,
    /// Unix seconds, 0 when absent. Advisory only.
    pub expires_at: i64,
    pub signature: SignatureStatus,
    pub raw_token: String,
}

impl AttestationReport {
    /// Advisory check; an absent expiry never counts as expired.
    pub fn is_expired_at(&self, now_unix: i64) -> bool {
        self.expires_at > 0 && now_unix >= self.expires_at
    }
}

/// Fallback when the token payload cannot be decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedAttestation {
    pub raw_token: String,
    pub service_id: Option<String>,
    pub issued_at: Option<i64>,
    pub expires_at: Option<i64>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttestationOutcome {
    Decoded(AttestationReport),
    Reduced(ReducedAttestation),
    Raw { service_id: String, token: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_tier_rank_and_floor() {
        assert!(QualityTier::Gold.meets(QualityTier::Silver));
        assert!(QualityTier::Silver.meets(QualityTier::Silver));
        assert!(!QualityTier::Bronze.meets(QualityTier::Silver));
        assert!(QualityTier::Unverified.meets(QualityTier::Unverified));
        let ranks: Vec<u8> = QualityTier::ALL.iter().map(|t| t.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_quality_tier_parsing() {
        assert_eq!("GOLD".parse::<QualityTier>().unwrap(), QualityTier::Gold);
        assert!("platinum".parse::<QualityTier>().is_err());
        assert_eq!(QualityTier::parse_lenient("platinum"), QualityTier::Unverified);
    }

    #[test]
    fn test_service_record_defaults_for_sparse_json() {
        let record: ServiceRecord = serde_json::from_value(serde_json::json!({
            "service_id": "acme/weather",
            "name": "WeatherX",
            "url": "https://weather.example.com",
            "description": null,
            "quality_tier": null
        }))
        .unwrap();

        assert_eq!(record.endpoint_url, "https://weather.example.com");
        assert_eq!(record.description, "");
        assert_eq!(record.quality_tier, QualityTier::Unverified);
        assert_eq!(record.health_status, "unknown");
        assert!(record.capability_tags.is_empty());
        assert_eq!(record.effective_price(), MISSING_PRICE_SENTINEL);
        assert_eq!(record.group_key(), "other");
    }

    #[test]
    fn test_catalog_page_survives_one_badly_typed_record() {
        let page: CatalogPage = serde_json::from_value(serde_json::json!({
            "services": [
                {
                    "service_id": "acme/weather",
                    "price_per_call": 0.01,
                    "quality_tier": "gold"
                },
                {
                    "service_id": "acme/quotes",
                    "price_per_call": "0.02",
                    "uptime_pct": "n/a",
                    "avg_latency_ms": {"p50": 12},
                    "quality_tier": 3,
                    "health_status": false,
                    "capability_tags": ["data", 7, null],
                    "category": ["data"]
                }
            ],
            "total": "2"
        }))
        .unwrap();

        assert_eq!(page.services.len(), 2);
        assert_eq!(page.total, Some(2));
        let quotes = &page.services[1];
        assert_eq!(quotes.price_per_call, Some(0.02));
        assert_eq!(quotes.uptime_pct, None);
        assert_eq!(quotes.avg_latency_ms, None);
        assert_eq!(quotes.quality_tier, QualityTier::Unverified);
        assert_eq!(quotes.health_status, "false");
        assert_eq!(quotes.capability_tags, vec!["data".to_string()]);
        assert_eq!(quotes.category, None);
    }

    #[test]
    fn test_group_key_prefers_category_then_first_tag() {
        let mut record: ServiceRecord = serde_json::from_value(serde_json::json!({
            "capability_tags": ["translation", "text"]
        }))
        .unwrap();
        assert_eq!(record.group_key(), "translation");

        record.category = Some("data".to_string());
        assert_eq!(record.group_key(), "data");
    }

    #[test]
    fn test_catalog_query_serializes_only_present_params() {
        let query = CatalogQuery {
            category: Some("research".to_string()),
            min_quality: Some(QualityTier::Silver),
            ..Default::default()
        };
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"min_quality": "silver", "category": "research"})
        );
        assert!(CatalogQuery::default().is_empty());
    }

    #[test]
    fn test_normalized_query_treats_blank_as_absent() {
        let criteria = QueryCriteria {
            query: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(criteria.normalized_query(), None);

        let criteria = QueryCriteria {
            query: Some(" Weather ".to_string()),
            ..Default::default()
        };
        assert_eq!(criteria.normalized_query().as_deref(), Some("weather"));
        assert_eq!(criteria.max_price_usd, DEFAULT_MAX_PRICE_USD);
    }
}
