//! Unverified decoding of compact signed attestation tokens.
//!
//! [`decode`] answers "what does this token claim", never "is this token
//! genuine". Authenticity requires checking the signature against the key
//! set published at the backend's `/jwks` endpoint; that step is left to
//! the caller and every decoded report carries [`SignatureStatus::Unverified`].
//!
//! Expiry is reported, not enforced.

use crate::domain::model::{
    AttestationEnvelope, AttestationReport, ChainVerification, FacilitatorCompatibility,
    QualityMeasurements, ReducedAttestation, SignatureStatus, VerificationOutcome,
};
use crate::utils::error::{DiscoveryError, Result};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use serde_json::{Map, Value};

const UNKNOWN: &str = "?";

pub fn decode(token: &str) -> Result<AttestationReport> {
    let token = token.trim();
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(malformed(format!(
            "expected 3 dot-separated segments, found {}",
            segments.len()
        )));
    }

    let payload = decode_payload(segments[1])?;
    let claims = match payload {
        Value::Object(map) => map,
        other => {
            return Err(malformed(format!(
                "payload is JSON {} instead of an object",
                json_kind(&other)
            )))
        }
    };

    let empty = Map::new();
    let quality = object(&claims, "quality").unwrap_or(&empty);
    let facilitator = object(&claims, "facilitator_compatibility")
        .or_else(|| object(&claims, "facilitator"))
        .unwrap_or(&empty);

    let service_id = claims
        .get("service_id")
        .or_else(|| claims.get("sub"))
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN)
        .to_string();

    Ok(AttestationReport {
        service_id,
        quality: QualityMeasurements {
            health_status: string(quality, "health_status")
                .or_else(|| string(quality, "status"))
                .unwrap_or_else(|| UNKNOWN.to_string()),
            uptime_pct: float(quality, "uptime_pct"),
            avg_latency_ms: float(quality, "avg_latency_ms"),
            successful_checks: unsigned(quality, "successful_checks"),
            total_checks: unsigned(quality, "total_checks"),
            last_checked: string(quality, "last_checked").unwrap_or_else(|| UNKNOWN.to_string()),
        },
        facilitator: FacilitatorCompatibility {
            compatible: facilitator
                .get("compatible")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            count: unsigned(facilitator, "count"),
            recommended: string(facilitator, "recommended").unwrap_or_else(|| UNKNOWN.to_string()),
        },
        chain_verifications: chain_verifications(&claims),
        issued_at: claims.get("iat").and_then(Value::as_i64).unwrap_or(0),
        expires_at: claims.get("exp").and_then(Value::as_i64).unwrap_or(0),
        signature: SignatureStatus::Unverified,
        raw_token: token.to_string(),
    })
}

/// Reduced-information report used when the rich breakdown cannot be decoded.
pub fn reduce(envelope: &AttestationEnvelope, err: &DiscoveryError) -> ReducedAttestation {
    ReducedAttestation {
        raw_token: envelope.token.clone(),
        service_id: envelope.service_id.clone(),
        issued_at: envelope.issued_at,
        expires_at: envelope.expires_at,
        reason: err.to_string(),
    }
}

fn decode_payload(segment: &str) -> Result<Value> {
    // 補齊 '=' 到 4 的倍數再以 URL-safe base64 解碼
    let mut padded = segment.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }

    let bytes = URL_SAFE
        .decode(padded.as_bytes())
        .map_err(|e| malformed(format!("payload is not valid base64url: {}", e)))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| malformed(format!("payload is not valid JSON: {}", e)))
}

fn chain_verifications(claims: &Map<String, Value>) -> Vec<ChainVerification> {
    let Some(items) = claims.get("chain_verifications").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .map(|entry| {
            let provider = string(entry, "provider").unwrap_or_else(|| UNKNOWN.to_string());
            let outcome = match entry.get("error") {
                Some(Value::Null) | None => VerificationOutcome::Ok,
                Some(Value::String(msg)) => VerificationOutcome::Error(msg.clone()),
                Some(other) => VerificationOutcome::Error(other.to_string()),
            };
            ChainVerification { provider, outcome }
        })
        .collect()
}

fn object<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    map.get(key).and_then(Value::as_object)
}

fn string(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn float(map: &Map<String, Value>, key: &str) -> f64 {
    map.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn unsigned(map: &Map<String, Value>, key: &str) -> u64 {
    map.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn malformed(reason: String) -> DiscoveryError {
    DiscoveryError::MalformedToken { reason }
}
