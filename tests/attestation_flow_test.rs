use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use httpmock::prelude::*;
use x402_discovery::domain::model::{AttestationOutcome, SignatureStatus};
use x402_discovery::{DiscoveryConfig, DiscoveryError, DiscoveryService, DiscoveryTools, HttpBackend};

fn tools_for(server: &MockServer) -> DiscoveryTools<HttpBackend> {
    let config = DiscoveryConfig::new(server.base_url());
    let backend = HttpBackend::new(config.clone()).unwrap();
    DiscoveryTools::new(DiscoveryService::new(backend, config))
}

fn signed_token(claims: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"ES256","kid":"discovery-1"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
    format!("{}.{}.ZmFrZS1zaWduYXR1cmU", header, payload)
}

#[tokio::test]
async fn test_attest_decodes_envelope() {
    let server = MockServer::start();
    let token = signed_token(serde_json::json!({
        "service_id": "acme/weather-x",
        "iat": 4_102_444_800i64,
        "exp": 4_102_531_200i64,
        "quality": {"health_status": "up", "uptime_pct": 99.9, "successful_checks": 288, "total_checks": 288},
        "facilitator_compatibility": {"compatible": true, "count": 2, "recommended": "coinbase"},
        "chain_verifications": [{"provider": "base-mainnet", "error": null}]
    }));
    server.mock(|when, then| {
        when.method(GET).path("/v1/attest/acme/weather-x");
        then.status(200).json_body(serde_json::json!({
            "attestation": token,
            "service_id": "acme/weather-x",
            "jwks_url": server.url("/jwks")
        }));
    });

    let tools = tools_for(&server);

    match tools.service().attest("acme/weather-x", false).await.unwrap() {
        AttestationOutcome::Decoded(report) => {
            assert_eq!(report.service_id, "acme/weather-x");
            assert_eq!(report.quality.total_checks, 288);
            assert_eq!(report.facilitator.recommended, "coinbase");
            assert_eq!(report.chain_verifications.len(), 1);
            assert_eq!(report.signature, SignatureStatus::Unverified);
        }
        other => panic!("expected decoded report, got {:?}", other),
    }

    let text = tools.attest("acme/weather-x", false).await;
    assert!(text.contains("signature NOT verified"));
    assert!(text.contains(&server.url("/jwks")));
    assert!(text.contains("✓ base-mainnet"));
    assert!(!text.contains("EXPIRED"));
}

#[tokio::test]
async fn test_attest_raw_returns_token_verbatim() {
    let server = MockServer::start();
    let token = signed_token(serde_json::json!({"service_id": "acme/weather-x"}));
    server.mock(|when, then| {
        when.method(GET).path("/v1/attest/acme/weather-x");
        then.status(200).body(token.clone());
    });

    let tools = tools_for(&server);
    let text = tools.attest("acme/weather-x", true).await;

    assert!(text.contains(&token));
    assert!(text.contains(&server.url("/jwks")));
}

/// payload 壞掉時仍回傳含原始 token 的精簡報告
#[tokio::test]
async fn test_attest_malformed_payload_falls_back() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1/attest/acme/weather-x");
        then.status(200).json_body(serde_json::json!({
            "token": "eyJhbGciOiJFUzI1NiJ9.not-json-at-all.c2ln",
            "service_id": "acme/weather-x",
            "issued_at": 1_700_000_000,
            "expires_at": 1_700_086_400
        }));
    });

    let tools = tools_for(&server);
    let text = tools.attest("acme/weather-x", false).await;

    assert!(text.contains("could not decode details"));
    assert!(text.contains("Token: eyJhbGciOiJFUzI1NiJ9.not-json-at-all.c2ln"));
    assert!(text.contains("Expires: 2023-11-15"));
}

#[tokio::test]
async fn test_attest_not_found_and_signing_unavailable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1/attest/ghost/service");
        then.status(404);
    });
    server.mock(|when, then| {
        when.method(GET).path("/v1/attest/acme/weather-x");
        then.status(503)
            .json_body(serde_json::json!({"detail": "signing key not configured"}));
    });

    let tools = tools_for(&server);

    assert!(matches!(
        tools.service().attest("ghost/service", false).await,
        Err(DiscoveryError::NotFound { .. })
    ));
    match tools.service().attest("acme/weather-x", false).await {
        Err(DiscoveryError::SigningNotConfigured { detail, .. }) => {
            assert_eq!(detail.as_deref(), Some("signing key not configured"));
        }
        other => panic!("expected signing error, got {:?}", other),
    }

    let missing = tools.attest("ghost/service", false).await;
    assert!(missing.starts_with("Attestation failed"));
    assert!(missing.contains("not found"));

    let unsigned = tools.attest("acme/weather-x", false).await;
    assert!(unsigned.contains("signing is not configured"));
    assert!(unsigned.contains("signing key not configured"));
}
