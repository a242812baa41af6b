//! Text rendering of structured outcomes. Nothing here decides anything;
//! it only presents what the core already computed.

use crate::config::DiscoveryConfig;
use crate::domain::model::{
    AttestationOutcome, AttestationReport, CatalogOverview, HealthReport, QueryCriteria,
    RankedResult, ReducedAttestation, RegistrationPayload, RegistrationReceipt, ServiceRecord,
    VerificationOutcome,
};
use crate::utils::error::DiscoveryError;
use chrono::DateTime;

fn opt_num(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "?".to_string())
}

fn price(record: &ServiceRecord) -> String {
    opt_num(record.price_per_call)
}

fn unix_time(secs: i64) -> String {
    if secs <= 0 {
        return "unknown".to_string();
    }
    DateTime::from_timestamp(secs, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| secs.to_string())
}

pub fn service_block(record: &ServiceRecord, position: usize) -> String {
    let name = if record.name.is_empty() { "Unknown" } else { record.name.as_str() };
    let mut block = format!(
        "{}. **{}** [{}]\n   ID: {}\n   URL: {}\n   Price: ${}/call  |  Uptime: {}%\n   Tags: {}\n   {}",
        position,
        name,
        record.quality_tier.as_str().to_uppercase(),
        record.service_id,
        record.endpoint_url,
        price(record),
        opt_num(record.uptime_pct),
        record.capability_tags.join(", "),
        record.description
    );
    if let Some(snippet) = record.sdk_snippet.as_deref().filter(|s| !s.is_empty()) {
        block.push_str(&format!("\n   Example:\n   {}", snippet.replace('\n', "\n   ")));
    }
    block
}

pub fn ranked(result: &RankedResult, criteria: &QueryCriteria, config: &DiscoveryConfig) -> String {
    let Some(top) = result.top() else {
        return no_matches(criteria, config);
    };

    let mut lines = vec![format!(
        "Found {} matching services (showing top {}):\n",
        result.total_matches,
        result.len()
    )];
    for (i, entry) in result.iter().enumerate() {
        lines.push(service_block(&entry.record, i + 1));
        lines.push(String::new());
    }
    lines.push(format!(
        "To call any of these services, send an HTTP request to the listed URL. \
         Each service uses x402 micropayment: the first response will be HTTP 402 \
         with payment instructions (USDC on Base, ~${}/call).",
        price(top)
    ));
    lines.join("\n")
}

pub fn no_matches(criteria: &QueryCriteria, config: &DiscoveryConfig) -> String {
    format!(
        "No services found matching capability={:?}, max_price_usd={}, min_quality={}, query={:?}.\n\
         Try broadening your search, use the browse tool, or visit {} for the full listing.",
        criteria.capability,
        criteria.max_price_usd,
        criteria.min_quality,
        criteria.query,
        config.catalog_url()
    )
}

pub fn overview(overview: &CatalogOverview, category: Option<&str>, config: &DiscoveryConfig) -> String {
    if overview.total_services == 0 {
        return match category {
            Some(cat) => format!(
                "No services indexed under category '{}'. Browse without a category or visit {}.",
                cat,
                config.catalog_url()
            ),
            None => format!("No services indexed yet. Visit {} for status.", config.base_url),
        };
    }

    let mut lines = vec![format!(
        "x402 Service Catalog: {} services across {} categories\n",
        overview.total_services,
        overview.groups.len()
    )];
    for (group, services) in &overview.groups {
        lines.push(format!("## {} ({} services)", group.to_uppercase(), services.len()));
        for s in services {
            lines.push(format!(
                "  • {} [{}] - ${}/call - {}",
                if s.name.is_empty() { "?" } else { s.name.as_str() },
                s.quality_tier,
                price(s),
                s.service_id
            ));
        }
        lines.push(String::new());
    }
    lines.push(format!("Full catalog: {}", config.catalog_url()));
    lines.join("\n")
}

pub fn health(report: &HealthReport) -> String {
    let glyph = match report.status.as_str() {
        "up" => "✓",
        "degraded" => "⚠",
        "down" => "✗",
        _ => "?",
    };

    format!(
        "{} {}: {}\nLatency: {}ms\nUptime: {}%\nLast checked: {}\nEndpoint: {}",
        glyph,
        report.service_id,
        report.status.to_uppercase(),
        opt_num(report.latency_ms),
        opt_num(report.uptime_pct),
        report.checked_at.as_deref().unwrap_or("unknown"),
        report.endpoint_url.as_deref().unwrap_or("unknown")
    )
}

pub fn registration(
    payload: &RegistrationPayload,
    receipt: &RegistrationReceipt,
    config: &DiscoveryConfig,
) -> String {
    let mut text = format!(
        "Service registered successfully!\nService ID: {}\nName: {}\nURL: {}\nPrice: ${}/call\nTags: {}\n",
        receipt.service_id,
        payload.name,
        payload.endpoint_url,
        payload.price_per_call,
        payload.capability_tags.join(", ")
    );
    if let Some(category) = &payload.category {
        text.push_str(&format!("Category: {}\n", category));
    }
    text.push_str(&format!("Network: {}\n", payload.network));
    if let Some(message) = &receipt.message {
        text.push_str(&format!("{}\n", message));
    }
    text.push_str(&format!(
        "\nYour service will be health-checked within 5 minutes. View at: {}",
        config.catalog_url()
    ));
    text
}

pub fn attestation(outcome: &AttestationOutcome, config: &DiscoveryConfig, now_unix: i64) -> String {
    match outcome {
        AttestationOutcome::Decoded(report) => decoded_report(report, config, now_unix),
        AttestationOutcome::Reduced(reduced) => reduced_report(reduced, config),
        AttestationOutcome::Raw { service_id, token } => format!(
            "Attestation token for {}:\n{}\n\nVerify the signature against {} before trusting it.",
            service_id,
            token,
            config.jwks_url()
        ),
    }
}

fn decoded_report(report: &AttestationReport, config: &DiscoveryConfig, now_unix: i64) -> String {
    let q = &report.quality;
    let f = &report.facilitator;
    let mut lines = vec![
        format!("Attestation for {} (signature NOT verified)", report.service_id),
        format!(
            "Quality: {} | uptime {}% | avg latency {}ms | {}/{} checks passed | last checked {}",
            q.health_status,
            q.uptime_pct,
            q.avg_latency_ms,
            q.successful_checks,
            q.total_checks,
            q.last_checked
        ),
        format!(
            "Facilitators: {} ({} compatible, recommended: {})",
            if f.compatible { "compatible" } else { "not compatible" },
            f.count,
            f.recommended
        ),
    ];

    if !report.chain_verifications.is_empty() {
        lines.push("Chain verifications:".to_string());
        for v in &report.chain_verifications {
            match &v.outcome {
                VerificationOutcome::Ok => lines.push(format!("  ✓ {}", v.provider)),
                VerificationOutcome::Error(e) => lines.push(format!("  ✗ {}: {}", v.provider, e)),
            }
        }
    }

    lines.push(format!("Issued: {}", unix_time(report.issued_at)));
    let expiry_note = if report.is_expired_at(now_unix) { " (EXPIRED)" } else { "" };
    lines.push(format!("Expires: {}{}", unix_time(report.expires_at), expiry_note));
    lines.push(format!(
        "Authenticity: verify the token signature against {} before relying on these claims.",
        config.jwks_url()
    ));
    lines.push(format!("Token: {}", report.raw_token));
    lines.join("\n")
}

fn reduced_report(reduced: &ReducedAttestation, config: &DiscoveryConfig) -> String {
    let mut lines = vec![format!(
        "Attestation for {} (could not decode details: {})",
        reduced.service_id.as_deref().unwrap_or("?"),
        reduced.reason
    )];
    if let Some(issued) = reduced.issued_at {
        lines.push(format!("Issued: {}", unix_time(issued)));
    }
    if let Some(expires) = reduced.expires_at {
        lines.push(format!("Expires: {}", unix_time(expires)));
    }
    lines.push(format!("Token: {}", reduced.raw_token));
    lines.push(format!("Verify against {} and inspect the token manually.", config.jwks_url()));
    lines.join("\n")
}

/// Short cause plus remediation, for any error reaching the tool boundary.
pub fn failure(operation: &str, err: &DiscoveryError, config: &DiscoveryConfig) -> String {
    let mut text = format!(
        "{} failed: {}\n{}",
        operation,
        err.user_friendly_message(),
        err.recovery_suggestion()
    );
    if matches!(err, DiscoveryError::Transport(_) | DiscoveryError::Backend { .. }) {
        text.push_str(&format!("\nCatalog: {}", config.catalog_url()));
    }
    text
}
