//! Domain canonicalisation and the tiered safety screen.
//!
//! Verdicts come from the cache first (`safe_domains:{canonical}`), then
//! from the Safe Browsing API with a hard timeout. A match condemns the
//! whole domain: its row flips insecure and its URLs are deleted. Network
//! failure is treated as unsafe and never cached.

use crate::state::AppState;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use zar_core::constants::SAFE_CACHE_TTL_SECS;
use zar_core::{ServiceError, ServiceResult};
use zar_cache::client::SAFE_DOMAINS_PREFIX;
use zar_db::domains::{self, Domain};

/// Reduce a URL to its canonical `{scheme}://{host}/` form.
pub fn canonical_domain(raw: &str) -> ServiceResult<String> {
    let parsed = url::Url::parse(raw)
        .map_err(|_| ServiceError::invalid_input(format!("Invalid URL: {raw}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ServiceError::invalid_input(format!(
            "Unsupported URL scheme: {}",
            parsed.scheme()
        )));
    }
    let host = parsed
        .host_str()
        .ok_or_else(|| ServiceError::invalid_input(format!("URL has no host: {raw}")))?;
    Ok(format!("{}://{}/", parsed.scheme(), host))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThreatInfo<'a> {
    threat_types: [&'static str; 4],
    platform_types: [&'static str; 1],
    threat_entry_types: [&'static str; 1],
    threat_entries: [ThreatEntry<'a>; 1],
}

#[derive(Serialize)]
struct ThreatEntry<'a> {
    url: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    client: ClientInfo,
    threat_info: ThreatInfo<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientInfo {
    client_id: &'static str,
    client_version: &'static str,
}

#[derive(Deserialize, Default)]
struct LookupResponse {
    #[serde(default)]
    matches: Vec<serde_json::Value>,
}

/// One Safe Browsing lookup. `Ok(true)` means the domain is clean.
pub async fn query_threat_api(
    http: &reqwest::Client,
    endpoint: &str,
    api_key: &str,
    domain_url: &str,
    timeout: Duration,
) -> Result<bool, reqwest::Error> {
    let body = LookupRequest {
        client: ClientInfo {
            client_id: "zar-url-shortener",
            client_version: "1.0",
        },
        threat_info: ThreatInfo {
            threat_types: [
                "MALWARE",
                "SOCIAL_ENGINEERING",
                "UNWANTED_SOFTWARE",
                "POTENTIALLY_HARMFUL_APPLICATION",
            ],
            platform_types: ["ANY_PLATFORM"],
            threat_entry_types: ["URL"],
            threat_entries: [ThreatEntry { url: domain_url }],
        },
    };

    let response = http
        .post(format!("{endpoint}?key={api_key}"))
        .timeout(timeout)
        .json(&body)
        .send()
        .await?
        .error_for_status()?;

    let verdict: LookupResponse = response.json().await?;
    Ok(verdict.matches.is_empty())
}

/// The tiered safety screen for an already-upserted domain.
pub async fn ensure_safe(state: &AppState, domain: &Domain) -> ServiceResult<bool> {
    let cache_key = format!("{SAFE_DOMAINS_PREFIX}{}", domain.url);

    match state.cache().get(&cache_key).await {
        Ok(Some(verdict)) => return Ok(verdict == "safe"),
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(error = %err, "safety verdict cache unavailable");
        }
    }

    let config = &state.config().safe_browsing;
    let Some(api_key) = config.api_key.as_deref() else {
        // No key configured: screening is disabled (development only).
        tracing::debug!(domain = %domain.url, "safe browsing key absent, skipping screen");
        return Ok(true);
    };

    match query_threat_api(
        state.http(),
        &config.endpoint,
        api_key,
        &domain.url,
        Duration::from_secs(config.timeout_secs),
    )
    .await
    {
        Ok(true) => {
            if let Err(err) = state
                .cache()
                .set_ex(&cache_key, "safe", SAFE_CACHE_TTL_SECS)
                .await
            {
                tracing::warn!(error = %err, "failed to cache safe verdict");
            }
            Ok(true)
        }
        Ok(false) => {
            if let Err(err) = state
                .cache()
                .set_ex(&cache_key, "unsafe", SAFE_CACHE_TTL_SECS)
                .await
            {
                tracing::warn!(error = %err, "failed to cache unsafe verdict");
            }
            let deleted = domains::mark_insecure(state.db(), domain.id).await?;
            tracing::warn!(
                domain = %domain.url,
                urls_deleted = deleted,
                "threat intel flagged domain"
            );
            Ok(false)
        }
        Err(err) => {
            // Fail closed, and do not cache: the next attempt retries.
            tracing::error!(error = %err, domain = %domain.url, "safe browsing lookup failed");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn canonicalisation_reduces_to_scheme_host() {
        assert_eq!(
            canonical_domain("https://example.com/some/path?q=1").unwrap(),
            "https://example.com/"
        );
        assert_eq!(
            canonical_domain("http://sub.example.org").unwrap(),
            "http://sub.example.org/"
        );
    }

    #[test]
    fn inputs_without_scheme_or_host_are_rejected() {
        assert!(canonical_domain("example.com/path").is_err());
        assert!(canonical_domain("ftp://example.com/").is_err());
        assert!(canonical_domain("https:///nohost").is_err());
    }

    #[tokio::test]
    async fn clean_domain_returns_safe() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v4/threatMatches:find"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let safe = query_threat_api(
            &reqwest::Client::new(),
            &format!("{}/v4/threatMatches:find", server.uri()),
            "test-key",
            "https://example.com/",
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert!(safe);
    }

    #[tokio::test]
    async fn flagged_domain_returns_unsafe() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v4/threatMatches:find"))
            .and(body_partial_json(serde_json::json!({
                "threatInfo": { "threatEntries": [{ "url": "https://bad.test/" }] }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "matches": [{ "threatType": "MALWARE" }]
            })))
            .mount(&server)
            .await;

        let safe = query_threat_api(
            &reqwest::Client::new(),
            &format!("{}/v4/threatMatches:find", server.uri()),
            "test-key",
            "https://bad.test/",
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert!(!safe);
    }

    #[tokio::test]
    async fn upstream_error_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = query_threat_api(
            &reqwest::Client::new(),
            &server.uri(),
            "test-key",
            "https://example.com/",
            Duration::from_secs(5),
        )
        .await;
        assert!(result.is_err());
    }
}
