//! `/api/run` proxy
//!
//! Forwards a Foundry payload to the requested endpoint with the server-side
//! API key, so the key never reaches the caller. Only endpoints that pass
//! [`validate_endpoint`] are contacted.

use axum::http::StatusCode;
use serde_json::{json, Value};
use url::Url;

const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1", "[::1]"];

/// Check that the proxy may forward to `raw`.
///
/// Plain http is accepted only for loopback hosts. The host must match an
/// entry of `allowed_hosts`, either exactly or through a `*.suffix` wildcard;
/// an empty list rejects every endpoint.
pub fn validate_endpoint(raw: &str, allowed_hosts: &[String]) -> Result<Url, String> {
    let parsed = Url::parse(raw.trim()).map_err(|e| format!("Invalid endpoint URL: {}", e))?;
    let host = parsed.host_str().unwrap_or("").to_ascii_lowercase();

    match parsed.scheme() {
        "https" => {}
        "http" if LOOPBACK_HOSTS.contains(&host.as_str()) => {}
        "http" => return Err("HTTP is only allowed for localhost. Use HTTPS for remote endpoints.".to_string()),
        other => return Err(format!("Unsupported URL scheme \"{}://\"", other)),
    }

    if !allowed_hosts.iter().any(|pattern| host_matches(pattern, &host)) {
        return Err(format!("Endpoint host '{}' is not in proxy.allowed_hosts", host));
    }

    Ok(parsed)
}

fn host_matches(pattern: &str, host: &str) -> bool {
    let pattern = pattern.trim().to_ascii_lowercase();
    match pattern.strip_prefix("*.") {
        Some(suffix) => host.len() > suffix.len() && host.ends_with(&format!(".{}", suffix)),
        None => pattern == host,
    }
}

/// Forward `{endpoint, payload}` and mirror the upstream answer.
pub async fn proxy_inner(
    client: &reqwest::Client,
    api_key: Option<&str>,
    allowed_hosts: &[String],
    body: Value,
) -> (StatusCode, Value) {
    let endpoint = body.get("endpoint").and_then(Value::as_str).filter(|e| !e.trim().is_empty());
    let payload = body.get("payload").filter(|p| !p.is_null());

    let (Some(endpoint), Some(payload)) = (endpoint, payload) else {
        return (
            StatusCode::BAD_REQUEST,
            json!({ "error": "Missing endpoint or payload in request body" }),
        );
    };

    let url = match validate_endpoint(endpoint, allowed_hosts) {
        Ok(u) => u,
        Err(e) => {
            tracing::warn!(endpoint, error = %e, "Proxy endpoint rejected");
            return (StatusCode::FORBIDDEN, json!({ "error": e }));
        }
    };

    let Some(api_key) = api_key.filter(|k| !k.trim().is_empty()) else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({
                "error": "FOUNDRY_API_KEY not configured on server",
                "recommendation": "Set FOUNDRY_API_KEY environment variable on your backend server",
            }),
        );
    };

    let result = client
        .post(url)
        .header("api-key", api_key)
        .header("Ocp-Apim-Subscription-Key", api_key)
        .json(payload)
        .send()
        .await;

    let response = match result {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, "Proxy error");
            return proxy_error(e.to_string());
        }
    };

    let upstream = response.status();
    let text = match response.text().await {
        Ok(t) => t,
        Err(e) => return proxy_error(e.to_string()),
    };
    let data = serde_json::from_str::<Value>(&text);

    if !upstream.is_success() {
        let status = StatusCode::from_u16(upstream.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        tracing::error!(status = upstream.as_u16(), "Foundry error");
        return (
            status,
            json!({
                "error": data.unwrap_or(Value::String(text)),
                "message": format!("Foundry returned status {}", upstream.as_u16()),
            }),
        );
    }

    match data {
        Ok(v) => (StatusCode::OK, v),
        Err(e) => proxy_error(format!("Invalid JSON from Foundry: {}", e)),
    }
}

fn proxy_error(message: String) -> (StatusCode, Value) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": message, "type": "proxy_error" }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn loopback() -> Vec<String> {
        vec!["127.0.0.1".to_string()]
    }

    // ========================================================================
    // TEST 1: endpoint validation
    // ========================================================================
    #[test]
    fn test_validate_endpoint_rules() {
        let local = vec!["127.0.0.1".to_string(), "localhost".to_string(), "example.com".to_string()];
        assert!(validate_endpoint("http://127.0.0.1:9000/run", &local).is_ok());
        assert!(validate_endpoint("http://localhost/run", &local).is_ok());
        assert!(validate_endpoint("http://example.com/run", &local).is_err());
        assert!(validate_endpoint("ftp://example.com/run", &local).is_err());
        assert!(validate_endpoint("not a url", &local).is_err());

        let allowed = vec!["*.services.ai.azure.com".to_string(), "api.example.com".to_string()];
        assert!(validate_endpoint("https://tenerife.services.ai.azure.com/x", &allowed).is_ok());
        assert!(validate_endpoint("https://API.example.com/x", &allowed).is_ok());
        assert!(validate_endpoint("https://services.ai.azure.com/x", &allowed).is_err());
        assert!(validate_endpoint("https://evil.com/x", &allowed).is_err());
    }

    // ========================================================================
    // TEST 2: an empty allowlist rejects every host
    // ========================================================================
    #[test]
    fn test_empty_allowlist_fails_closed() {
        assert!(validate_endpoint("https://x.services.ai.azure.com/run", &[]).is_err());
        assert!(validate_endpoint("https://attacker.example/collect", &[]).is_err());
        assert!(validate_endpoint("http://127.0.0.1:9000/run", &[]).is_err());
    }

    // ========================================================================
    // TEST 3: request validation
    // ========================================================================
    #[tokio::test]
    async fn test_missing_fields_and_key() {
        let client = reqwest::Client::new();
        let azure = vec!["*.services.ai.azure.com".to_string()];

        let (status, body) = proxy_inner(&client, Some("k"), &azure, json!({ "endpoint": "https://x/run" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing endpoint or payload in request body");

        let (status, _) = proxy_inner(&client, Some("k"), &azure, json!({ "payload": {} })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = proxy_inner(
            &client,
            Some("k"),
            &azure,
            json!({ "endpoint": "http://evil.com/run", "payload": {} }),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = proxy_inner(
            &client,
            None,
            &azure,
            json!({ "endpoint": "https://x.services.ai.azure.com/run", "payload": {} }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "FOUNDRY_API_KEY not configured on server");
        assert!(body["recommendation"].is_string());
    }

    // ========================================================================
    // TEST 4: forwards payload with both key headers
    // ========================================================================
    #[tokio::test]
    async fn test_forwards_with_key_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("api-key", "server-key"))
            .and(header("Ocp-Apim-Subscription-Key", "server-key"))
            .and(body_json(json!({ "messages": [{ "role": "user", "content": "hola" }] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "summary": "ok" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let (status, body) = proxy_inner(
            &client,
            Some("server-key"),
            &loopback(),
            json!({
                "endpoint": format!("{}/run", server.uri()),
                "payload": { "messages": [{ "role": "user", "content": "hola" }] }
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"], "ok");
    }

    // ========================================================================
    // TEST 5: a host outside the allowlist never sees the key
    // ========================================================================
    #[tokio::test]
    async fn test_rejected_host_receives_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "got": "key" })))
            .expect(0)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let (status, body) = proxy_inner(
            &client,
            Some("server-secret"),
            &["x.services.ai.azure.com".to_string()],
            json!({ "endpoint": format!("{}/collect", server.uri()), "payload": {} }),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].as_str().unwrap().contains("not in proxy.allowed_hosts"));
    }

    // ========================================================================
    // TEST 6: upstream errors are mirrored
    // ========================================================================
    #[tokio::test]
    async fn test_upstream_error_status_mirrored() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({ "code": "throttled" })))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let (status, body) = proxy_inner(
            &client,
            Some("k"),
            &loopback(),
            json!({ "endpoint": server.uri(), "payload": {} }),
        )
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], "throttled");
        assert_eq!(body["message"], "Foundry returned status 429");
    }

    // ========================================================================
    // TEST 7: transport failure is a proxy_error
    // ========================================================================
    #[tokio::test]
    async fn test_unreachable_upstream_is_proxy_error() {
        let client = reqwest::Client::new();
        let (status, body) = proxy_inner(
            &client,
            Some("k"),
            &loopback(),
            json!({ "endpoint": "http://127.0.0.1:1/run", "payload": {} }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["type"], "proxy_error");
    }
}
