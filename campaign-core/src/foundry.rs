//! Microsoft Foundry client
//!
//! One POST per call, either straight to the Foundry endpoint (with the API
//! key in `api-key` and `Ocp-Apim-Subscription-Key`) or through the
//! `/api/run` proxy, which holds the key server-side. Failures are classified
//! into a small taxonomy so callers can show a recommendation.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::FoundryConfig;
use crate::generator::{GenerationError, TextGenerator};
use crate::models::MessageRole;
use crate::output::response_text;
use crate::prompt::CampaignContext;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundryMessage {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundryContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_context: Option<CampaignContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_state: Option<UiState>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoundryPayload {
    pub messages: Vec<FoundryMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<FoundryContext>,
}

impl FoundryPayload {
    /// A payload carrying a single user message and no context.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            messages: vec![FoundryMessage {
                role: MessageRole::User,
                content: content.into(),
            }],
            context: None,
        }
    }
}

/// Body sent to the `/api/run` proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyRequest {
    pub endpoint: String,
    pub payload: FoundryPayload,
}

/// Foundry answer. Known keys are exposed through accessors; everything else
/// is kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FoundryResponse(pub Value);

impl FoundryResponse {
    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn summary(&self) -> Option<&str> {
        self.str_field("summary")
    }

    pub fn campaign_name(&self) -> Option<&str> {
        self.str_field("campaign_name")
    }

    pub fn campaign_plan(&self) -> Option<&Value> {
        self.0.get("campaignPlan")
    }

    pub fn cards(&self) -> Option<&Value> {
        self.0.get("cards")
    }

    pub fn channels(&self) -> Vec<&str> {
        self.0
            .get("channels")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// The response's text: a bare JSON string, or the first text-bearing key.
    pub fn text(&self) -> Option<&str> {
        match &self.0 {
            Value::String(s) if !s.trim().is_empty() => Some(s),
            Value::Object(map) => response_text(map),
            _ => None,
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

// ============================================================================
// Error types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoundryErrorKind {
    Network,
    Auth,
    /// Endpoint unreachable. Named after the browser failure it replaced.
    Cors,
    Parse,
    Unknown,
}

impl FoundryErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FoundryErrorKind::Network => "network",
            FoundryErrorKind::Auth => "auth",
            FoundryErrorKind::Cors => "cors",
            FoundryErrorKind::Parse => "parse",
            FoundryErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FoundryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoundryMode {
    Direct,
    Proxy,
}

impl FoundryMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FoundryMode::Direct => "direct",
            FoundryMode::Proxy => "proxy",
        }
    }
}

/// Classified Foundry failure.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{kind} error ({}): {message}", .mode.as_str())]
pub struct FoundryError {
    #[serde(rename = "type")]
    pub kind: FoundryErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    pub mode: FoundryMode,
}

impl FoundryError {
    pub fn new(kind: FoundryErrorKind, mode: FoundryMode, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            recommendation: None,
            mode,
        }
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }
}

const REC_PROXY_AUTH: &str = "Revisa que FOUNDRY_API_KEY esté configurado en el servidor backend. El proxy necesita la API key en el entorno del servidor.";
const REC_PROXY_MISSING: &str = "El backend proxy no está disponible. Configura foundry.use_proxy = false para modo directo, o levanta el servidor con el endpoint /api/run.";
const REC_PROXY_UNREACHABLE: &str = "Verifica que el servidor backend esté corriendo y que el endpoint /api/run esté disponible.";
const REC_DIRECT_BAD_KEY: &str = "La API key proporcionada no es válida o no tiene permisos. Verifica: 1) Que sea del recurso correcto (region), 2) Que esté activa en Azure, 3) Que el endpoint sea el correcto para tu recurso.";
const REC_DIRECT_NO_KEY: &str = "Activa el proxy /api/run o configura FOUNDRY_API_KEY en tus variables de entorno.";
const REC_DIRECT_UNREACHABLE: &str = "No se puede conectar con Foundry. Solución recomendada: activa foundry.use_proxy = true y usa el proxy backend /api/run.";

// ============================================================================
// FoundryClient
// ============================================================================

#[derive(Debug, Clone)]
pub struct FoundryClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    use_proxy: bool,
    proxy_endpoint: String,
}

impl FoundryClient {
    pub fn new(config: &FoundryConfig, api_key: Option<String>) -> Result<Self, FoundryError> {
        let mode = if config.use_proxy {
            FoundryMode::Proxy
        } else {
            FoundryMode::Direct
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| FoundryError::new(FoundryErrorKind::Unknown, mode, e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            use_proxy: config.use_proxy,
            proxy_endpoint: config.proxy_endpoint.clone(),
        })
    }

    pub fn mode(&self) -> FoundryMode {
        if self.use_proxy {
            FoundryMode::Proxy
        } else {
            FoundryMode::Direct
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send one payload and return the decoded response.
    pub async fn run(&self, payload: &FoundryPayload) -> Result<FoundryResponse, FoundryError> {
        let result = if self.use_proxy {
            self.run_via_proxy(payload).await
        } else {
            self.run_direct(payload).await
        };

        if let Err(e) = &result {
            tracing::error!(kind = %e.kind, mode = e.mode.as_str(), message = %e.message, "Foundry call failed");
        }
        result
    }

    async fn run_via_proxy(&self, payload: &FoundryPayload) -> Result<FoundryResponse, FoundryError> {
        let mode = FoundryMode::Proxy;
        let body = ProxyRequest {
            endpoint: self.endpoint.clone(),
            payload: payload.clone(),
        };

        tracing::debug!(proxy = %self.proxy_endpoint, "Calling Foundry via proxy");

        let response = self
            .client
            .post(&self.proxy_endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, mode))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FoundryError::new(
                    FoundryErrorKind::Auth,
                    mode,
                    format!("Authentication error via proxy ({}): {}", status.as_u16(), text),
                )
                .with_recommendation(REC_PROXY_AUTH),
                StatusCode::NOT_FOUND => {
                    FoundryError::new(FoundryErrorKind::Network, mode, "Proxy endpoint /api/run not found")
                        .with_recommendation(REC_PROXY_MISSING)
                }
                _ => FoundryError::new(
                    FoundryErrorKind::Network,
                    mode,
                    format!("Proxy error {}: {}", status.as_u16(), text),
                ),
            });
        }

        decode_body(response, mode).await
    }

    async fn run_direct(&self, payload: &FoundryPayload) -> Result<FoundryResponse, FoundryError> {
        let mode = FoundryMode::Direct;
        let mut request = self.client.post(&self.endpoint).json(payload);
        if let Some(key) = &self.api_key {
            request = request
                .header("api-key", key)
                .header("Ocp-Apim-Subscription-Key", key);
        }

        tracing::debug!(endpoint = %self.endpoint, has_key = self.api_key.is_some(), "Calling Foundry directly");

        let response = request.send().await.map_err(|e| transport_error(e, mode))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FoundryError::new(
                    FoundryErrorKind::Auth,
                    mode,
                    format!("Authentication error ({}): {}", status.as_u16(), text),
                )
                .with_recommendation(if self.api_key.is_some() {
                    REC_DIRECT_BAD_KEY
                } else {
                    REC_DIRECT_NO_KEY
                }),
                _ => FoundryError::new(
                    FoundryErrorKind::Network,
                    mode,
                    format!("HTTP {}: {}", status.as_u16(), text),
                ),
            });
        }

        decode_body(response, mode).await
    }
}

async fn decode_body(response: reqwest::Response, mode: FoundryMode) -> Result<FoundryResponse, FoundryError> {
    let text = response.text().await.map_err(|e| transport_error(e, mode))?;
    serde_json::from_str::<Value>(&text)
        .map(FoundryResponse)
        .map_err(|e| FoundryError::new(FoundryErrorKind::Parse, mode, format!("Invalid JSON response: {}", e)))
}

fn transport_error(e: reqwest::Error, mode: FoundryMode) -> FoundryError {
    if e.is_timeout() {
        return FoundryError::new(FoundryErrorKind::Network, mode, format!("Request timed out: {}", e));
    }
    if e.is_connect() {
        return match mode {
            FoundryMode::Proxy => FoundryError::new(FoundryErrorKind::Cors, mode, "No se puede conectar al proxy /api/run")
                .with_recommendation(REC_PROXY_UNREACHABLE),
            FoundryMode::Direct => {
                FoundryError::new(FoundryErrorKind::Cors, mode, "Cannot connect to Foundry endpoint")
                    .with_recommendation(REC_DIRECT_UNREACHABLE)
            }
        };
    }
    if e.is_decode() {
        return FoundryError::new(FoundryErrorKind::Parse, mode, e.to_string());
    }
    FoundryError::new(FoundryErrorKind::Unknown, mode, e.to_string())
}

#[async_trait]
impl TextGenerator for FoundryClient {
    async fn generate(&self, prompt: &str, _model: &str) -> Result<String, GenerationError> {
        let response = self.run(&FoundryPayload::user(prompt)).await?;

        let text = match response.text() {
            Some(t) => t.trim().to_string(),
            None => match response.as_value() {
                Value::Null => String::new(),
                v => v.to_string(),
            },
        };

        if text.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(text)
    }

    fn name(&self) -> &str {
        "foundry"
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn direct_config(endpoint: String) -> FoundryConfig {
        FoundryConfig {
            endpoint,
            use_proxy: false,
            proxy_endpoint: "http://127.0.0.1:1/api/run".to_string(),
            timeout_seconds: 5,
        }
    }

    fn proxy_config(endpoint: String, proxy_endpoint: String) -> FoundryConfig {
        FoundryConfig {
            endpoint,
            use_proxy: true,
            proxy_endpoint,
            timeout_seconds: 5,
        }
    }

    // ========================================================================
    // TEST 1: direct mode sends both key headers and returns JSON
    // ========================================================================
    #[tokio::test]
    async fn test_direct_sends_key_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/run"))
            .and(header("api-key", "secret"))
            .and(header("Ocp-Apim-Subscription-Key", "secret"))
            .and(body_partial_json(serde_json::json!({
                "messages": [{ "role": "user", "content": "hola" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "summary": "Plan listo",
                "campaign_name": "Q3",
                "channels": ["linkedin"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = FoundryClient::new(&direct_config(format!("{}/run", server.uri())), Some("secret".into())).unwrap();
        assert_eq!(client.mode(), FoundryMode::Direct);

        let response = client.run(&FoundryPayload::user("hola")).await.unwrap();
        assert_eq!(response.summary(), Some("Plan listo"));
        assert_eq!(response.campaign_name(), Some("Q3"));
        assert_eq!(response.channels(), vec!["linkedin"]);
    }

    // ========================================================================
    // TEST 2: auth failures carry a key-dependent recommendation
    // ========================================================================
    #[tokio::test]
    async fn test_direct_auth_error_recommendation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("denied"))
            .mount(&server)
            .await;

        let without_key = FoundryClient::new(&direct_config(server.uri()), None).unwrap();
        let err = without_key.run(&FoundryPayload::user("x")).await.unwrap_err();
        assert_eq!(err.kind, FoundryErrorKind::Auth);
        assert_eq!(err.mode, FoundryMode::Direct);
        assert_eq!(err.message, "Authentication error (401): denied");
        assert_eq!(err.recommendation.as_deref(), Some(REC_DIRECT_NO_KEY));

        let with_key = FoundryClient::new(&direct_config(server.uri()), Some("k".into())).unwrap();
        let err = with_key.run(&FoundryPayload::user("x")).await.unwrap_err();
        assert_eq!(err.recommendation.as_deref(), Some(REC_DIRECT_BAD_KEY));
    }

    // ========================================================================
    // TEST 3: proxy mode wraps the payload and never touches the endpoint
    // ========================================================================
    #[tokio::test]
    async fn test_proxy_never_contacts_raw_endpoint() {
        let foundry = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(0)
            .mount(&foundry)
            .await;

        let proxy = MockServer::start().await;
        let raw_endpoint = format!("{}/foundry", foundry.uri());
        Mock::given(method("POST"))
            .and(path("/api/run"))
            .and(body_partial_json(serde_json::json!({
                "endpoint": raw_endpoint,
                "payload": { "messages": [{ "role": "user", "content": "hola" }] }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "summary": "ok" })))
            .expect(1)
            .mount(&proxy)
            .await;

        let client = FoundryClient::new(
            &proxy_config(raw_endpoint.clone(), format!("{}/api/run", proxy.uri())),
            Some("ignored-in-proxy-mode".into()),
        )
        .unwrap();
        let response = client.run(&FoundryPayload::user("hola")).await.unwrap();
        assert_eq!(response.summary(), Some("ok"));
    }

    // ========================================================================
    // TEST 4: proxy status classification
    // ========================================================================
    #[tokio::test]
    async fn test_proxy_status_classification() {
        let proxy = MockServer::start().await;
        Mock::given(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&proxy)
            .await;
        Mock::given(path("/forbidden"))
            .respond_with(ResponseTemplate::new(403).set_body_string("no"))
            .mount(&proxy)
            .await;
        Mock::given(path("/broken"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&proxy)
            .await;

        let run = |route: &str| {
            let client = FoundryClient::new(
                &proxy_config("https://foundry.invalid/run".into(), format!("{}{}", proxy.uri(), route)),
                None,
            )
            .unwrap();
            async move { client.run(&FoundryPayload::user("x")).await.unwrap_err() }
        };

        let err = run("/missing").await;
        assert_eq!(err.kind, FoundryErrorKind::Network);
        assert_eq!(err.message, "Proxy endpoint /api/run not found");
        assert!(err.recommendation.is_some());

        let err = run("/forbidden").await;
        assert_eq!(err.kind, FoundryErrorKind::Auth);
        assert_eq!(err.mode, FoundryMode::Proxy);
        assert_eq!(err.recommendation.as_deref(), Some(REC_PROXY_AUTH));

        let err = run("/broken").await;
        assert_eq!(err.kind, FoundryErrorKind::Network);
        assert_eq!(err.message, "Proxy error 500: boom");
        assert!(err.recommendation.is_none());
    }

    // ========================================================================
    // TEST 5: undecodable body is a parse error
    // ========================================================================
    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let client = FoundryClient::new(&direct_config(server.uri()), None).unwrap();
        let err = client.run(&FoundryPayload::user("x")).await.unwrap_err();
        assert_eq!(err.kind, FoundryErrorKind::Parse);
    }

    // ========================================================================
    // TEST 6: unreachable endpoint is reported as cors
    // ========================================================================
    #[tokio::test]
    async fn test_connection_refused_is_cors() {
        let client = FoundryClient::new(&direct_config("http://127.0.0.1:1/run".into()), None).unwrap();
        let err = client.run(&FoundryPayload::user("x")).await.unwrap_err();
        assert_eq!(err.kind, FoundryErrorKind::Cors);
        assert_eq!(err.recommendation.as_deref(), Some(REC_DIRECT_UNREACHABLE));

        let proxied = FoundryClient::new(
            &proxy_config("https://foundry.invalid/run".into(), "http://127.0.0.1:1/api/run".into()),
            None,
        )
        .unwrap();
        let err = proxied.run(&FoundryPayload::user("x")).await.unwrap_err();
        assert_eq!(err.kind, FoundryErrorKind::Cors);
        assert_eq!(err.mode, FoundryMode::Proxy);
    }

    // ========================================================================
    // TEST 7: TextGenerator extracts the text field
    // ========================================================================
    #[tokio::test]
    async fn test_generator_extracts_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "answer": "  Texto reescrito  "
            })))
            .mount(&server)
            .await;

        let backend: Box<dyn TextGenerator> =
            Box::new(FoundryClient::new(&direct_config(server.uri()), None).unwrap());
        assert_eq!(backend.generate("p", "gpt-4o").await.unwrap(), "Texto reescrito");
        assert_eq!(backend.name(), "foundry");
    }

    #[tokio::test]
    async fn test_generator_falls_back_to_json_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "cards": { "a": 1 } })))
            .mount(&server)
            .await;

        let client = FoundryClient::new(&direct_config(server.uri()), None).unwrap();
        let text = client.generate("p", "gpt-4o").await.unwrap();
        assert_eq!(text, r#"{"cards":{"a":1}}"#);
    }

    #[test]
    fn test_error_serializes_with_type_key() {
        let err = FoundryError::new(FoundryErrorKind::Cors, FoundryMode::Proxy, "down").with_recommendation("start it");
        let v = serde_json::to_value(&err).unwrap();
        assert_eq!(v["type"], "cors");
        assert_eq!(v["mode"], "proxy");
        assert_eq!(v["recommendation"], "start it");
        assert_eq!(err.to_string(), "cors error (proxy): down");
    }
}
