//! Campaign Hub HTTP API
//!
//! Axum server exposing brief analysis, content safety, campaign generation,
//! the agent chat and the `/api/run` Foundry proxy.
//!
//! Each endpoint has a thin axum handler that delegates to an inner function
//! returning `(StatusCode, Value)`; the inner functions are tested directly.
//!
//! Endpoints:
//! - GET    /health                 health and Foundry mode
//! - GET    /version                server version info
//! - POST   /api/run                Foundry proxy (server-side API key)
//! - POST   /api/brief/analyze      score, gaps and recommendations
//! - POST   /api/brief/answers      apply quick-question answers, re-analyze
//! - GET    /api/brief/selected     currently selected brief
//! - PUT    /api/brief/selected     select a brief
//! - DELETE /api/brief/selected     clear the selection
//! - GET    /api/brand-kit          stored brand kit (defaults when unset)
//! - PUT    /api/brand-kit          replace the brand kit
//! - POST   /api/safety/check       content safety report
//! - POST   /api/safety/rewrite     LLM rewrite of high-severity issues
//! - POST   /api/campaign/generate  brief → campaign version
//! - POST   /api/chat               one orchestrator chat turn
//! - POST   /api/utm                UTM-tagged URL

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use campaign_core::api::{
    AnalyzeRequest, AnswersRequest, AnswersResponse, ChatRequest, GenerateRequest, HealthResponse,
    SafetyCheckRequest, SafetyRewriteResponse, UtmRequest, UtmResponse, PROTOCOL_VERSION,
};
use campaign_core::models::{BrandKit, SafetyIssue, SelectedBrief, Severity};
use campaign_core::orchestrator::default_agent;
use campaign_core::{
    analyze_brief, apply_answers, build_utm_url, check_content_safety, detect_brief_gaps,
    safety_rewrite_prompt, BriefStore, CampaignError, CampaignGenerator, FoundryClient, FoundryError,
    FoundryErrorKind, GenerationError, HubConfig, HubError, KvStore, Orchestrator, TextGenerator,
};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::subsystems::{chat::chat_inner, proxy::proxy_inner};

/// Shared state for all HTTP handlers
pub struct HttpState {
    pub config: HubConfig,
    pub api_key: Option<String>,
    pub proxy_client: reqwest::Client,
    /// Hosts `/api/run` may forward to, resolved from `[proxy]` and `[foundry]`.
    pub proxy_hosts: Vec<String>,
    pub campaigns: CampaignGenerator,
    pub generator: Arc<dyn TextGenerator>,
    pub orchestrator: Orchestrator,
    pub store: Arc<KvStore>,
    pub briefs: BriefStore,
}

impl HttpState {
    /// Wire everything from config; Foundry backs both campaigns and the agent.
    pub async fn from_config(config: HubConfig, api_key: Option<String>) -> Result<Self, HubError> {
        let foundry = FoundryClient::new(&config.foundry, api_key.clone())?;
        let generator: Arc<dyn TextGenerator> = Arc::new(foundry.clone());
        Self::with_generator(config, api_key, foundry, generator).await
    }

    pub async fn with_generator(
        config: HubConfig,
        api_key: Option<String>,
        foundry: FoundryClient,
        generator: Arc<dyn TextGenerator>,
    ) -> Result<Self, HubError> {
        let store = Arc::new(KvStore::open(&config.store.path).await?);
        let proxy_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.foundry.timeout_seconds))
            .build()
            .map_err(|e| HubError::Other(format!("Failed to build proxy client: {}", e)))?;

        let proxy_hosts = config.proxy.effective_hosts(&config.foundry);
        if proxy_hosts.is_empty() {
            tracing::warn!("No proxy host allowed; /api/run will reject every endpoint");
        }

        Ok(Self {
            api_key,
            proxy_client,
            proxy_hosts,
            campaigns: CampaignGenerator::new(foundry),
            orchestrator: Orchestrator::with_max_threads(generator.clone(), config.orchestrator.max_threads),
            generator,
            briefs: BriefStore::new(store.clone()),
            store,
            config,
        })
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.config.orchestrator.poll_interval_ms.max(1))
    }
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/api/run", post(proxy_handler))
        .route("/api/brief/analyze", post(analyze_handler))
        .route("/api/brief/answers", post(answers_handler))
        .route(
            "/api/brief/selected",
            get(get_selected_handler)
                .put(put_selected_handler)
                .delete(delete_selected_handler),
        )
        .route("/api/brand-kit", get(get_brand_kit_handler).put(put_brand_kit_handler))
        .route("/api/safety/check", post(safety_check_handler))
        .route("/api/safety/rewrite", post(safety_rewrite_handler))
        .route("/api/campaign/generate", post(generate_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/utm", post(utm_handler))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(state: Arc<HttpState>, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
    let addr = format!("{}:{}", state.config.http.host, state.config.http.port);

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Campaign Hub HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Inner (directly testable) functions
// ============================================================================

pub async fn health_inner(state: &HttpState) -> (StatusCode, Value) {
    to_json(
        StatusCode::OK,
        &HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            foundry_mode: state.campaigns.foundry().mode().as_str().to_string(),
            api_key_configured: state.api_key.is_some(),
            generator: state.orchestrator.generator_name().to_string(),
        },
    )
}

/// Inner version: returns version info (pure, no IO).
pub fn version_inner() -> Value {
    json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": PROTOCOL_VERSION,
    })
}

pub fn analyze_inner(req: AnalyzeRequest) -> (StatusCode, Value) {
    to_json(StatusCode::OK, &analyze_brief(&req.brief, req.language))
}

/// Apply answers against the questions the brief currently needs, then re-analyze.
pub fn answers_inner(req: AnswersRequest) -> (StatusCode, Value) {
    let AnswersRequest { mut brief, language, answers } = req;
    let gaps = detect_brief_gaps(&brief, language);
    let applied = apply_answers(&mut brief, &gaps.questions, &answers);
    let analysis = analyze_brief(&brief, language);

    to_json(StatusCode::OK, &AnswersResponse { brief, applied, analysis })
}

pub fn safety_check_inner(req: SafetyCheckRequest) -> (StatusCode, Value) {
    if req.content.trim().is_empty() {
        return bad_request("content field is required");
    }
    let report = check_content_safety(&req.content, req.sector.as_deref(), req.has_proof);
    to_json(StatusCode::OK, &report)
}

/// Check, then ask the generator to rewrite only when high-severity issues exist.
pub async fn safety_rewrite_inner(
    generator: &dyn TextGenerator,
    store: &KvStore,
    req: SafetyCheckRequest,
) -> (StatusCode, Value) {
    if req.content.trim().is_empty() {
        return bad_request("content field is required");
    }

    let report = check_content_safety(&req.content, req.sector.as_deref(), req.has_proof);
    let high: Vec<SafetyIssue> = report
        .issues
        .iter()
        .filter(|i| i.severity == Severity::High)
        .cloned()
        .collect();

    if high.is_empty() {
        return to_json(
            StatusCode::OK,
            &SafetyRewriteResponse {
                rewritten: req.content,
                report,
            },
        );
    }

    let brand_kit = match store.brand_kit().await {
        Ok(kit) => kit,
        Err(e) => return internal_error(e),
    };
    let prompt = safety_rewrite_prompt(&req.content, &high, Some(&brand_kit));

    match generator.generate(&prompt, &default_agent().model).await {
        Ok(text) => to_json(
            StatusCode::OK,
            &SafetyRewriteResponse {
                rewritten: text.trim().to_string(),
                report,
            },
        ),
        Err(GenerationError::Foundry(e)) => foundry_error_response(&e),
        Err(e) => {
            tracing::warn!(error = %e, "Safety rewrite failed");
            (
                StatusCode::BAD_GATEWAY,
                json!({ "error": e.to_string(), "type": "generator" }),
            )
        }
    }
}

pub async fn generate_inner(
    campaigns: &CampaignGenerator,
    store: &KvStore,
    req: GenerateRequest,
) -> (StatusCode, Value) {
    let brand_kit = match store.brand_kit().await {
        Ok(kit) => kit,
        Err(e) => return internal_error(e),
    };

    match campaigns.generate(&req.brief, req.language, Some(&brand_kit)).await {
        Ok(version) => to_json(StatusCode::OK, &version),
        Err(CampaignError::Foundry(e)) => foundry_error_response(&e),
        Err(CampaignError::Output(e)) => {
            tracing::warn!(error = %e, "Campaign output could not be parsed");
            (
                StatusCode::BAD_GATEWAY,
                json!({ "error": e.to_string(), "type": FoundryErrorKind::Parse.as_str() }),
            )
        }
    }
}

pub async fn get_brand_kit_inner(store: &KvStore) -> (StatusCode, Value) {
    match store.brand_kit().await {
        Ok(kit) => to_json(StatusCode::OK, &kit),
        Err(e) => internal_error(e),
    }
}

pub async fn put_brand_kit_inner(store: &KvStore, kit: BrandKit) -> (StatusCode, Value) {
    match store.save_brand_kit(&kit).await {
        Ok(()) => to_json(StatusCode::OK, &kit),
        Err(e) => internal_error(e),
    }
}

pub async fn get_selected_inner(briefs: &BriefStore) -> (StatusCode, Value) {
    match briefs.selected_brief().await {
        Ok(Some(brief)) => to_json(StatusCode::OK, &brief),
        Ok(None) => (StatusCode::NOT_FOUND, json!({ "error": "No brief selected" })),
        Err(e) => internal_error(e),
    }
}

pub async fn put_selected_inner(briefs: &BriefStore, brief: SelectedBrief) -> (StatusCode, Value) {
    if brief.id.trim().is_empty() {
        return bad_request("id field is required");
    }
    match briefs.set_selected_brief(&brief).await {
        Ok(()) => to_json(StatusCode::OK, &brief),
        Err(e) => internal_error(e),
    }
}

pub async fn delete_selected_inner(briefs: &BriefStore) -> (StatusCode, Value) {
    match briefs.clear_selected_brief().await {
        Ok(()) => (StatusCode::OK, json!({ "cleared": true })),
        Err(e) => internal_error(e),
    }
}

pub fn utm_inner(req: UtmRequest) -> (StatusCode, Value) {
    match build_utm_url(&req.base_url, &req.params) {
        Ok(url) => to_json(StatusCode::OK, &UtmResponse { url }),
        Err(e) => bad_request(e.to_string()),
    }
}

// ============================================================================
// Axum handler wrappers (thin, delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state).await;
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn proxy_handler(
    State(state): State<Arc<HttpState>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let (status, body) = proxy_inner(
        &state.proxy_client,
        state.api_key.as_deref(),
        &state.proxy_hosts,
        body,
    )
    .await;
    (status, Json(body))
}

pub async fn analyze_handler(Json(req): Json<AnalyzeRequest>) -> impl IntoResponse {
    let (status, body) = analyze_inner(req);
    (status, Json(body))
}

pub async fn answers_handler(Json(req): Json<AnswersRequest>) -> impl IntoResponse {
    let (status, body) = answers_inner(req);
    (status, Json(body))
}

pub async fn get_selected_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = get_selected_inner(&state.briefs).await;
    (status, Json(body))
}

pub async fn put_selected_handler(
    State(state): State<Arc<HttpState>>,
    Json(brief): Json<SelectedBrief>,
) -> impl IntoResponse {
    let (status, body) = put_selected_inner(&state.briefs, brief).await;
    (status, Json(body))
}

pub async fn delete_selected_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = delete_selected_inner(&state.briefs).await;
    (status, Json(body))
}

pub async fn get_brand_kit_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = get_brand_kit_inner(&state.store).await;
    (status, Json(body))
}

pub async fn put_brand_kit_handler(
    State(state): State<Arc<HttpState>>,
    Json(kit): Json<BrandKit>,
) -> impl IntoResponse {
    let (status, body) = put_brand_kit_inner(&state.store, kit).await;
    (status, Json(body))
}

pub async fn safety_check_handler(Json(req): Json<SafetyCheckRequest>) -> impl IntoResponse {
    let (status, body) = safety_check_inner(req);
    (status, Json(body))
}

pub async fn safety_rewrite_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<SafetyCheckRequest>,
) -> impl IntoResponse {
    let (status, body) = safety_rewrite_inner(state.generator.as_ref(), &state.store, req).await;
    (status, Json(body))
}

pub async fn generate_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<GenerateRequest>,
) -> impl IntoResponse {
    let (status, body) = generate_inner(&state.campaigns, &state.store, req).await;
    (status, Json(body))
}

pub async fn chat_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    let (status, body) = chat_inner(
        &state.orchestrator,
        &state.config.orchestrator.default_agent_id,
        state.poll_interval(),
        req,
    )
    .await;
    (status, Json(body))
}

pub async fn utm_handler(Json(req): Json<UtmRequest>) -> impl IntoResponse {
    let (status, body) = utm_inner(req);
    (status, Json(body))
}

// ============================================================================
// Helpers
// ============================================================================

/// Serialize `body` under `status`, or fall back to a 500.
pub fn to_json<T: Serialize>(status: StatusCode, body: &T) -> (StatusCode, Value) {
    match serde_json::to_value(body) {
        Ok(v) => (status, v),
        Err(e) => internal_error(e),
    }
}

pub fn foundry_status(kind: FoundryErrorKind) -> StatusCode {
    match kind {
        FoundryErrorKind::Auth => StatusCode::UNAUTHORIZED,
        FoundryErrorKind::Network | FoundryErrorKind::Cors | FoundryErrorKind::Parse => StatusCode::BAD_GATEWAY,
        FoundryErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Error body carrying the Foundry error taxonomy.
pub fn foundry_error_response(e: &FoundryError) -> (StatusCode, Value) {
    tracing::warn!(kind = e.kind.as_str(), mode = e.mode.as_str(), error = %e.message, "Foundry call failed");
    (
        foundry_status(e.kind),
        json!({
            "error": e.message,
            "type": e.kind.as_str(),
            "recommendation": e.recommendation,
            "mode": e.mode.as_str(),
        }),
    )
}

fn bad_request(msg: impl Into<String>) -> (StatusCode, Value) {
    (
        StatusCode::BAD_REQUEST,
        json!({ "error": msg.into(), "status": "error" }),
    )
}

fn internal_error(e: impl std::fmt::Display) -> (StatusCode, Value) {
    tracing::error!(error = %e, "Request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": e.to_string(), "status": "error" }),
    )
}

// ============================================================================
// Unit Tests: call inner functions directly
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use campaign_core::config::FoundryConfig;
    use campaign_core::models::{CampaignBriefData, Language};
    use campaign_core::FoundryMode;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Records the last prompt and answers with a fixed rewrite.
    struct Recorder {
        last_prompt: Mutex<Option<String>>,
    }

    #[async_trait]
    impl TextGenerator for Recorder {
        async fn generate(&self, prompt: &str, _model: &str) -> Result<String, GenerationError> {
            if let Ok(mut last) = self.last_prompt.lock() {
                *last = Some(prompt.to_string());
            }
            Ok("  Una opción sólida para tu equipo.  ".to_string())
        }

        fn name(&self) -> &str {
            "recorder"
        }
    }

    async fn temp_store() -> (tempfile::TempDir, KvStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::open(dir.path().join("store.json")).await.unwrap();
        (dir, store)
    }

    // ========================================================================
    // TEST 1: version_inner is pure and returns correct fields
    // ========================================================================
    #[test]
    fn test_version_inner_pure() {
        let v = version_inner();
        assert!(v["version"].is_string());
        assert_eq!(v["protocol"], "campaign-hub/1");
    }

    // ========================================================================
    // TEST 2: analyze_inner scores an empty brief as incomplete
    // ========================================================================
    #[test]
    fn test_analyze_inner_empty_brief() {
        let (status, body) = analyze_inner(AnalyzeRequest::default());
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], 0);
        assert!(!body["missing"].as_array().unwrap().is_empty());
    }

    // ========================================================================
    // TEST 3: answers_inner fills the brief and re-analyzes
    // ========================================================================
    #[test]
    fn test_answers_inner_applies_answers() {
        let empty = CampaignBriefData::default();
        let gaps = detect_brief_gaps(&empty, Language::Es);
        let first = gaps.questions.first().expect("empty brief has questions");

        let answer = match first.options.first() {
            Some(opt) => opt.value.clone(),
            None => "Respuesta".to_string(),
        };
        let mut answers = HashMap::new();
        answers.insert(first.id.clone(), serde_json::from_value(json!(answer)).unwrap());

        let (status, body) = answers_inner(AnswersRequest {
            brief: empty,
            language: Language::Es,
            answers,
        });
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["applied"], 1);
        assert!(body["analysis"]["score"].is_number());
    }

    // ========================================================================
    // TEST 4: safety_check_inner validates and reports
    // ========================================================================
    #[test]
    fn test_safety_check_inner() {
        let (status, _) = safety_check_inner(SafetyCheckRequest::default());
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = safety_check_inner(SafetyCheckRequest {
            content: "Resultados garantizados al 100%".to_string(),
            ..Default::default()
        });
        assert_eq!(status, StatusCode::OK);
        assert!(body["highSeverity"].as_u64().unwrap() >= 1);
        assert!(body["score"].as_u64().unwrap() < 100);
    }

    // ========================================================================
    // TEST 5: safety_rewrite_inner skips the generator for clean content
    // ========================================================================
    #[tokio::test]
    async fn test_safety_rewrite_clean_content_untouched() {
        let (_dir, store) = temp_store().await;
        let gen = Recorder {
            last_prompt: Mutex::new(None),
        };
        let req = SafetyCheckRequest {
            content: "Descubre nuestra nueva colección de otoño.".to_string(),
            ..Default::default()
        };

        let (status, body) = safety_rewrite_inner(&gen, &store, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rewritten"], "Descubre nuestra nueva colección de otoño.");
        assert!(gen.last_prompt.lock().unwrap().is_none());
    }

    // ========================================================================
    // TEST 6: safety_rewrite_inner rewrites high-severity content
    // ========================================================================
    #[tokio::test]
    async fn test_safety_rewrite_calls_generator() {
        let (_dir, store) = temp_store().await;
        let gen = Recorder {
            last_prompt: Mutex::new(None),
        };
        let req = SafetyCheckRequest {
            content: "Resultados garantizados al 100%".to_string(),
            ..Default::default()
        };

        let (status, body) = safety_rewrite_inner(&gen, &store, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rewritten"], "Una opción sólida para tu equipo.");
        let prompt = gen.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Resultados garantizados al 100%"));
    }

    // ========================================================================
    // TEST 7: Foundry error kinds map to HTTP statuses
    // ========================================================================
    #[test]
    fn test_foundry_error_response() {
        assert_eq!(foundry_status(FoundryErrorKind::Auth), StatusCode::UNAUTHORIZED);
        assert_eq!(foundry_status(FoundryErrorKind::Cors), StatusCode::BAD_GATEWAY);
        assert_eq!(foundry_status(FoundryErrorKind::Unknown), StatusCode::INTERNAL_SERVER_ERROR);

        let err = FoundryError::new(FoundryErrorKind::Auth, FoundryMode::Direct, "HTTP 401: denied")
            .with_recommendation("Check FOUNDRY_API_KEY");
        let (status, body) = foundry_error_response(&err);
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["type"], "auth");
        assert_eq!(body["mode"], "direct");
        assert_eq!(body["recommendation"], "Check FOUNDRY_API_KEY");
    }

    // ========================================================================
    // TEST 8: brand kit get/put round-trips through the store
    // ========================================================================
    #[tokio::test]
    async fn test_brand_kit_inner() {
        let (_dir, store) = temp_store().await;

        let (status, defaults) = get_brand_kit_inner(&store).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(defaults, serde_json::to_value(BrandKit::default()).unwrap());

        let mut kit = BrandKit::default();
        kit.forbidden_words = vec!["barato".to_string()];
        let (status, _) = put_brand_kit_inner(&store, kit.clone()).await;
        assert_eq!(status, StatusCode::OK);

        let (_, stored) = get_brand_kit_inner(&store).await;
        assert_eq!(stored, serde_json::to_value(&kit).unwrap());
    }

    // ========================================================================
    // TEST 9: selected brief lifecycle
    // ========================================================================
    #[tokio::test]
    async fn test_selected_brief_inner() {
        let (_dir, store) = temp_store().await;
        let briefs = BriefStore::new(Arc::new(store));

        let (status, _) = get_selected_inner(&briefs).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = put_selected_inner(&briefs, SelectedBrief::default()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let brief = SelectedBrief {
            id: "brief-1".to_string(),
            name: "Lanzamiento Q3".to_string(),
            ..Default::default()
        };
        let (status, _) = put_selected_inner(&briefs, brief).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = get_selected_inner(&briefs).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "brief-1");

        let (status, _) = delete_selected_inner(&briefs).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = get_selected_inner(&briefs).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    // ========================================================================
    // TEST 10: utm_inner builds links and rejects bad input
    // ========================================================================
    #[test]
    fn test_utm_inner() {
        let req: UtmRequest = serde_json::from_value(json!({
            "baseUrl": "https://example.com/landing",
            "source": "newsletter",
            "medium": "email",
            "campaign": "otono",
        }))
        .unwrap();
        let (status, body) = utm_inner(req);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["url"],
            "https://example.com/landing?utm_source=newsletter&utm_medium=email&utm_campaign=otono"
        );

        let req: UtmRequest = serde_json::from_value(json!({
            "baseUrl": "nope",
            "source": "a",
            "medium": "b",
            "campaign": "c",
        }))
        .unwrap();
        let (status, _) = utm_inner(req);
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    // ========================================================================
    // TEST 11: health reports the Foundry mode and key presence
    // ========================================================================
    #[tokio::test]
    async fn test_health_inner() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = HubConfig::default();
        config.store.path = dir.path().join("store.json").display().to_string();
        config.foundry = FoundryConfig {
            use_proxy: false,
            ..FoundryConfig::default()
        };

        let state = HttpState::from_config(config, Some("k".to_string())).await.unwrap();
        let (status, body) = health_inner(&state).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["foundry_mode"], "direct");
        assert_eq!(body["api_key_configured"], true);
        assert_eq!(body["generator"], "foundry");
    }
}
