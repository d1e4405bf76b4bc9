use config::{Config, ConfigError, File};
use serde::Deserialize;

/// Environment variable holding the Foundry API key (never stored in the TOML).
pub const FOUNDRY_API_KEY_ENV: &str = "FOUNDRY_API_KEY";

pub const DEFAULT_FOUNDRY_ENDPOINT: &str = "https://tenerife-winter-resource.services.ai.azure.com/api/projects/tenerife-winter/applications/campaign-impact-hub/protocols/activityprotocol?api-version=2025-11-15-preview";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct HubConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub foundry: FoundryConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FoundryConfig {
    pub endpoint: String,
    /// Route calls through the `/api/run` proxy instead of calling Foundry directly.
    pub use_proxy: bool,
    /// Full URL of the proxy route.
    pub proxy_endpoint: String,
    pub timeout_seconds: u64,
}

impl Default for FoundryConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_FOUNDRY_ENDPOINT.to_string(),
            use_proxy: true,
            proxy_endpoint: "http://127.0.0.1:8787/api/run".to_string(),
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    pub backend_url: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:5001".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OrchestratorConfig {
    pub poll_interval_ms: u64,
    pub default_agent_id: String,
    /// Threads kept in memory; the oldest are evicted past this count.
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,
}

fn default_max_threads() -> usize {
    crate::orchestrator::DEFAULT_MAX_THREADS
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            default_agent_id: crate::orchestrator::DEFAULT_AGENT_ID.to_string(),
            max_threads: default_max_threads(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "campaign-hub-store.json".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProxyConfig {
    /// Hosts the `/api/run` proxy may forward to. Empty means the host of
    /// `foundry.endpoint` only.
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
}

impl ProxyConfig {
    /// The allowlist the proxy enforces. Falls back to the Foundry endpoint's
    /// host; an unparsable endpoint yields an empty list, which rejects everything.
    pub fn effective_hosts(&self, foundry: &FoundryConfig) -> Vec<String> {
        if !self.allowed_hosts.is_empty() {
            return self.allowed_hosts.clone();
        }
        url::Url::parse(foundry.endpoint.trim())
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
            .into_iter()
            .collect()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

impl HubConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .build()?;
        s.try_deserialize()
    }

    /// The Foundry API key from the environment, if set and non-empty.
    pub fn foundry_api_key() -> Option<String> {
        std::env::var(FOUNDRY_API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}
