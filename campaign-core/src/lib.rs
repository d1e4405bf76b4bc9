pub mod agent_client;
pub mod api;
pub mod campaign;
pub mod config;
pub mod error;
pub mod foundry;
pub mod gaps;
pub mod generator;
pub mod models;
pub mod orchestrator;
pub mod output;
pub mod prompt;
pub mod safety;
pub mod score;
pub mod session;
pub mod store;
pub mod utm;

pub use agent_client::{AgentClient, AgentClientError};
pub use campaign::{CampaignError, CampaignGenerator};
pub use config::HubConfig;
pub use error::HubError;
pub use foundry::{
    FoundryClient, FoundryError, FoundryErrorKind, FoundryMode, FoundryPayload, FoundryResponse,
};
pub use gaps::{apply_answers, detect_brief_gaps, GapDetectionResult, QuickQuestion};
pub use generator::{GenerationError, TextGenerator};
pub use orchestrator::{Orchestrator, OrchestratorError, DEFAULT_AGENT_ID};
pub use output::parse_campaign_output;
pub use prompt::{brief_to_prompt, campaign_context};
pub use safety::{apply_safety_suggestion, check_content_safety, safety_rewrite_prompt};
pub use score::{analyze_brief, score_brief, BriefAnalysis};
pub use session::ConversationSession;
pub use store::{BriefStore, KvStore, StoreError};
pub use utm::{build_utm_url, UtmError, UtmParams};
