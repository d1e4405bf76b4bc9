//! Request / response bodies shared by the HTTP service and the CLI.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::gaps::Answer;
use crate::models::{CampaignBriefData, Language, SafetyReport};
use crate::score::BriefAnalysis;
use crate::utm::UtmParams;

pub const PROTOCOL_VERSION: &str = "campaign-hub/1";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub brief: CampaignBriefData,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswersRequest {
    #[serde(default)]
    pub brief: CampaignBriefData,
    #[serde(default)]
    pub language: Language,
    /// Quick-question answers keyed by question id.
    #[serde(default)]
    pub answers: HashMap<String, Answer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswersResponse {
    pub brief: CampaignBriefData,
    pub applied: usize,
    pub analysis: BriefAnalysis,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyCheckRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default)]
    pub has_proof: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyRewriteResponse {
    pub rewritten: String,
    pub report: SafetyReport,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub brief: CampaignBriefData,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub thread_id: String,
    pub answer: Option<String>,
    pub status: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtmRequest {
    pub base_url: String,
    #[serde(flatten)]
    pub params: UtmParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtmResponse {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub foundry_mode: String,
    pub api_key_configured: bool,
    pub generator: String,
}
