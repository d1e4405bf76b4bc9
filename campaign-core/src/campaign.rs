use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::foundry::{FoundryClient, FoundryContext, FoundryError, FoundryPayload, UiState};
use crate::models::{BrandKit, CampaignBriefData, CampaignVersion, Language};
use crate::output::{parse_campaign_output, OutputError};
use crate::prompt::{brief_to_prompt, campaign_context};

#[derive(Error, Debug)]
pub enum CampaignError {
    #[error(transparent)]
    Foundry(#[from] FoundryError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Brief → prompt → one Foundry call → typed outputs.
#[derive(Debug, Clone)]
pub struct CampaignGenerator {
    foundry: FoundryClient,
}

impl CampaignGenerator {
    pub fn new(foundry: FoundryClient) -> Self {
        Self { foundry }
    }

    pub fn foundry(&self) -> &FoundryClient {
        &self.foundry
    }

    pub fn build_payload(brief: &CampaignBriefData, language: Language, brand_kit: Option<&BrandKit>) -> FoundryPayload {
        let mut payload = FoundryPayload::user(brief_to_prompt(brief, language, brand_kit));
        payload.context = Some(FoundryContext {
            campaign_context: Some(campaign_context(brief, brand_kit)),
            ui_state: Some(UiState {
                view: Some("campaign".to_string()),
            }),
        });
        payload
    }

    /// Generate one campaign version. Any failure voids the whole attempt.
    pub async fn generate(
        &self,
        brief: &CampaignBriefData,
        language: Language,
        brand_kit: Option<&BrandKit>,
    ) -> Result<CampaignVersion, CampaignError> {
        let payload = Self::build_payload(brief, language, brand_kit);
        let response = self.foundry.run(&payload).await?;
        let outputs = parse_campaign_output(response.as_value())?;

        let changelog = match response.campaign_name() {
            Some(name) => format!("{}: {}", language.pick("Campaña generada", "Campaign generated"), name),
            None => language.pick("Campaña generada", "Campaign generated").to_string(),
        };

        let version = CampaignVersion {
            id: Uuid::new_v4().to_string(),
            brief_data: brief.clone(),
            timestamp: Utc::now().timestamp_millis(),
            outputs,
            changelog,
        };

        tracing::info!(version_id = %version.id, mode = self.foundry.mode().as_str(), "Campaign generated");
        Ok(version)
    }
}
