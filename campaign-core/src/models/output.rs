use serde::{Deserialize, Serialize};

use super::brief::CampaignBriefData;

/// A tab the agent may fill with prose or with structured JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Structured<T> {
    Data(T),
    Text(String),
}

impl<T> Default for Structured<T> {
    fn default() -> Self {
        Structured::Text(String::new())
    }
}

impl<T> Structured<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Structured::Text(t) if t.trim().is_empty())
    }

    pub fn as_data(&self) -> Option<&T> {
        match self {
            Structured::Data(d) => Some(d),
            Structured::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Angle {
    Beneficio,
    Urgencia,
    Autoridad,
    Emocion,
    Objeciones,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Bajo,
    Medio,
    Alto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunnelStage {
    Awareness,
    Consideration,
    Conversion,
    Retention,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyVariation {
    #[serde(default)]
    pub id: String,
    pub angle: Angle,
    #[serde(default)]
    pub hook: String,
    #[serde(default)]
    pub promise: String,
    #[serde(default)]
    pub proof: String,
    #[serde(default)]
    pub cta: String,
    #[serde(default)]
    pub risk: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentCalendarItem {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub objective: String,
    pub funnel_phase: FunnelStage,
    #[serde(default)]
    pub cta: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AdExample {
    pub title: String,
    pub body: String,
    pub cta: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteType {
    Safe,
    Bold,
    Premium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreativeRoute {
    #[serde(rename = "type")]
    pub route_type: RouteType,
    #[serde(default)]
    pub big_idea: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub hooks: Vec<String>,
    #[serde(default)]
    pub ad_examples: Vec<AdExample>,
    #[serde(default)]
    pub risk: RiskLevel,
    #[serde(default)]
    pub when_to_use: String,
    #[serde(default)]
    pub expected_results: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct FunnelExample {
    pub title: String,
    pub description: String,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelPhase {
    pub phase: FunnelStage,
    #[serde(default)]
    pub phase_label: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub key_message: String,
    #[serde(default)]
    pub formats: Vec<String>,
    #[serde(default)]
    pub cta: String,
    #[serde(default)]
    pub kpis: Vec<String>,
    #[serde(default)]
    pub examples: Vec<FunnelExample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AdSet {
    pub name: String,
    pub audience: String,
    pub bid_strategy: String,
    pub budget: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignStructure {
    pub objective: String,
    pub adsets: Vec<AdSet>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudienceType {
    Cold,
    Lookalike,
    Retargeting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidAudience {
    #[serde(rename = "type")]
    pub audience_type: AudienceType,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub criteria: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CopyVariants {
    pub hooks: Vec<String>,
    pub headlines: Vec<String>,
    pub descriptions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreativeAngle {
    pub angle: Angle,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub when_to_use: String,
    #[serde(default)]
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BudgetSlice {
    pub phase: String,
    pub percentage: f64,
    pub allocation: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PlannedTest {
    pub priority: u32,
    pub test_name: String,
    pub hypothesis: String,
    pub variants: Vec<String>,
    pub metric: String,
    pub duration: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PaidPackData {
    pub campaign_structure: Vec<CampaignStructure>,
    pub audiences: Vec<PaidAudience>,
    pub copy_variants: CopyVariants,
    pub creative_angles: Vec<CreativeAngle>,
    pub budget_distribution: Vec<BudgetSlice>,
    pub test_plan: Vec<PlannedTest>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct LandingKitSection {
    pub section_name: String,
    pub wireframe: String,
    pub copy_options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct LandingKitFormField {
    pub field_name: String,
    pub label: String,
    pub placeholder: String,
    pub error_state: String,
    pub help_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct FormMicrocopy {
    pub fields: Vec<LandingKitFormField>,
    pub privacy_text: String,
    pub submit_button: String,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LandingKitFaq {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustSignalType {
    Reviews,
    Logos,
    Garantias,
    Cifras,
    Certificaciones,
    Casos,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandingKitTrustSignal {
    #[serde(rename = "type")]
    pub signal_type: TrustSignalType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct LandingKitData {
    pub sections: Vec<LandingKitSection>,
    pub form_microcopy: FormMicrocopy,
    pub faqs: Vec<LandingKitFaq>,
    pub trust_signals: Vec<LandingKitTrustSignal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OverviewAlerts {
    pub tbds: Vec<String>,
    pub risks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignOverview {
    pub objective: String,
    pub kpi: String,
    pub primary_audience: String,
    pub value_proposition: String,
    pub main_message: String,
    pub rtbs: Vec<String>,
    #[serde(rename = "recommendedCTA")]
    pub recommended_cta: String,
    pub launch_priority: Vec<String>,
    pub alerts: OverviewAlerts,
}

/// Everything one generation produces, one field per UI tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<CampaignOverview>,
    pub strategy: String,
    pub creative_routes: Structured<Vec<CreativeRoute>>,
    pub funnel_blueprint: Structured<Vec<FunnelPhase>>,
    pub paid_pack: Structured<PaidPackData>,
    pub landing_kit: Structured<LandingKitData>,
    pub content_calendar: Vec<ContentCalendarItem>,
    pub copy_variations: Vec<CopyVariation>,
    pub email_flow: String,
    pub whatsapp_flow: String,
    pub experiment_plan: String,
    pub measurement_utms: String,
    pub risks: String,
    pub execution_checklist: String,
}

/// Wire keys recognised as campaign output sections.
pub const OUTPUT_KEYS: &[&str] = &[
    "overview",
    "strategy",
    "creativeRoutes",
    "funnelBlueprint",
    "paidPack",
    "landingKit",
    "contentCalendar",
    "copyVariations",
    "emailFlow",
    "whatsappFlow",
    "experimentPlan",
    "measurementUtms",
    "risks",
    "executionChecklist",
];

/// One generation attempt, kept for history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignVersion {
    pub id: String,
    pub brief_data: CampaignBriefData,
    /// Unix milliseconds.
    pub timestamp: i64,
    pub outputs: CampaignOutput,
    pub changelog: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_accepts_text_or_data() {
        let output: CampaignOutput = serde_json::from_value(serde_json::json!({
            "strategy": "Lead with ROI",
            "creativeRoutes": "Three routes, described in prose",
            "funnelBlueprint": [
                { "phase": "awareness", "objective": "Reach CTOs", "kpis": ["CTR"] }
            ]
        }))
        .unwrap();

        assert_eq!(output.strategy, "Lead with ROI");
        assert!(matches!(output.creative_routes, Structured::Text(_)));
        let phases = output.funnel_blueprint.as_data().expect("structured funnel");
        assert_eq!(phases[0].phase, FunnelStage::Awareness);
        assert_eq!(phases[0].kpis, vec!["CTR"]);
        assert!(output.paid_pack.is_empty());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let output: CampaignOutput = serde_json::from_value(serde_json::json!({
            "strategy": "x",
            "somethingNew": { "a": 1 }
        }))
        .unwrap();
        assert_eq!(output.strategy, "x");
    }
}
