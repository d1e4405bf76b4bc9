use serde::{Deserialize, Serialize};

/// UI language. Drives question text, recommendations and prompt wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Es,
    En,
}

impl Language {
    pub fn is_spanish(self) -> bool {
        matches!(self, Language::Es)
    }

    /// Pick the localized variant of a string pair.
    pub fn pick<'a>(self, es: &'a str, en: &'a str) -> &'a str {
        match self {
            Language::Es => es,
            Language::En => en,
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "es" | "spanish" | "español" => Ok(Language::Es),
            "en" | "english" => Ok(Language::En),
            other => Err(format!("unsupported language: {}", other)),
        }
    }
}

/// Campaign brief as collected by the wizard.
///
/// Every field is optional on the wire; missing strings deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignBriefData {
    pub objective: String,
    pub kpi: String,
    pub segments: String,
    pub pains: String,
    pub objections: String,
    pub buying_context: String,
    pub product: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guarantee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usp: Option<String>,
    pub channels: Vec<String>,
    pub budget: String,
    pub timing: String,
    pub geography: String,
    pub language: String,
    pub tone: String,
    pub brand_voice: String,
    pub forbidden_words: String,
    pub allowed_claims: String,
    pub legal_requirements: String,
    pub available_assets: String,
    pub links: String,
    pub audience: String,
    pub goals: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_promise: Option<String>,
    pub proof: Vec<String>,
    pub competitors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<String>,
}

/// Names of the brief fields a quick question can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BriefField {
    Objective,
    Kpi,
    Segments,
    Pains,
    Objections,
    BuyingContext,
    Product,
    Price,
    Promo,
    Guarantee,
    Usp,
    Channels,
    Budget,
    Timing,
    Geography,
    Language,
    Tone,
    BrandVoice,
    ForbiddenWords,
    AllowedClaims,
    LegalRequirements,
    AvailableAssets,
    Links,
    Audience,
    Goals,
    MainPromise,
    Proof,
    Competitors,
    Timeline,
    Margin,
}

/// Mutable view of a single brief field.
pub enum FieldSlot<'a> {
    Text(&'a mut String),
    Optional(&'a mut Option<String>),
    List(&'a mut Vec<String>),
}

impl CampaignBriefData {
    pub fn slot(&mut self, field: BriefField) -> FieldSlot<'_> {
        use BriefField as F;
        match field {
            F::Objective => FieldSlot::Text(&mut self.objective),
            F::Kpi => FieldSlot::Text(&mut self.kpi),
            F::Segments => FieldSlot::Text(&mut self.segments),
            F::Pains => FieldSlot::Text(&mut self.pains),
            F::Objections => FieldSlot::Text(&mut self.objections),
            F::BuyingContext => FieldSlot::Text(&mut self.buying_context),
            F::Product => FieldSlot::Text(&mut self.product),
            F::Price => FieldSlot::Optional(&mut self.price),
            F::Promo => FieldSlot::Optional(&mut self.promo),
            F::Guarantee => FieldSlot::Optional(&mut self.guarantee),
            F::Usp => FieldSlot::Optional(&mut self.usp),
            F::Channels => FieldSlot::List(&mut self.channels),
            F::Budget => FieldSlot::Text(&mut self.budget),
            F::Timing => FieldSlot::Text(&mut self.timing),
            F::Geography => FieldSlot::Text(&mut self.geography),
            F::Language => FieldSlot::Text(&mut self.language),
            F::Tone => FieldSlot::Text(&mut self.tone),
            F::BrandVoice => FieldSlot::Text(&mut self.brand_voice),
            F::ForbiddenWords => FieldSlot::Text(&mut self.forbidden_words),
            F::AllowedClaims => FieldSlot::Text(&mut self.allowed_claims),
            F::LegalRequirements => FieldSlot::Text(&mut self.legal_requirements),
            F::AvailableAssets => FieldSlot::Text(&mut self.available_assets),
            F::Links => FieldSlot::Text(&mut self.links),
            F::Audience => FieldSlot::Text(&mut self.audience),
            F::Goals => FieldSlot::Text(&mut self.goals),
            F::MainPromise => FieldSlot::Optional(&mut self.main_promise),
            F::Proof => FieldSlot::List(&mut self.proof),
            F::Competitors => FieldSlot::List(&mut self.competitors),
            F::Timeline => FieldSlot::Optional(&mut self.timeline),
            F::Margin => FieldSlot::Optional(&mut self.margin),
        }
    }
}

/// True when an optional text field holds something other than whitespace.
pub(crate) fn is_filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Brief summary kept as the "selected" brief in the KV store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectedBrief {
    pub id: String,
    pub name: String,
    pub product: String,
    pub target: String,
    pub channels: Vec<String>,
    pub brand_tone: String,
    pub budget: String,
    pub brief_text: String,
}
