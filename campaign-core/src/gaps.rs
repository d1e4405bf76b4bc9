//! Brief gap detector
//!
//! Rule-based scan of a brief for missing or weak information. Each rule is
//! independent and produces at most one follow-up question; questions come
//! out in rule order. Answers can be written back with [`apply_answers`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::brief::{is_filled, FieldSlot};
use crate::models::{BriefField, CampaignBriefData, Language};

/// Channels that imply paid media spend.
pub const PAID_CHANNELS: &[&str] = &["google", "facebook", "instagram", "linkedin", "tiktok", "youtube"];

/// Keywords that mark a regulated sector when found in product or segments.
pub const REGULATED_SECTORS: &[&str] = &[
    "financiero",
    "salud",
    "farmacéutico",
    "legal",
    "educación",
    "seguros",
    "inmobiliario",
    "finance",
    "health",
    "pharmaceutical",
    "education",
    "insurance",
    "real estate",
];

/// Minimum number of words a segment description needs to count as specific.
const MIN_AUDIENCE_WORDS: usize = 8;

/// Minimum USP length (chars, trimmed).
const MIN_USP_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Text,
    Textarea,
    Select,
    Multiselect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickQuestion {
    pub id: String,
    pub field: BriefField,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<QuestionOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapDetectionResult {
    pub has_gaps: bool,
    pub questions: Vec<QuickQuestion>,
}

/// An answer to a quick question: free text or a set of chosen options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    One(String),
    Many(Vec<String>),
}

impl Answer {
    fn is_blank(&self) -> bool {
        match self {
            Answer::One(s) => s.trim().is_empty(),
            Answer::Many(items) => items.iter().all(|s| s.trim().is_empty()),
        }
    }
}

struct QuestionSpec {
    id: &'static str,
    field: BriefField,
    question: (&'static str, &'static str),
    placeholder: Option<(&'static str, &'static str)>,
    question_type: QuestionType,
    options: &'static [(&'static str, &'static str, &'static str)],
    required: bool,
}

impl QuestionSpec {
    fn build(&self, language: Language) -> QuickQuestion {
        QuickQuestion {
            id: self.id.to_string(),
            field: self.field,
            question: language.pick(self.question.0, self.question.1).to_string(),
            placeholder: self
                .placeholder
                .map(|(es, en)| language.pick(es, en).to_string()),
            question_type: self.question_type,
            options: self
                .options
                .iter()
                .map(|(icon, es, en)| {
                    let value = language.pick(es, en).to_string();
                    QuestionOption {
                        label: format!("{} {}", icon, value),
                        value,
                    }
                })
                .collect(),
            default_value: None,
            required: self.required,
        }
    }
}

const MISSING_PRICE: QuestionSpec = QuestionSpec {
    id: "missing-price",
    field: BriefField::Price,
    question: (
        "¿Cuál es el rango de precio del producto/servicio?",
        "What is the price range of the product/service?",
    ),
    placeholder: Some((
        "Ej: €299/mes, desde €500, €1,500 - €3,000",
        "e.g., $299/month, from $500, $1,500 - $3,000",
    )),
    question_type: QuestionType::Text,
    options: &[],
    required: true,
};

const MISSING_USP: QuestionSpec = QuestionSpec {
    id: "missing-usp",
    field: BriefField::Usp,
    question: (
        "¿Cuál es la propuesta de valor única (USP)? Elige o edita:",
        "What is the unique selling proposition (USP)? Choose or edit:",
    ),
    placeholder: None,
    question_type: QuestionType::Select,
    options: &[
        ("⚡", "Más rápido que alternativas del mercado", "Faster than market alternatives"),
        ("💰", "Mayor ROI demostrable en casos de éxito", "Demonstrable higher ROI in success cases"),
        ("🔗", "Única solución que integra X + Y en un solo lugar", "Only solution that integrates X + Y in one place"),
        ("🎯", "Implementación más simple sin necesidad de equipo técnico", "Simpler implementation without technical team needed"),
    ],
    required: true,
};

const MISSING_PROOF: QuestionSpec = QuestionSpec {
    id: "missing-proof",
    field: BriefField::Proof,
    question: (
        "¿Qué evidencia o prueba social tienes disponible?",
        "What evidence or social proof do you have available?",
    ),
    placeholder: None,
    question_type: QuestionType::Multiselect,
    options: &[
        ("⭐", "Reviews/testimonios de clientes (5★)", "Customer reviews/testimonials (5★)"),
        ("📊", "Cifras de impacto (ej: \"500+ clientes\", \"30% ROI\")", "Impact figures (e.g., \"500+ customers\", \"30% ROI\")"),
        ("📄", "Caso de éxito documentado", "Documented case study"),
        ("✅", "Garantía de satisfacción o devolución", "Satisfaction or money-back guarantee"),
        ("🏆", "Certificaciones o premios", "Certifications or awards"),
    ],
    required: false,
};

const VAGUE_AUDIENCE: QuestionSpec = QuestionSpec {
    id: "vague-audience",
    field: BriefField::Segments,
    question: (
        "Tu audiencia parece muy amplia. ¿Puedes definir 1-2 segmentos prioritarios?",
        "Your audience seems too broad. Can you define 1-2 priority segments?",
    ),
    placeholder: Some((
        "Ej: CTOs en empresas medianas (50-500 empleados) del sector fintech que buscan migrar a cloud",
        "e.g., CTOs in medium-sized companies (50-500 employees) in the fintech sector looking to migrate to cloud",
    )),
    question_type: QuestionType::Textarea,
    options: &[],
    required: true,
};

const PAID_BUDGET: QuestionSpec = QuestionSpec {
    id: "paid-budget",
    field: BriefField::Budget,
    question: (
        "¿Cuál es el presupuesto mínimo para canales pagados?",
        "What is the minimum budget for paid channels?",
    ),
    placeholder: Some(("Ej: €5,000/mes durante 3 meses", "e.g., $5,000/month for 3 months")),
    question_type: QuestionType::Text,
    options: &[],
    required: true,
};

const PAID_OBJECTIVE: QuestionSpec = QuestionSpec {
    id: "paid-objective",
    field: BriefField::Kpi,
    question: (
        "¿Cuál es el objetivo principal de las campañas pagadas?",
        "What is the main objective of the paid campaigns?",
    ),
    placeholder: None,
    question_type: QuestionType::Select,
    options: &[
        ("💰", "CPA (Costo por Adquisición) < €X", "CPA (Cost per Acquisition) < $X"),
        ("📈", "ROAS (Return on Ad Spend) > 3x", "ROAS (Return on Ad Spend) > 3x"),
        ("🎯", "CPL (Costo por Lead) < €X", "CPL (Cost per Lead) < $X"),
        ("👆", "CTR mínimo del 2%", "Minimum CTR of 2%"),
    ],
    required: true,
};

const REGULATED_CLAIMS: QuestionSpec = QuestionSpec {
    id: "regulated-claims",
    field: BriefField::AllowedClaims,
    question: (
        "Detectamos un sector regulado. ¿Qué claims están permitidos y cuáles prohibidos?",
        "We detected a regulated sector. Which claims are allowed and which are prohibited?",
    ),
    placeholder: Some((
        "Ej: Permitido: \"Reduce costos hasta 30%\". Prohibido: \"Cura definitiva\", \"100% garantizado\"",
        "e.g., Allowed: \"Reduces costs up to 30%\". Prohibited: \"Definitive cure\", \"100% guaranteed\"",
    )),
    question_type: QuestionType::Textarea,
    options: &[],
    required: true,
};

const LEGAL_REQUIREMENTS: QuestionSpec = QuestionSpec {
    id: "legal-requirements",
    field: BriefField::LegalRequirements,
    question: (
        "¿Hay requisitos legales obligatorios que debamos incluir? (GDPR, disclaimers, etc.)",
        "Are there mandatory legal requirements we must include? (GDPR, disclaimers, etc.)",
    ),
    placeholder: Some((
        "Ej: Incluir link a términos, mencionar GDPR compliance, disclaimer de precios sujetos a configuración",
        "e.g., Include link to terms, mention GDPR compliance, price disclaimer subject to configuration",
    )),
    question_type: QuestionType::Textarea,
    options: &[],
    required: false,
};

pub fn has_paid_channels(brief: &CampaignBriefData) -> bool {
    brief
        .channels
        .iter()
        .any(|ch| PAID_CHANNELS.contains(&ch.trim().to_lowercase().as_str()))
}

pub fn is_regulated_sector(brief: &CampaignBriefData) -> bool {
    let product = brief.product.to_lowercase();
    let segments = brief.segments.to_lowercase();
    REGULATED_SECTORS
        .iter()
        .any(|sector| product.contains(sector) || segments.contains(sector))
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn proof_missing(proof: &[String]) -> bool {
    proof.is_empty() || (proof.len() == 1 && proof[0].trim().is_empty())
}

fn kpi_names_paid_metric(kpi: &str) -> bool {
    let kpi = kpi.to_lowercase();
    ["cpa", "roas", "cpl"].iter().any(|m| kpi.contains(m))
}

/// Scan a brief for gaps and return the follow-up questions to ask.
pub fn detect_brief_gaps(brief: &CampaignBriefData, language: Language) -> GapDetectionResult {
    let paid = has_paid_channels(brief);
    let regulated = is_regulated_sector(brief);

    let usp_weak = brief
        .usp
        .as_deref()
        .map(|u| u.trim().chars().count() < MIN_USP_CHARS)
        .unwrap_or(true);

    let rules: [(bool, &QuestionSpec); 8] = [
        (!is_filled(&brief.price), &MISSING_PRICE),
        (usp_weak, &MISSING_USP),
        (proof_missing(&brief.proof), &MISSING_PROOF),
        (word_count(&brief.segments) < MIN_AUDIENCE_WORDS, &VAGUE_AUDIENCE),
        (paid && brief.budget.trim().is_empty(), &PAID_BUDGET),
        (paid && !kpi_names_paid_metric(&brief.kpi), &PAID_OBJECTIVE),
        (regulated && brief.allowed_claims.trim().is_empty(), &REGULATED_CLAIMS),
        (regulated && brief.legal_requirements.trim().is_empty(), &LEGAL_REQUIREMENTS),
    ];

    let questions: Vec<QuickQuestion> = rules
        .iter()
        .filter(|(triggered, _)| *triggered)
        .map(|(_, spec)| spec.build(language))
        .collect();

    tracing::debug!(count = questions.len(), "Brief gap detection complete");

    GapDetectionResult {
        has_gaps: !questions.is_empty(),
        questions,
    }
}

/// Write quick-question answers (keyed by question id) back into the brief.
///
/// Blank answers and answers to unknown question ids are skipped. Returns the
/// number of fields updated.
pub fn apply_answers(
    brief: &mut CampaignBriefData,
    questions: &[QuickQuestion],
    answers: &HashMap<String, Answer>,
) -> usize {
    let mut applied = 0;

    for question in questions {
        let Some(answer) = answers.get(&question.id) else {
            continue;
        };
        if answer.is_blank() {
            continue;
        }

        match (brief.slot(question.field), answer) {
            (FieldSlot::Text(slot), Answer::One(value)) => *slot = value.trim().to_string(),
            (FieldSlot::Text(slot), Answer::Many(values)) => *slot = join_non_blank(values),
            (FieldSlot::Optional(slot), Answer::One(value)) => {
                *slot = Some(value.trim().to_string())
            }
            (FieldSlot::Optional(slot), Answer::Many(values)) => {
                *slot = Some(join_non_blank(values))
            }
            (FieldSlot::List(slot), Answer::One(value)) => slot.push(value.trim().to_string()),
            (FieldSlot::List(slot), Answer::Many(values)) => slot.extend(
                values
                    .iter()
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| v.trim().to_string()),
            ),
        }
        applied += 1;
    }

    applied
}

fn join_non_blank(values: &[String]) -> String {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
