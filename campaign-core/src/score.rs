//! Brief completeness score and analysis
//!
//! A single weighted checklist over the brief. The weights add up to 110 so a
//! brief can max out without every optional field; the score is clamped to 100.

use serde::{Deserialize, Serialize};

use crate::gaps::{detect_brief_gaps, has_paid_channels, is_regulated_sector, QuickQuestion};
use crate::models::brief::is_filled;
use crate::models::{BriefField, CampaignBriefData, Language};

pub const MAX_SCORE: u32 = 100;

/// Score at which a brief without required gaps is ready to generate.
pub const READY_THRESHOLD: u32 = 60;

struct Check {
    field: BriefField,
    label: (&'static str, &'static str),
    weight: u32,
    tip: (&'static str, &'static str),
    passes: fn(&CampaignBriefData) -> bool,
}

const CHECKS: &[Check] = &[
    Check {
        field: BriefField::Product,
        label: ("Producto", "Product"),
        weight: 10,
        tip: ("Describe el producto o servicio en una frase", "Describe the product or service in one sentence"),
        passes: |b: &CampaignBriefData| !b.product.trim().is_empty(),
    },
    Check {
        field: BriefField::Audience,
        label: ("Audiencia", "Audience"),
        weight: 10,
        tip: ("Define quién decide la compra", "Define who makes the buying decision"),
        passes: |b: &CampaignBriefData| !b.audience.trim().is_empty(),
    },
    Check {
        field: BriefField::Goals,
        label: ("Objetivos", "Goals"),
        weight: 10,
        tip: ("Fija un objetivo medible", "Set a measurable goal"),
        passes: |b: &CampaignBriefData| !b.goals.trim().is_empty(),
    },
    Check {
        field: BriefField::Budget,
        label: ("Presupuesto", "Budget"),
        weight: 10,
        tip: ("Indica el presupuesto total y su duración", "State the total budget and its duration"),
        passes: |b: &CampaignBriefData| !b.budget.trim().is_empty(),
    },
    Check {
        field: BriefField::Channels,
        label: ("Canales", "Channels"),
        weight: 10,
        tip: ("Selecciona al menos un canal", "Select at least one channel"),
        passes: |b: &CampaignBriefData| !b.channels.is_empty(),
    },
    Check {
        field: BriefField::Price,
        label: ("Precio", "Price"),
        weight: 15,
        tip: ("Añade el precio o rango de precio", "Add the price or price range"),
        passes: |b: &CampaignBriefData| is_filled(&b.price),
    },
    Check {
        field: BriefField::Margin,
        label: ("Margen", "Margin"),
        weight: 10,
        tip: ("Añade el margen para calcular el CPA máximo", "Add the margin to derive the maximum CPA"),
        passes: |b: &CampaignBriefData| is_filled(&b.margin),
    },
    Check {
        field: BriefField::MainPromise,
        label: ("Promesa principal", "Main promise"),
        weight: 15,
        tip: ("Escribe la promesa principal en una línea", "Write the main promise in one line"),
        passes: |b: &CampaignBriefData| is_filled(&b.main_promise),
    },
    Check {
        field: BriefField::Proof,
        label: ("Pruebas", "Proof"),
        weight: 10,
        tip: ("Aporta pruebas: testimonios, cifras o casos", "Provide proof: testimonials, figures or case studies"),
        passes: |b: &CampaignBriefData| !b.proof.is_empty(),
    },
    Check {
        field: BriefField::Competitors,
        label: ("Competidores", "Competitors"),
        weight: 5,
        tip: ("Nombra al menos un competidor", "Name at least one competitor"),
        passes: |b: &CampaignBriefData| !b.competitors.is_empty(),
    },
    Check {
        field: BriefField::Timeline,
        label: ("Calendario", "Timeline"),
        weight: 5,
        tip: ("Indica fechas de lanzamiento", "Give launch dates"),
        passes: |b: &CampaignBriefData| is_filled(&b.timeline),
    },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownItem {
    pub field: BriefField,
    pub label: String,
    pub score: u32,
    pub max: u32,
}

impl BreakdownItem {
    pub fn percentage(&self) -> u32 {
        if self.max == 0 {
            0
        } else {
            self.score * 100 / self.max
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefScore {
    pub score: u32,
    pub breakdown: Vec<BreakdownItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreGrade {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ScoreGrade {
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 80 => ScoreGrade::Excellent,
            s if s >= 60 => ScoreGrade::Good,
            s if s >= 40 => ScoreGrade::Fair,
            _ => ScoreGrade::Poor,
        }
    }

    pub fn label(self, language: Language) -> &'static str {
        match self {
            ScoreGrade::Excellent => language.pick("Excelente", "Excellent"),
            ScoreGrade::Good => language.pick("Bueno", "Good"),
            ScoreGrade::Fair => language.pick("Regular", "Fair"),
            ScoreGrade::Poor => language.pick("Insuficiente", "Poor"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BriefStatus {
    Ready,
    NeedsWork,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BriefAnalysis {
    pub score: u32,
    pub grade: ScoreGrade,
    pub status: BriefStatus,
    pub status_text: String,
    pub breakdown: Vec<BreakdownItem>,
    pub missing: Vec<String>,
    pub recommendations: Vec<String>,
    pub risks: Vec<String>,
    pub critical_questions: Vec<QuickQuestion>,
}

/// Weighted completeness score, clamped to [0, 100].
pub fn score_brief(brief: &CampaignBriefData, language: Language) -> BriefScore {
    let breakdown: Vec<BreakdownItem> = CHECKS
        .iter()
        .map(|check| BreakdownItem {
            field: check.field,
            label: language.pick(check.label.0, check.label.1).to_string(),
            score: if (check.passes)(brief) { check.weight } else { 0 },
            max: check.weight,
        })
        .collect();

    let raw: u32 = breakdown.iter().map(|b| b.score).sum();

    BriefScore {
        score: raw.min(MAX_SCORE),
        breakdown,
    }
}

/// Full analysis: score, grade, gaps, recommendations and risks.
pub fn analyze_brief(brief: &CampaignBriefData, language: Language) -> BriefAnalysis {
    let BriefScore { score, breakdown } = score_brief(brief, language);
    let gaps = detect_brief_gaps(brief, language);

    let failed: Vec<&Check> = CHECKS.iter().filter(|c| !(c.passes)(brief)).collect();
    let missing = failed
        .iter()
        .map(|c| language.pick(c.label.0, c.label.1).to_string())
        .collect();
    let recommendations = failed
        .iter()
        .map(|c| language.pick(c.tip.0, c.tip.1).to_string())
        .collect();

    let mut risks = Vec::new();
    if is_regulated_sector(brief) && brief.legal_requirements.trim().is_empty() {
        risks.push(
            language
                .pick(
                    "Sector regulado sin requisitos legales definidos",
                    "Regulated sector without defined legal requirements",
                )
                .to_string(),
        );
    }
    if has_paid_channels(brief) && brief.budget.trim().is_empty() {
        risks.push(
            language
                .pick(
                    "Canales pagados sin presupuesto asignado",
                    "Paid channels without an assigned budget",
                )
                .to_string(),
        );
    }

    let required_gaps = gaps.questions.iter().filter(|q| q.required).count();
    let status = if score >= READY_THRESHOLD && required_gaps == 0 {
        BriefStatus::Ready
    } else {
        BriefStatus::NeedsWork
    };

    let status_text = match status {
        BriefStatus::Ready => language
            .pick(
                "Brief listo para generar la campaña",
                "Brief ready to generate the campaign",
            )
            .to_string(),
        BriefStatus::NeedsWork if required_gaps > 0 => match language {
            Language::Es => format!("Faltan {} datos críticos antes de generar", required_gaps),
            Language::En => format!("{} critical items missing before generating", required_gaps),
        },
        BriefStatus::NeedsWork => language
            .pick(
                "Completa más campos para mejorar el resultado",
                "Fill in more fields to improve the result",
            )
            .to_string(),
    };

    BriefAnalysis {
        score,
        grade: ScoreGrade::from_score(score),
        status,
        status_text,
        breakdown,
        missing,
        recommendations,
        risks,
        critical_questions: gaps.questions,
    }
}
