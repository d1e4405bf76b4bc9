//! Brief → natural-language prompt serialization.

use serde::{Deserialize, Serialize};

use crate::models::{BrandKit, CampaignBriefData, Language};

/// `context.campaignContext` block of a Foundry payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
}

/// Output sections requested from the agent, as (wire key, es, en).
const SECTIONS: &[(&str, &str, &str)] = &[
    ("overview", "Resumen ejecutivo de la campaña", "Campaign executive overview"),
    ("strategy", "Estrategia y posicionamiento", "Strategy and positioning"),
    ("creativeRoutes", "Rutas creativas (safe, interesting, bold)", "Creative routes (safe, interesting, bold)"),
    ("funnelBlueprint", "Blueprint de funnel por fase", "Funnel blueprint by phase"),
    ("paidPack", "Paid pack: estructura, audiencias, copies, presupuesto y tests", "Paid pack: structure, audiences, copy, budget and tests"),
    ("landingKit", "Landing kit: secciones, formulario, FAQs y señales de confianza", "Landing kit: sections, form, FAQs and trust signals"),
    ("contentCalendar", "Calendario de contenidos", "Content calendar"),
    ("copyVariations", "Variaciones de copy por ángulo", "Copy variations by angle"),
    ("emailFlow", "Flujo de emails", "Email flow"),
    ("whatsappFlow", "Flujo de WhatsApp", "WhatsApp flow"),
    ("experimentPlan", "Plan de experimentos", "Experiment plan"),
    ("measurementUtms", "Medición y UTMs", "Measurement and UTMs"),
    ("risks", "Riesgos y mitigaciones", "Risks and mitigations"),
    ("executionChecklist", "Checklist de ejecución", "Execution checklist"),
];

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

fn push_line(out: &mut String, label: &str, value: Option<&str>) {
    if let Some(v) = value.and_then(non_empty) {
        out.push_str("- ");
        out.push_str(label);
        out.push_str(": ");
        out.push_str(v);
        out.push('\n');
    }
}

fn push_list(out: &mut String, label: &str, values: &[String]) {
    let joined = values
        .iter()
        .filter_map(|v| non_empty(v))
        .collect::<Vec<_>>()
        .join(", ");
    push_line(out, label, Some(joined.as_str()));
}

/// Serialize a brief (and optional brand kit) into the generation prompt.
pub fn brief_to_prompt(brief: &CampaignBriefData, language: Language, brand_kit: Option<&BrandKit>) -> String {
    let l = |es: &'static str, en: &'static str| language.pick(es, en);
    let mut out = String::new();

    out.push_str(l(
        "Genera un plan de campaña de marketing completo a partir de este brief.\n\n",
        "Generate a complete marketing campaign plan from this brief.\n\n",
    ));

    out.push_str(l("BRIEF:\n", "BRIEF:\n"));
    push_line(&mut out, l("Producto", "Product"), Some(brief.product.as_str()));
    push_line(&mut out, l("Precio", "Price"), brief.price.as_deref());
    push_line(&mut out, l("Promoción", "Promotion"), brief.promo.as_deref());
    push_line(&mut out, l("Garantía", "Guarantee"), brief.guarantee.as_deref());
    push_line(&mut out, "USP", brief.usp.as_deref());
    push_line(&mut out, l("Promesa principal", "Main promise"), brief.main_promise.as_deref());
    push_line(&mut out, l("Objetivo", "Objective"), Some(brief.objective.as_str()));
    push_line(&mut out, "KPI", Some(brief.kpi.as_str()));
    push_line(&mut out, l("Metas", "Goals"), Some(brief.goals.as_str()));
    push_line(&mut out, l("Audiencia", "Audience"), Some(brief.audience.as_str()));
    push_line(&mut out, l("Segmentos", "Segments"), Some(brief.segments.as_str()));
    push_line(&mut out, l("Dolores", "Pains"), Some(brief.pains.as_str()));
    push_line(&mut out, l("Objeciones", "Objections"), Some(brief.objections.as_str()));
    push_line(&mut out, l("Contexto de compra", "Buying context"), Some(brief.buying_context.as_str()));
    push_list(&mut out, l("Canales", "Channels"), &brief.channels);
    push_line(&mut out, l("Presupuesto", "Budget"), Some(brief.budget.as_str()));
    push_line(&mut out, l("Margen", "Margin"), brief.margin.as_deref());
    push_line(&mut out, "Timing", Some(brief.timing.as_str()));
    push_line(&mut out, "Timeline", brief.timeline.as_deref());
    push_line(&mut out, l("Geografía", "Geography"), Some(brief.geography.as_str()));
    push_line(&mut out, l("Idioma", "Language"), Some(brief.language.as_str()));
    push_line(&mut out, l("Tono", "Tone"), Some(brief.tone.as_str()));
    push_line(&mut out, l("Voz de marca", "Brand voice"), Some(brief.brand_voice.as_str()));
    push_list(&mut out, l("Pruebas", "Proof"), &brief.proof);
    push_list(&mut out, l("Competidores", "Competitors"), &brief.competitors);
    push_line(&mut out, l("Palabras prohibidas", "Forbidden words"), Some(brief.forbidden_words.as_str()));
    push_line(&mut out, l("Claims permitidos", "Allowed claims"), Some(brief.allowed_claims.as_str()));
    push_line(&mut out, l("Requisitos legales", "Legal requirements"), Some(brief.legal_requirements.as_str()));
    push_line(&mut out, l("Assets disponibles", "Available assets"), Some(brief.available_assets.as_str()));
    push_line(&mut out, "Links", Some(brief.links.as_str()));

    if let Some(kit) = brand_kit {
        out.push_str(l("\nBRAND KIT:\n", "\nBRAND KIT:\n"));
        push_line(&mut out, l("Tono", "Tone"), Some(kit.tone.as_str()));
        push_line(&mut out, l("Formalidad (0-100)", "Formality (0-100)"), Some(kit.formality.to_string().as_str()));
        push_line(
            &mut out,
            "Emojis",
            Some(if kit.use_emojis { l("sí", "yes") } else { "no" }),
        );
        push_list(&mut out, l("Palabras preferidas", "Preferred words"), &kit.preferred_words);
        push_list(&mut out, l("Palabras prohibidas", "Forbidden words"), &kit.forbidden_words);
        push_list(&mut out, l("Claims permitidos", "Allowed claims"), &kit.allowed_claims);
        push_list(&mut out, l("Claims no permitidos", "Claims not allowed"), &kit.not_allowed_claims);
        push_list(&mut out, l("Ejemplos on-brand", "On-brand examples"), &kit.brand_examples_yes);
        push_list(&mut out, l("Ejemplos off-brand", "Off-brand examples"), &kit.brand_examples_no);
        push_line(&mut out, l("CTA preferido", "Preferred CTA"), Some(kit.preferred_cta.as_str()));
    }

    out.push_str(l("\nSECCIONES A ENTREGAR:\n", "\nSECTIONS TO DELIVER:\n"));
    for &(key, es, en) in SECTIONS {
        out.push_str(&format!("- {}: {}\n", key, l(es, en)));
    }

    out.push_str(l(
        "\nResponde con un único objeto JSON cuyas claves sean exactamente las secciones anteriores.",
        "\nAnswer with a single JSON object whose keys are exactly the sections above.",
    ));
    out
}

/// Build the campaign context sent alongside the prompt.
pub fn campaign_context(brief: &CampaignBriefData, brand_kit: Option<&BrandKit>) -> CampaignContext {
    let owned = |v: &str| non_empty(v).map(str::to_string);
    let target = owned(&brief.audience).or_else(|| owned(&brief.segments));
    let channels = (!brief.channels.is_empty()).then(|| brief.channels.clone());
    let brand_tone = brand_kit
        .map(|k| k.tone.as_str().to_string())
        .or_else(|| owned(&brief.tone));

    CampaignContext {
        product: owned(&brief.product),
        target,
        channels,
        brand_tone,
        budget: owned(&brief.budget),
    }
}
