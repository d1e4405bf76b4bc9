//! Content safety checker
//!
//! Scans marketing copy for claims that are unverifiable, exaggerated,
//! superlative, or legally risky for the sector, and proposes a safer wording
//! for each hit from a fixed substitution table.
//!
//! Score: `100 - (15*high + 7*medium + 3*low)`, clamped to [0, 100].

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::models::{BrandKit, IssueType, SafetyIssue, SafetyReport, Severity};

/// Characters of context kept on each side of a match.
const CONTEXT_RADIUS: usize = 40;

const HIGH_PENALTY: u32 = 15;
const MEDIUM_PENALTY: u32 = 7;
const LOW_PENALTY: u32 = 3;

const NEEDS_EVIDENCE_SUFFIX: &str = " [REQUIERE EVIDENCIA O REFORMULACIÓN]";

const UNVERIFIABLE: &[&str] = &[
    "el mejor",
    "el más",
    "líder del mercado",
    "número uno",
    "garantizado",
    "100% efectivo",
    "resultados inmediatos",
    "sin esfuerzo",
    "todos consiguen",
    "siempre funciona",
    "nunca falla",
    r"multiplica por \d+",
    r"aumenta en \d+%",
    "revolucionario",
    "único en el mundo",
    "incomparable",
];

const EXAGGERATIONS: &[&str] = &[
    "increíble",
    "asombroso",
    "extraordinario",
    "milagroso",
    "mágico",
    "perfecto",
    "absoluto",
    "total",
    "completo éxito",
    "imposible de",
    "nunca has visto",
    "cambiará tu vida",
    "te hará rico",
];

const SUPERLATIVES: &[&str] = &[
    "el primero",
    "el único",
    "el mejor",
    "el más avanzado",
    "el más innovador",
    "el más completo",
];

const HEALTH_RISKS: &[&str] = &["cura", "elimina la enfermedad", "tratamiento definitivo", "sanación"];

const FINANCE_RISKS: &[&str] = &[
    "retorno garantizado",
    "sin riesgo",
    "gana dinero fácil",
    "inversión segura",
    "beneficio garantizado",
];

const GENERAL_LEGAL_RISKS: &[&str] = &[
    "aprobado por",
    "certificado por",
    "recomendado por expertos",
    "probado científicamente",
];

/// Substitution table family used to build the suggestion for a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rewrite {
    Claim,
    Exaggeration,
    Superlative,
    SuperlativeWithProof,
    Health,
    Finance,
    GeneralLegal,
}

impl Rewrite {
    fn table(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Rewrite::Claim => &[
                ("el mejor", "uno de los más valorados"),
                ("el más", "entre los más"),
                ("líder del mercado", "reconocido en el sector"),
                ("número uno", "referente en"),
                ("garantizado", "diseñado para"),
                ("100% efectivo", "altamente efectivo"),
                ("resultados inmediatos", "resultados en tiempo récord"),
                ("sin esfuerzo", "de forma sencilla"),
                ("todos consiguen", "nuestros clientes consiguen"),
                ("siempre funciona", "funciona de forma consistente"),
                ("nunca falla", "altamente fiable"),
                ("revolucionario", "innovador"),
                ("único en el mundo", "distintivo"),
            ],
            Rewrite::Exaggeration => &[
                ("increíble", "destacado"),
                ("asombroso", "notable"),
                ("extraordinario", "excepcional"),
                ("milagroso", "efectivo"),
                ("mágico", "intuitivo"),
                ("perfecto", "optimizado"),
                ("cambiará tu vida", "mejorará tu día a día"),
                ("imposible de", "difícil de"),
                ("nunca has visto", "poco habitual"),
            ],
            Rewrite::Superlative => &[
                ("el primero", "pionero"),
                ("el único", "uno de los pocos"),
                ("el mejor", "entre los mejores"),
                ("el más avanzado", "tecnología avanzada"),
                ("el más innovador", "altamente innovador"),
                ("el más completo", "solución completa"),
            ],
            Rewrite::SuperlativeWithProof => &[
                ("el primero", "el primero* (*según estudio X)"),
                ("el único", "el único* (*en segmento Y)"),
                ("el mejor", "el mejor* (*valorado por Z)"),
            ],
            Rewrite::Health => &[
                ("cura", "contribuye a mejorar"),
                ("elimina la enfermedad", "ayuda a controlar"),
                ("tratamiento definitivo", "tratamiento"),
                ("sanación", "bienestar"),
            ],
            Rewrite::Finance => &[
                ("retorno garantizado", "retorno potencial"),
                ("sin riesgo", "bajo riesgo (consultar condiciones)"),
                ("gana dinero fácil", "oportunidad de rentabilidad"),
                ("inversión segura", "inversión (sujeta a riesgo)"),
                ("beneficio garantizado", "beneficio potencial"),
            ],
            Rewrite::GeneralLegal => &[
                ("aprobado por", "utilizado por"),
                ("certificado por", "certificado por [especificar entidad]"),
                ("recomendado por expertos", "recomendado por profesionales del sector"),
                ("probado científicamente", "testeado / validado"),
            ],
        }
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| match RegexBuilder::new(p).case_insensitive(true).build() {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::error!(pattern = %p, error = %e, "Invalid safety pattern");
                None
            }
        })
        .collect()
}

static UNVERIFIABLE_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(UNVERIFIABLE));
static EXAGGERATION_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(EXAGGERATIONS));
static SUPERLATIVE_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(SUPERLATIVES));
static HEALTH_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(HEALTH_RISKS));
static FINANCE_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(FINANCE_RISKS));
static GENERAL_LEGAL_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(GENERAL_LEGAL_RISKS));

/// Everything a pattern family contributes to an issue besides the match itself.
struct Family<'a> {
    patterns: &'a [Regex],
    issue_type: IssueType,
    severity: Severity,
    rewrite: Rewrite,
    describe: fn(&str) -> String,
    category: Option<&'static str>,
    sector: Option<&'static str>,
}

impl Family<'_> {
    fn scan(&self, content: &str, issues: &mut Vec<SafetyIssue>) {
        for re in self.patterns {
            for m in re.find_iter(content) {
                let context = extract_context(content, m.start(), m.end());
                issues.push(SafetyIssue {
                    issue_type: self.issue_type,
                    severity: self.severity,
                    suggestion: make_safe_version(&context, m.as_str(), self.rewrite),
                    original: context,
                    issue: (self.describe)(m.as_str()),
                    category: self.category.map(str::to_string),
                    sector: self.sector.map(str::to_string),
                });
            }
        }
    }
}

/// Check copy for risky claims. `sector` enables sector-specific legal rules;
/// `has_proof` downgrades superlatives to low severity.
pub fn check_content_safety(content: &str, sector: Option<&str>, has_proof: bool) -> SafetyReport {
    let mut issues = Vec::new();

    Family {
        patterns: &UNVERIFIABLE_RE,
        issue_type: IssueType::UnverifiableClaim,
        severity: Severity::High,
        rewrite: Rewrite::Claim,
        describe: |m| format!("\"{}\" es un claim no verificable sin datos de respaldo", m),
        category: None,
        sector: None,
    }
    .scan(content, &mut issues);

    Family {
        patterns: &EXAGGERATION_RE,
        issue_type: IssueType::ExaggeratedPromise,
        severity: Severity::Medium,
        rewrite: Rewrite::Exaggeration,
        describe: |m| format!("\"{}\" es lenguaje exagerado que puede reducir credibilidad", m),
        category: None,
        sector: None,
    }
    .scan(content, &mut issues);

    Family {
        patterns: &SUPERLATIVE_RE,
        issue_type: IssueType::Superlative,
        severity: if has_proof { Severity::Low } else { Severity::High },
        rewrite: if has_proof {
            Rewrite::SuperlativeWithProof
        } else {
            Rewrite::Superlative
        },
        describe: |m| {
            format!(
                "\"{}\" es un superlativo que requiere evidencia legal para ser usado",
                m
            )
        },
        category: None,
        sector: None,
    }
    .scan(content, &mut issues);

    if let Some(sector) = sector {
        check_sector_risks(content, sector, &mut issues);
    }

    let count = |s: Severity| issues.iter().filter(|i| i.severity == s).count();
    let high = count(Severity::High);
    let medium = count(Severity::Medium);
    let low = count(Severity::Low);

    let score = safety_score(high, medium, low);

    tracing::debug!(score, high, medium, low, "Content safety check complete");

    SafetyReport {
        score,
        total_issues: issues.len(),
        high_severity: high,
        medium_severity: medium,
        low_severity: low,
        summary: summarize(score, issues.len(), high),
        issues,
    }
}

fn check_sector_risks(content: &str, sector: &str, issues: &mut Vec<SafetyIssue>) {
    let sector = sector.to_lowercase();
    let mentions = |keys: &[&str]| keys.iter().any(|k| sector.contains(k));

    if mentions(&["salud", "health", "medic", "farmac"]) {
        Family {
            patterns: &HEALTH_RE,
            issue_type: IssueType::LegalRisk,
            severity: Severity::High,
            rewrite: Rewrite::Health,
            describe: |m| {
                format!(
                    "\"{}\" es un claim regulado en sector salud. Requiere autorización sanitaria.",
                    m
                )
            },
            category: Some("Sector Salud"),
            sector: Some("health"),
        }
        .scan(content, issues);
    }

    if mentions(&["financ", "invers", "banco", "cripto"]) {
        Family {
            patterns: &FINANCE_RE,
            issue_type: IssueType::LegalRisk,
            severity: Severity::High,
            rewrite: Rewrite::Finance,
            describe: |m| {
                format!(
                    "\"{}\" es un claim regulado en sector financiero. Prohibido por normativa CNMV/SEC.",
                    m
                )
            },
            category: Some("Sector Financiero"),
            sector: Some("finance"),
        }
        .scan(content, issues);
    }

    Family {
        patterns: &GENERAL_LEGAL_RE,
        issue_type: IssueType::LegalRisk,
        severity: Severity::Medium,
        rewrite: Rewrite::GeneralLegal,
        describe: |m| format!("\"{}\" requiere documentación legal de respaldo", m),
        category: Some("Documentación Legal"),
        sector: None,
    }
    .scan(content, issues);
}

/// Context window of `CONTEXT_RADIUS` chars around `[start, end)`, with
/// `...` marking each truncated side. Offsets are byte offsets of a match.
fn extract_context(text: &str, start: usize, end: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .nth(CONTEXT_RADIUS - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let to = text[end..]
        .char_indices()
        .nth(CONTEXT_RADIUS)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());

    let mut context = String::with_capacity(to - from + 6);
    if from > 0 {
        context.push_str("...");
    }
    context.push_str(&text[from..to]);
    if to < text.len() {
        context.push_str("...");
    }
    context
}

fn make_safe_version(context: &str, matched: &str, rewrite: Rewrite) -> String {
    let matched = matched.to_lowercase();

    for (from, to) in rewrite.table() {
        if !matched.contains(from) {
            continue;
        }
        match RegexBuilder::new(&regex::escape(from))
            .case_insensitive(true)
            .build()
        {
            Ok(re) => return re.replace_all(context, *to).into_owned(),
            Err(e) => tracing::warn!(phrase = %from, error = %e, "Skipping rewrite rule"),
        }
    }

    format!("{}{}", context, NEEDS_EVIDENCE_SUFFIX)
}

fn safety_score(high: usize, medium: usize, low: usize) -> u8 {
    let penalty = high as u32 * HIGH_PENALTY + medium as u32 * MEDIUM_PENALTY + low as u32 * LOW_PENALTY;
    100u32.saturating_sub(penalty).min(100) as u8
}

fn summarize(score: u8, total_issues: usize, high: usize) -> String {
    match score {
        90..=100 => "Contenido seguro y verificable. Listo para publicar.".to_string(),
        70..=89 => format!(
            "Contenido mayormente seguro con {} ajustes menores recomendados.",
            total_issues
        ),
        50..=69 => format!(
            "Contenido con {} problemas detectados. {} de alta severidad requieren atención inmediata.",
            total_issues, high
        ),
        _ => format!(
            "ADVERTENCIA: Contenido con alto riesgo legal. {} claims críticos deben ser corregidos antes de publicar.",
            high
        ),
    }
}

/// Turn a suggestion into publishable text: drop context ellipses and trim.
pub fn apply_safety_suggestion(suggestion: &str) -> String {
    suggestion.replace("...", "").trim().to_string()
}

/// Prompt asking the text generator to rewrite copy with the high-severity
/// issues fixed, honouring the brand kit when one is given.
pub fn safety_rewrite_prompt(content: &str, issues: &[SafetyIssue], brand_kit: Option<&BrandKit>) -> String {
    let issues_list = issues
        .iter()
        .filter(|i| i.severity == Severity::High)
        .map(|i| format!("- {} → {}", i.original, i.issue))
        .collect::<Vec<_>>()
        .join("\n");

    let mut guidelines = vec![
        "- Elimina todos los superlativos no verificables".to_string(),
        "- Reemplaza promesas absolutas por afirmaciones demostrables".to_string(),
        "- Añade disclaimers cuando sea necesario".to_string(),
        "- Mantén el impacto y beneficio pero con lenguaje seguro".to_string(),
    ];
    if let Some(kit) = brand_kit {
        guidelines.push(format!("- Respeta tono de marca: {}", kit.tone.as_str()));
        if !kit.forbidden_words.is_empty() {
            guidelines.push(format!("- Evita: {}", kit.forbidden_words.join(", ")));
        }
    }

    format!(
        "Reescribe este contenido aplicando las correcciones de seguridad legal:\n\n\
         CONTENIDO ORIGINAL:\n{}\n\n\
         PROBLEMAS IDENTIFICADOS:\n{}\n\n\
         DIRECTRICES:\n{}\n\n\
         FORMATO: Devuelve solo el texto reescrito, sin comentarios adicionales.",
        content,
        issues_list,
        guidelines.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_copy_scores_100() {
        let report = check_content_safety(
            "Nuestro software ayuda a equipos de IT a gestionar servidores híbridos.",
            None,
            false,
        );
        assert_eq!(report.score, 100);
        assert_eq!(report.total_issues, 0);
        assert_eq!(report.summary, "Contenido seguro y verificable. Listo para publicar.");
    }

    #[test]
    fn test_garantizado_costs_15_points_per_occurrence() {
        let one = check_content_safety("Ahorro garantizado.", None, false);
        assert_eq!(one.high_severity, 1);
        assert_eq!(one.score, 85);

        let two = check_content_safety("Ahorro garantizado y éxito Garantizado.", None, false);
        assert_eq!(two.high_severity, 2);
        assert_eq!(two.score, 70);
        assert_eq!(two.issues[0].issue_type, IssueType::UnverifiableClaim);
        assert_eq!(two.issues[1].suggestion, "Ahorro diseñado para y éxito diseñado para.");
    }

    #[test]
    fn test_score_clamped_at_zero() {
        let text = "garantizado ".repeat(20);
        let report = check_content_safety(&text, None, false);
        assert_eq!(report.high_severity, 20);
        assert_eq!(report.score, 0);
        assert!(report.summary.starts_with("ADVERTENCIA"));
    }

    #[test]
    fn test_superlative_severity_depends_on_proof() {
        let without = check_content_safety("Somos el primero en España", None, false);
        let sup: Vec<_> = without
            .issues
            .iter()
            .filter(|i| i.issue_type == IssueType::Superlative)
            .collect();
        assert_eq!(sup.len(), 1);
        assert_eq!(sup[0].severity, Severity::High);
        assert_eq!(sup[0].suggestion, "Somos pionero en España");

        let with = check_content_safety("Somos el primero en España", None, true);
        let sup = with
            .issues
            .iter()
            .find(|i| i.issue_type == IssueType::Superlative)
            .unwrap();
        assert_eq!(sup.severity, Severity::Low);
        assert_eq!(sup.suggestion, "Somos el primero* (*según estudio X) en España");
        assert_eq!(with.score, 97);
    }

    #[test]
    fn test_exaggeration_is_medium() {
        let report = check_content_safety("Un resultado increíble", None, false);
        assert_eq!(report.medium_severity, 1);
        assert_eq!(report.score, 93);
        assert_eq!(report.issues[0].suggestion, "Un resultado destacado");
        assert_eq!(report.issues[0].issue_type, IssueType::ExaggeratedPromise);
    }

    #[test]
    fn test_sector_rules_only_with_sector() {
        let text = "Inversión segura con retorno garantizado";
        let plain = check_content_safety(text, None, false);
        assert!(plain.issues.iter().all(|i| i.issue_type != IssueType::LegalRisk));

        let finance = check_content_safety(text, Some("Banca e inversión"), false);
        let legal: Vec<_> = finance
            .issues
            .iter()
            .filter(|i| i.issue_type == IssueType::LegalRisk)
            .collect();
        assert_eq!(legal.len(), 2);
        assert!(legal.iter().all(|i| i.sector.as_deref() == Some("finance")));
        assert!(legal.iter().all(|i| i.category.as_deref() == Some("Sector Financiero")));
    }

    #[test]
    fn test_health_sector_and_general_legal() {
        let report = check_content_safety(
            "Tratamiento definitivo, probado científicamente",
            Some("Salud digital"),
            false,
        );
        let health = report.issues.iter().find(|i| i.sector.as_deref() == Some("health")).unwrap();
        assert_eq!(health.severity, Severity::High);
        assert!(health.suggestion.starts_with("tratamiento"));

        let general = report
            .issues
            .iter()
            .find(|i| i.category.as_deref() == Some("Documentación Legal"))
            .unwrap();
        assert_eq!(general.severity, Severity::Medium);
        assert!(general.suggestion.contains("testeado / validado"));
    }

    #[test]
    fn test_context_window_truncates_with_ellipses() {
        let prefix = "a".repeat(60);
        let suffix = "b".repeat(60);
        let text = format!("{} garantizado {}", prefix, suffix);
        let report = check_content_safety(&text, None, false);
        let original = &report.issues[0].original;
        assert!(original.starts_with("..."));
        assert!(original.ends_with("..."));
        // 40 + match + 40, plus two ellipses
        assert_eq!(original.chars().count(), 40 + "garantizado".len() + 40 + 6);
    }

    #[test]
    fn test_context_window_is_char_safe() {
        let text = "ñ".repeat(50) + " el único " + &"é".repeat(50);
        let report = check_content_safety(&text, None, false);
        assert!(report.issues.iter().any(|i| i.original.contains("el único")));
    }

    #[test]
    fn test_fallback_suggestion_when_no_rule_applies() {
        let report = check_content_safety("Multiplica por 3 tus ventas", None, false);
        assert_eq!(report.high_severity, 1);
        assert_eq!(
            report.issues[0].suggestion,
            "Multiplica por 3 tus ventas [REQUIERE EVIDENCIA O REFORMULACIÓN]"
        );
    }

    #[test]
    fn test_apply_suggestion_strips_ellipses() {
        assert_eq!(apply_safety_suggestion("...diseñado para ahorrar..."), "diseñado para ahorrar");
    }

    #[test]
    fn test_rewrite_prompt_lists_high_issues_and_brand() {
        let report = check_content_safety("Ahorro garantizado, un diseño increíble", None, false);
        let kit = BrandKit {
            forbidden_words: vec!["barato".to_string()],
            ..Default::default()
        };
        let prompt = safety_rewrite_prompt("Ahorro garantizado", &report.issues, Some(&kit));
        assert!(prompt.contains("PROBLEMAS IDENTIFICADOS:\n- "));
        assert!(prompt.contains("claim no verificable"));
        assert!(!prompt.contains("lenguaje exagerado"));
        assert!(prompt.contains("- Respeta tono de marca: profesional"));
        assert!(prompt.contains("- Evita: barato"));
    }
}
