use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BrandTone {
    Cercano,
    #[default]
    Profesional,
    Premium,
    Canalla,
    Tech,
}

impl BrandTone {
    pub fn as_str(self) -> &'static str {
        match self {
            BrandTone::Cercano => "cercano",
            BrandTone::Profesional => "profesional",
            BrandTone::Premium => "premium",
            BrandTone::Canalla => "canalla",
            BrandTone::Tech => "tech",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmojiStyle {
    #[default]
    Pocos,
    Moderados,
    Muchos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PreferredCta {
    #[default]
    AgendaDemo,
    Compra,
    Descarga,
    Suscribete,
    Contacta,
}

impl PreferredCta {
    pub fn as_str(self) -> &'static str {
        match self {
            PreferredCta::AgendaDemo => "agenda-demo",
            PreferredCta::Compra => "compra",
            PreferredCta::Descarga => "descarga",
            PreferredCta::Suscribete => "suscribete",
            PreferredCta::Contacta => "contacta",
        }
    }
}

/// Brand guidelines applied to prompts and safety rewrites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrandKit {
    pub tone: BrandTone,
    /// 0 (casual) to 100 (formal).
    pub formality: u8,
    pub use_emojis: bool,
    pub emoji_style: EmojiStyle,
    pub forbidden_words: Vec<String>,
    pub preferred_words: Vec<String>,
    pub allowed_claims: Vec<String>,
    pub not_allowed_claims: Vec<String>,
    pub brand_examples_yes: Vec<String>,
    pub brand_examples_no: Vec<String>,
    #[serde(rename = "preferredCTA")]
    pub preferred_cta: PreferredCta,
}

impl Default for BrandKit {
    fn default() -> Self {
        Self {
            tone: BrandTone::Profesional,
            formality: 50,
            use_emojis: false,
            emoji_style: EmojiStyle::Pocos,
            forbidden_words: Vec::new(),
            preferred_words: Vec::new(),
            allowed_claims: Vec::new(),
            not_allowed_claims: Vec::new(),
            brand_examples_yes: Vec::new(),
            brand_examples_no: Vec::new(),
            preferred_cta: PreferredCta::AgendaDemo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brand_kit_wire_format() {
        let kit: BrandKit = serde_json::from_value(serde_json::json!({
            "tone": "premium",
            "formality": 80,
            "forbiddenWords": ["barato"],
            "preferredCTA": "suscribete"
        }))
        .unwrap();

        assert_eq!(kit.tone, BrandTone::Premium);
        assert_eq!(kit.formality, 80);
        assert_eq!(kit.forbidden_words, vec!["barato"]);
        assert_eq!(kit.preferred_cta, PreferredCta::Suscribete);
        assert!(!kit.use_emojis);

        let back = serde_json::to_value(&kit).unwrap();
        assert_eq!(back["preferredCTA"], "suscribete");
        assert_eq!(back["emojiStyle"], "pocos");
    }
}
