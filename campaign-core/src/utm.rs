use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum UtmError {
    #[error("Invalid base URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Missing required UTM parameter: {0}")]
    MissingParam(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UtmParams {
    pub source: String,
    pub medium: String,
    pub campaign: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
}

/// Append `utm_*` parameters to `base_url`, keeping its existing query.
pub fn build_utm_url(base_url: &str, params: &UtmParams) -> Result<String, UtmError> {
    let mut url = Url::parse(base_url.trim()).map_err(|source| UtmError::InvalidUrl {
        url: base_url.to_string(),
        source,
    })?;

    let required = [
        ("utm_source", "source", params.source.as_str()),
        ("utm_medium", "medium", params.medium.as_str()),
        ("utm_campaign", "campaign", params.campaign.as_str()),
    ];
    for (_, name, value) in &required {
        if value.trim().is_empty() {
            return Err(UtmError::MissingParam(*name));
        }
    }

    {
        let mut query = url.query_pairs_mut();
        for (key, _, value) in &required {
            query.append_pair(key, value.trim());
        }
        let optional = [("utm_content", &params.content), ("utm_term", &params.term)];
        for (key, value) in optional {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                query.append_pair(key, v);
            }
        }
    }

    Ok(url.to_string())
}
