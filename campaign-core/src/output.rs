//! Fan a generation response out into a typed `CampaignOutput`.
//!
//! The agent answers either with a JSON object (top-level, or nested under
//! `campaignPlan` / `cards`), with text that embeds such an object, or with
//! plain prose. Prose becomes the strategy tab.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::output::OUTPUT_KEYS;
use crate::models::CampaignOutput;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Response carried neither text nor campaign sections")]
    Unrecognized,
}

/// Keys whose string value is taken as the response text.
const TEXT_KEYS: &[&str] = &["summary", "answer", "content", "output", "text"];

/// Containers the agent may nest the sections under.
const NESTED_KEYS: &[&str] = &["campaignPlan", "cards"];

pub fn parse_campaign_output(value: &Value) -> Result<CampaignOutput, OutputError> {
    match value {
        Value::String(text) => parse_text(text),
        Value::Object(map) => {
            if let Some(output) = from_object(map) {
                return Ok(with_summary(output, map));
            }
            for key in NESTED_KEYS {
                if let Some(Value::Object(nested)) = map.get(*key) {
                    if let Some(output) = from_object(nested) {
                        return Ok(with_summary(output, map));
                    }
                }
            }
            match response_text(map) {
                Some(text) => parse_text(text),
                None => Err(OutputError::Unrecognized),
            }
        }
        _ => Err(OutputError::Unrecognized),
    }
}

/// First non-blank text field of a response object.
pub fn response_text(map: &Map<String, Value>) -> Option<&str> {
    TEXT_KEYS
        .iter()
        .filter_map(|k| map.get(*k).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
}

fn parse_text(text: &str) -> Result<CampaignOutput, OutputError> {
    if text.trim().is_empty() {
        return Err(OutputError::Unrecognized);
    }

    if let Some(Value::Object(map)) = embedded_json(text) {
        if let Some(output) = from_object(&map) {
            return Ok(output);
        }
        for key in NESTED_KEYS {
            if let Some(Value::Object(nested)) = map.get(*key) {
                if let Some(output) = from_object(nested) {
                    return Ok(output);
                }
            }
        }
    }

    Ok(CampaignOutput {
        strategy: text.trim().to_string(),
        ..Default::default()
    })
}

/// Deserialize the recognised sections of an object, dropping sections whose
/// shape does not match instead of failing the whole response.
fn from_object(map: &Map<String, Value>) -> Option<CampaignOutput> {
    let mut sections = Map::new();
    for key in OUTPUT_KEYS {
        let Some(v) = map.get(*key) else { continue };
        let mut single = Map::new();
        single.insert((*key).to_string(), v.clone());
        match serde_json::from_value::<CampaignOutput>(Value::Object(single)) {
            Ok(_) => {
                sections.insert((*key).to_string(), v.clone());
            }
            Err(e) => tracing::warn!(section = %key, error = %e, "Dropping malformed output section"),
        }
    }

    if sections.is_empty() {
        return None;
    }
    serde_json::from_value(Value::Object(sections)).ok()
}

fn with_summary(mut output: CampaignOutput, map: &Map<String, Value>) -> CampaignOutput {
    if output.strategy.trim().is_empty() {
        if let Some(summary) = map.get("summary").and_then(Value::as_str) {
            output.strategy = summary.trim().to_string();
        }
    }
    output
}

/// Locate a JSON object inside free text: a ```json fence, the whole text, or
/// the span from the first `{` to the last `}`.
fn embedded_json(text: &str) -> Option<Value> {
    if let Some(start) = text.find("```json") {
        let body = &text[start + "```json".len()..];
        if let Some(end) = body.find("```") {
            if let Ok(v) = serde_json::from_str(body[..end].trim()) {
                return Some(v);
            }
        }
    }

    if let Ok(v) = serde_json::from_str(text.trim()) {
        return Some(v);
    }

    let open = text.find('{')?;
    let close = text.rfind('}')?;
    if close <= open {
        return None;
    }
    serde_json::from_str(&text[open..=close]).ok()
}
