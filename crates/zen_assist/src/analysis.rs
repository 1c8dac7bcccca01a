//! Structured analysis results returned by the model.

use serde::{Deserialize, Deserializer, Serialize};
use zen_core::ToneColor;

/// Tone, style suggestions, and grammar mistakes for one piece of text.
///
/// All three top-level fields are required. A response missing any of them
/// is rejected as a parse error rather than partially applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub tone: Tone,
    pub suggestions: Vec<String>,
    pub grammar_mistakes: Vec<GrammarMistake>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tone {
    pub name: String,
    /// Intensity, 0-100. Out-of-range values from the model are clamped.
    #[serde(deserialize_with = "deserialize_score")]
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarMistake {
    pub mistake: String,
    pub correction: String,
    pub explanation: String,
}

impl AnalysisResult {
    /// Parse the model's JSON text. Code fences around the payload are tolerated.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(strip_code_fence(text))
    }

    pub fn tone_color(&self) -> ToneColor {
        ToneColor::for_tone(&self.tone.name)
    }
}

fn deserialize_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let score = f64::deserialize(deserializer)?;
    if score.is_nan() {
        return Ok(0);
    }
    Ok(score.round().clamp(0.0, 100.0) as u8)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
