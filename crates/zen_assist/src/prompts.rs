//! Request payloads: the analysis prompt and schema, and rewrite instructions.

use google_ai::{Content, GenerateContentRequest, Schema};

pub const SHORTEN_INSTRUCTION: &str =
    "Make the following text more concise while preserving its meaning";
pub const FORMALIZE_INSTRUCTION: &str =
    "Rewrite the following text in a formal, professional tone";
pub const TRANSFORM_SYSTEM_INSTRUCTION: &str =
    "Respond with only the rewritten text. Do not add commentary, quotes, or formatting.";

/// A rewrite requested from the "more actions" menu or the toolbar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformAction {
    Shorten,
    Formalize,
    /// Any other verb phrase, e.g. "Make funny" or "Translate to French".
    Custom(String),
}

impl TransformAction {
    pub fn parse(action: &str) -> Self {
        match action {
            "shorten" => TransformAction::Shorten,
            "formalize" => TransformAction::Formalize,
            other => TransformAction::Custom(other.trim().to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TransformAction::Shorten => "shorten",
            TransformAction::Formalize => "formalize",
            TransformAction::Custom(action) => action,
        }
    }

    pub fn instruction(&self) -> String {
        match self {
            TransformAction::Shorten => SHORTEN_INSTRUCTION.to_string(),
            TransformAction::Formalize => FORMALIZE_INSTRUCTION.to_string(),
            TransformAction::Custom(action) => format!("{action} the following text"),
        }
    }
}

pub fn transform_prompt(text: &str, action: &TransformAction) -> String {
    format!("{}:\n\n{text}", action.instruction())
}

pub fn transform_request(text: &str, action: &TransformAction) -> GenerateContentRequest {
    GenerateContentRequest {
        system_instruction: Some(Content {
            parts: vec![google_ai::Part::text(TRANSFORM_SYSTEM_INSTRUCTION)],
            role: None,
        }),
        ..GenerateContentRequest::from_prompt(transform_prompt(text, action))
    }
}

pub fn analysis_prompt(text: &str) -> String {
    format!(
        "Analyze the following text. Identify its overall tone as a single word \
         with an intensity score from 0 to 100. Give exactly three concise \
         suggestions to improve its style. List every grammar mistake with its \
         correction and a short explanation; quote each mistake exactly as it \
         appears in the text.\n\nText:\n\"\"\"\n{text}\n\"\"\""
    )
}

/// Response schema matching [`crate::AnalysisResult`].
pub fn analysis_schema() -> Schema {
    Schema::object([
        (
            "tone",
            Schema::object([
                (
                    "name",
                    Schema::string().with_description("A single word describing the tone"),
                ),
                (
                    "score",
                    Schema::integer().with_description("Tone intensity from 0 to 100"),
                ),
            ]),
        ),
        (
            "suggestions",
            Schema::array(Schema::string()).with_exact_items(3),
        ),
        (
            "grammarMistakes",
            Schema::array(Schema::object([
                ("mistake", Schema::string()),
                ("correction", Schema::string()),
                ("explanation", Schema::string()),
            ])),
        ),
    ])
}

pub fn analysis_request(text: &str) -> GenerateContentRequest {
    GenerateContentRequest::from_prompt(analysis_prompt(text))
        .with_response_schema(analysis_schema())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_known_actions_use_fixed_templates() {
        assert_eq!(TransformAction::parse("shorten"), TransformAction::Shorten);
        assert_eq!(TransformAction::parse("formalize"), TransformAction::Formalize);
        assert_eq!(
            transform_prompt("Some text here.", &TransformAction::Shorten),
            format!("{SHORTEN_INSTRUCTION}:\n\nSome text here.")
        );
        assert_eq!(
            transform_prompt("Some text here.", &TransformAction::Formalize),
            format!("{FORMALIZE_INSTRUCTION}:\n\nSome text here.")
        );
    }

    #[test]
    fn test_other_actions_prefix_the_generic_template() {
        let action = TransformAction::parse("Make Funny");
        assert_eq!(action, TransformAction::Custom("Make Funny".into()));
        assert_eq!(action.name(), "Make Funny");
        assert_eq!(
            transform_prompt("hi there", &action),
            "Make Funny the following text:\n\nhi there"
        );
    }

    #[test]
    fn test_analysis_request_embeds_text_and_schema() {
        let request = analysis_request("The quick brown fox.");
        let json = serde_json::to_value(&request).unwrap();

        let prompt = json["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("\"\"\"\nThe quick brown fox.\n\"\"\""));

        let schema = &json["generationConfig"]["responseSchema"];
        assert_eq!(
            schema["propertyOrdering"],
            serde_json::json!(["tone", "suggestions", "grammarMistakes"])
        );
        assert_eq!(schema["properties"]["suggestions"]["minItems"], 3);
        assert_eq!(
            schema["properties"]["grammarMistakes"]["items"]["required"],
            serde_json::json!(["mistake", "correction", "explanation"])
        );
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn test_transform_request_has_no_schema() {
        let json = serde_json::to_value(transform_request("x", &TransformAction::Shorten)).unwrap();
        assert!(json.get("generationConfig").is_none());
        assert_eq!(
            json["systemInstruction"]["parts"][0]["text"],
            TRANSFORM_SYSTEM_INSTRUCTION
        );
    }
}
