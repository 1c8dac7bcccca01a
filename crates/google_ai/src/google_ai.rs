//! Gemini `generateContent` wire types and a single-shot request helper.
//!
//! Only the subset of the API used for text generation with an optional
//! response schema is modeled here; unknown response fields are ignored.

mod schema;

use anyhow::{Context as _, Result};
use http_client::{AsyncBody, HttpClient, Method, Request, StatusCode, read_body_to_string};
use serde::{Deserialize, Serialize};

pub use schema::{Schema, SchemaType};

pub const JSON_MIME_TYPE: &str = "application/json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// A request holding a single user turn.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content::user(prompt)],
            system_instruction: None,
            generation_config: None,
        }
    }

    /// Constrain the response to JSON matching `schema`.
    pub fn with_response_schema(mut self, schema: Schema) -> Self {
        let config = self.generation_config.get_or_insert_with(Default::default);
        config.response_mime_type = Some(JSON_MIME_TYPE.into());
        config.response_schema = Some(schema);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::text(text)],
            role: Some(Role::User),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Set on parts that carry model reasoning rather than the answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            thought: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Schema>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<GenerateContentCandidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

impl GenerateContentResponse {
    /// Concatenated answer text of the first candidate, skipping thought parts.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text = content
            .parts
            .iter()
            .filter(|part| part.thought != Some(true))
            .filter_map(|part| part.text.as_deref())
            .collect::<String>();
        if text.is_empty() { None } else { Some(text) }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentCandidate {
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: Option<u64>,
    #[serde(default)]
    pub candidates_token_count: Option<u64>,
    #[serde(default)]
    pub total_token_count: Option<u64>,
}

/// A non-success response from the API.
#[derive(Debug, thiserror::Error)]
#[error("Google AI request failed with status {status}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

pub async fn generate_content(
    client: &dyn HttpClient,
    api_url: &str,
    api_key: &str,
    model: &str,
    request: &GenerateContentRequest,
) -> Result<GenerateContentResponse> {
    let uri = format!(
        "{}/v1beta/models/{model}:generateContent",
        api_url.trim_end_matches('/')
    );
    let body = serde_json::to_string(request).context("serialize generateContent request")?;

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", JSON_MIME_TYPE)
        .header("x-goog-api-key", api_key)
        .body(AsyncBody::from(body))
        .context("build generateContent request")?;

    log::debug!("generateContent request to model {model}");
    let mut response = client
        .send(request)
        .await
        .context("send generateContent request")?;
    let body = read_body_to_string(&mut response).await?;

    let status = response.status();
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or(body);
        return Err(ApiError { status, message }.into());
    }

    let response: GenerateContentResponse =
        serde_json::from_str(&body).context("parse generateContent response")?;
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_deref())
    {
        log::warn!("prompt was blocked by the API: {reason}");
    }
    Ok(response)
}
