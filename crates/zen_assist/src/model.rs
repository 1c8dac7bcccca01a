//! The remote language model: analysis and free-form rewrites.

use std::sync::Arc;

use async_trait::async_trait;
use http_client::HttpClient;
use zen_core::ZenConfig;

use crate::analysis::AnalysisResult;
use crate::prompts::{self, TransformAction};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("no API key found in {0}")]
    MissingApiKey(String),
    /// Transport, authentication, quota, or server failure.
    #[error("model request failed: {0:#}")]
    Api(anyhow::Error),
    #[error("model response was not valid analysis JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("model returned an empty response")]
    EmptyResponse,
}

/// Anything that can analyze and rewrite text.
///
/// Every call goes to the model; nothing is cached, so analyzing the same
/// text twice makes two requests.
#[async_trait]
pub trait WritingModel: Send + Sync {
    async fn analyze_text(&self, text: &str) -> Result<AnalysisResult, ModelError>;

    /// Rewrite `text` according to `action` and return the model's text verbatim.
    async fn transform_text(&self, text: &str, action: &str) -> Result<String, ModelError>;
}

/// [`WritingModel`] backed by the Gemini API.
pub struct GoogleWritingModel {
    http_client: Arc<dyn HttpClient>,
    api_url: String,
    api_key: String,
    model: String,
}

impl GoogleWritingModel {
    /// Fails when no API key can be resolved; the assistant cannot run without one.
    pub fn new(http_client: Arc<dyn HttpClient>, config: &ZenConfig) -> Result<Self, ModelError> {
        let api_key = config
            .resolve_api_key()
            .ok_or_else(|| ModelError::MissingApiKey(config.api_key.describe()))?;
        if config.api_key.is_plaintext() {
            log::warn!("using an API key stored in plaintext in the config file");
        }
        Ok(Self {
            http_client,
            api_url: config.api_url.clone(),
            api_key,
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &google_ai::GenerateContentRequest) -> Result<String, ModelError> {
        let response = google_ai::generate_content(
            self.http_client.as_ref(),
            &self.api_url,
            &self.api_key,
            &self.model,
            request,
        )
        .await
        .map_err(ModelError::Api)?;

        if let Some(usage) = &response.usage_metadata {
            log::debug!(
                "{} used {} tokens",
                self.model,
                usage.total_token_count.unwrap_or_default()
            );
        }
        response.text().ok_or(ModelError::EmptyResponse)
    }
}

#[async_trait]
impl WritingModel for GoogleWritingModel {
    async fn analyze_text(&self, text: &str) -> Result<AnalysisResult, ModelError> {
        log::debug!("analyzing {} chars", text.len());
        let json = self.generate(&prompts::analysis_request(text)).await?;
        Ok(AnalysisResult::from_json(&json)?)
    }

    async fn transform_text(&self, text: &str, action: &str) -> Result<String, ModelError> {
        let action = TransformAction::parse(action);
        log::debug!("transforming {} chars with {:?}", text.len(), action.name());
        self.generate(&prompts::transform_request(text, &action)).await
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeWritingModel;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use std::collections::VecDeque;
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::{ModelError, WritingModel};
    use crate::analysis::{AnalysisResult, GrammarMistake, Tone};

    struct FakeResponse<T> {
        delay: Duration,
        result: Result<T, String>,
    }

    #[derive(Default)]
    struct FakeState {
        analyze_calls: Vec<String>,
        transform_calls: Vec<(String, String)>,
        analysis_responses: VecDeque<FakeResponse<AnalysisResult>>,
        transform_responses: VecDeque<FakeResponse<String>>,
    }

    /// A scripted [`WritingModel`].
    ///
    /// Queued responses are consumed in call order. With an empty queue,
    /// analysis returns [`FakeWritingModel::sample_analysis`] and transforms
    /// return the input tagged with the action name.
    #[derive(Default)]
    pub struct FakeWritingModel {
        state: Mutex<FakeState>,
    }

    impl FakeWritingModel {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn sample_analysis() -> AnalysisResult {
            AnalysisResult {
                tone: Tone {
                    name: "confident".into(),
                    score: 70,
                },
                suggestions: vec![
                    "Vary sentence length.".into(),
                    "Use a stronger verb in the opening.".into(),
                    "Trim the closing sentence.".into(),
                ],
                grammar_mistakes: vec![GrammarMistake {
                    mistake: "ur".into(),
                    correction: "your".into(),
                    explanation: "Spell out the possessive.".into(),
                }],
            }
        }

        pub fn push_analysis(&self, result: Result<AnalysisResult, String>, delay: Duration) {
            self.state
                .lock()
                .analysis_responses
                .push_back(FakeResponse { delay, result });
        }

        pub fn push_transform(&self, result: Result<String, String>, delay: Duration) {
            self.state
                .lock()
                .transform_responses
                .push_back(FakeResponse { delay, result });
        }

        pub fn analyze_calls(&self) -> Vec<String> {
            self.state.lock().analyze_calls.clone()
        }

        pub fn transform_calls(&self) -> Vec<(String, String)> {
            self.state.lock().transform_calls.clone()
        }
    }

    #[async_trait]
    impl WritingModel for FakeWritingModel {
        async fn analyze_text(&self, text: &str) -> Result<AnalysisResult, ModelError> {
            let response = {
                let mut state = self.state.lock();
                state.analyze_calls.push(text.to_string());
                state.analysis_responses.pop_front()
            };
            let FakeResponse { delay, result } = response.unwrap_or_else(|| FakeResponse {
                delay: Duration::ZERO,
                result: Ok(Self::sample_analysis()),
            });
            if !delay.is_zero() {
                smol::Timer::after(delay).await;
            }
            result.map_err(|message| ModelError::Api(anyhow::anyhow!(message)))
        }

        async fn transform_text(&self, text: &str, action: &str) -> Result<String, ModelError> {
            let response = {
                let mut state = self.state.lock();
                state
                    .transform_calls
                    .push((text.to_string(), action.to_string()));
                state.transform_responses.pop_front()
            };
            let FakeResponse { delay, result } = response.unwrap_or_else(|| FakeResponse {
                delay: Duration::ZERO,
                result: Ok(format!("[{action}] {text}")),
            });
            if !delay.is_zero() {
                smol::Timer::after(delay).await;
            }
            result.map_err(|message| ModelError::Api(anyhow::anyhow!(message)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_client::{AsyncBody, FakeHttpClient, Response};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use zen_core::ProviderKeyRef;

    fn config() -> ZenConfig {
        ZenConfig {
            api_url: "https://example.test".into(),
            api_key: ProviderKeyRef::from_inline("test-key"),
            ..ZenConfig::default()
        }
    }

    fn candidate_body(text: &str) -> String {
        serde_json::json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
        })
        .to_string()
    }

    /// A client that answers with `text` as the model output and records prompts.
    fn answering_client(text: &'static str) -> (Arc<dyn HttpClient>, Arc<Mutex<Vec<String>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let client = FakeHttpClient::create({
            let sent = sent.clone();
            move |request| {
                let sent = sent.clone();
                async move {
                    let body: serde_json::Value =
                        serde_json::from_slice(&request.into_body().into_bytes())?;
                    if let Some(prompt) = body["contents"][0]["parts"][0]["text"].as_str() {
                        sent.lock().push(prompt.to_string());
                    }
                    anyhow::Ok(
                        Response::builder()
                            .status(200)
                            .body(AsyncBody::from(candidate_body(text)))?,
                    )
                }
            }
        });
        (client, sent)
    }

    #[test]
    fn test_missing_api_key_aborts_construction() {
        let config = ZenConfig {
            api_key: ProviderKeyRef::from_env("ZEN_WRITER_TEST_UNSET_KEY_4242"),
            ..ZenConfig::default()
        };
        let result = GoogleWritingModel::new(FakeHttpClient::with_404_response(), &config);
        assert!(matches!(result, Err(ModelError::MissingApiKey(_))));
    }

    #[test]
    fn test_analyze_text_parses_structured_response() {
        let (client, sent) = answering_client(
            r#"{"tone": {"name": "joyful", "score": 64}, "suggestions": ["a", "b", "c"], "grammarMistakes": []}"#,
        );
        let model = GoogleWritingModel::new(client, &config()).unwrap();

        let analysis = smol::block_on(model.analyze_text("What a lovely day it is.")).unwrap();
        assert_eq!(analysis.tone.name, "joyful");
        assert_eq!(analysis.tone.score, 64);
        assert_eq!(analysis.suggestions, vec!["a", "b", "c"]);
        assert!(sent.lock()[0].contains("What a lovely day it is."));
    }

    #[test]
    fn test_malformed_analysis_is_a_parse_error() {
        let (client, _) = answering_client(r#"{"tone": {"name": "joyful", "score": 64}}"#);
        let model = GoogleWritingModel::new(client, &config()).unwrap();
        let error = smol::block_on(model.analyze_text("What a lovely day it is.")).unwrap_err();
        assert!(matches!(error, ModelError::Parse(_)), "{error:?}");
    }

    #[test]
    fn test_http_failure_is_an_api_error() {
        let model =
            GoogleWritingModel::new(FakeHttpClient::with_404_response(), &config()).unwrap();
        let error = smol::block_on(model.analyze_text("What a lovely day it is.")).unwrap_err();
        assert!(matches!(error, ModelError::Api(_)), "{error:?}");

        let error = smol::block_on(model.transform_text("text", "shorten")).unwrap_err();
        assert!(matches!(error, ModelError::Api(_)), "{error:?}");
    }

    #[test]
    fn test_transform_routes_actions_to_templates() {
        let (client, sent) = answering_client("rewritten\ntext");
        let model = GoogleWritingModel::new(client, &config()).unwrap();

        for action in ["shorten", "formalize", "Make Funny"] {
            let output = smol::block_on(model.transform_text("ok so here goes", action)).unwrap();
            assert_eq!(output, "rewritten\ntext");
        }

        let recorded = sent.lock().clone();
        assert_eq!(
            recorded,
            vec![
                format!("{}:\n\nok so here goes", prompts::SHORTEN_INSTRUCTION),
                format!("{}:\n\nok so here goes", prompts::FORMALIZE_INSTRUCTION),
                "Make Funny the following text:\n\nok so here goes".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_candidates_is_an_empty_response() {
        let client = FakeHttpClient::with_200_response(r#"{"candidates": []}"#);
        let model = GoogleWritingModel::new(client, &config()).unwrap();
        let error = smol::block_on(model.transform_text("text", "shorten")).unwrap_err();
        assert!(matches!(error, ModelError::EmptyResponse), "{error:?}");
    }
}
