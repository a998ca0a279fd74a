//! Language model invocation
//!
//! The orchestrator only sees the [`ModelInvoker`] trait: a named prompt plus
//! a JSON input in, a JSON value out. [`OllamaInvoker`] is the production
//! implementation backed by a local Ollama server.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::ModelSettings;

const USER_AGENT: &str = concat!("clarity-grader/", env!("CARGO_PKG_VERSION"));
/// Hard ceiling on a single HTTP request; tier timeouts are applied by the caller
const REQUEST_CEILING: Duration = Duration::from_secs(600);

/// Model invocation errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// Caller stopped waiting
    #[error("AI analysis timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Network communication error
    #[error("Model transport error: {0}")]
    Transport(String),

    /// Model server returned an error response
    #[error("Model API error {0}: {1}")]
    Api(u16, String),

    /// Output did not match the expected schema
    #[error("Invalid model output: {0}")]
    InvalidOutput(String),
}

/// Named prompts, one per analysis tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromptName {
    #[serde(rename = "plainLanguageAnalysis")]
    Full,
    #[serde(rename = "plainLanguageAnalysisLite")]
    Lite,
    #[serde(rename = "plainLanguageAnalysisSuperLite")]
    SuperLite,
    #[serde(rename = "plainLanguageAnalysisUltraLite")]
    UltraLite,
}

impl PromptName {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptName::Full => "plainLanguageAnalysis",
            PromptName::Lite => "plainLanguageAnalysisLite",
            PromptName::SuperLite => "plainLanguageAnalysisSuperLite",
            PromptName::UltraLite => "plainLanguageAnalysisUltraLite",
        }
    }

    /// System instruction sent ahead of the JSON input
    pub fn instruction(&self) -> &'static str {
        match self {
            PromptName::Full => {
                "You are an expert in plain language and web accessibility. Analyze the website \
                 content, structure and image metadata provided as JSON. Return one strict JSON \
                 object with: overallScore, readabilityGradeLevel, totalWords, totalSentences, \
                 totalParagraphs, averageSentenceLength, totalImages, totalHeadings, totalLists, \
                 estimatedReadingTime, textClarityScore, structureClarityScore, \
                 visualClarityScore, textClarityFeedback, structureClarityFeedback, \
                 visualClarityFeedback, fleschReadingEase, tone, passiveVoicePercentage, \
                 imagesWithAltText, imagesWithoutAltText, mainIssues, recommendations and \
                 plainLanguagePrinciples. Scores are integers 0-100. Return only JSON."
            }
            PromptName::Lite => {
                "You are a plain-language evaluator. You will be given a short excerpt of website \
                 content. Return a strict JSON object with only these fields: overallScore, \
                 textClarityScore, textClarityFeedback, totalWords (optional), \
                 estimatedReadingTime (optional). Keep feedback to 1-2 sentences. Scores are \
                 integers 0-100. Return only JSON."
            }
            PromptName::SuperLite => {
                "You are a plain-language evaluator. You will be given a short excerpt of website \
                 content and a URL. Return a strict JSON object with only two fields: \
                 overallScore (0-100 integer) and shortFeedback (1 short sentence). Return only \
                 JSON."
            }
            PromptName::UltraLite => {
                "You are a plain-language evaluator. Given a very short excerpt (under 250 \
                 characters), return a minimal JSON object with two fields: overallScore (0-100 \
                 integer) and shortFeedback (one short sentence). Only return JSON. Be extremely \
                 brief and conservative."
            }
        }
    }
}

impl fmt::Display for PromptName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sends a structured prompt to a language model
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// Returns the model's JSON output, or fails
    async fn invoke(&self, prompt: PromptName, input: Value) -> Result<Value, ModelError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    format: &'static str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Ollama `/api/generate` client
pub struct OllamaInvoker {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OllamaInvoker {
    pub fn new(settings: &ModelSettings) -> Result<Self, ModelError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_CEILING)
            .build()
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/api/generate", settings.server_url.trim_end_matches('/')),
            model: settings.model.clone(),
        })
    }

    fn render_prompt(prompt: PromptName, input: &Value) -> String {
        format!("{}\n\nInput:\n{}", prompt.instruction(), input)
    }
}

#[async_trait]
impl ModelInvoker for OllamaInvoker {
    async fn invoke(&self, prompt: PromptName, input: Value) -> Result<Value, ModelError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: Self::render_prompt(prompt, &input),
            format: "json",
            stream: false,
        };

        tracing::debug!(prompt = %prompt, model = %self.model, "Invoking model");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ModelError::Api(status.as_u16(), error_text));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidOutput(e.to_string()))?;

        parse_model_json(&body.response)
    }
}

/// Parse a model reply as JSON
///
/// Reasoning models sometimes wrap the object in prose or think tags, so the
/// outermost `{...}` span is tried when the whole reply does not parse.
pub fn parse_model_json(reply: &str) -> Result<Value, ModelError> {
    if let Ok(value) = serde_json::from_str::<Value>(reply.trim()) {
        return Ok(value);
    }

    let span = reply
        .find('{')
        .zip(reply.rfind('}'))
        .filter(|(start, end)| start < end)
        .map(|(start, end)| &reply[start..=end]);

    match span {
        Some(candidate) => serde_json::from_str(candidate)
            .map_err(|e| ModelError::InvalidOutput(e.to_string())),
        None => Err(ModelError::InvalidOutput(
            "reply contains no JSON object".to_string(),
        )),
    }
}
