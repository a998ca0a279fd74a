//! Tiered analysis orchestrator
//!
//! Picks the analysis tier, races each model call against its timeout and
//! falls back to the local heuristic when a reduced tier fails twice.
//!
//! | Tier      | Input                         | Attempts           | On failure        |
//! |-----------|-------------------------------|--------------------|-------------------|
//! | full      | text + structure + images     | 1 (full timeout)   | error             |
//! | lite      | text truncated to the budget  | 2 (T1, then T2)    | local heuristic   |
//! | superlite | text truncated to the budget  | 2 (T1, then T2)    | local heuristic   |
//! | ultralite | short excerpt                 | 2 (T1, then T2)    | local heuristic   |

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::config::{AnalysisSettings, TierTimeouts};
use crate::models::{
    AnalysisOutcome, AnalysisSource, CanonicalReport, ScrapeResult, Tier, TierFlags,
};
use crate::services::heuristic;
use crate::services::model_invoker::{ModelError, ModelInvoker, PromptName};
use crate::services::normalizer::normalize;

/// Appended to any text cut at a character budget
pub const TRUNCATION_MARKER: &str = "\n\n[...truncated]";

const HEURISTIC_PREVIEW_MESSAGE: &str = "Local heuristic estimate.";

/// Terminal analysis errors
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Please enter a valid URL.")]
    InvalidUrl,

    #[error("Analysis failed: {0}")]
    ModelFailed(ModelError),
}

/// Accept only absolute http(s) URLs with a host
pub fn validate_url(raw: &str) -> Result<Url, AnalysisError> {
    match Url::parse(raw.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(url),
        _ => Err(AnalysisError::InvalidUrl),
    }
}

/// Text cut at a character budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Excerpt<'a> {
    /// Kept text, without the marker
    pub body: &'a str,
    pub truncated: bool,
}

impl Excerpt<'_> {
    /// Text sent to the model; truncation is always marked
    pub fn with_marker(&self) -> String {
        if self.truncated {
            format!("{}{}", self.body, TRUNCATION_MARKER)
        } else {
            self.body.to_string()
        }
    }
}

/// Keep at most `max_chars` characters, cutting on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> Excerpt<'_> {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => Excerpt {
            body: &text[..cut],
            truncated: true,
        },
        None => Excerpt {
            body: text,
            truncated: false,
        },
    }
}

/// Ultra-lite and super-lite output schema
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BriefOutput {
    pub overall_score: f64,
    pub short_feedback: String,
}

pub type UltraLiteOutput = BriefOutput;
pub type SuperLiteOutput = BriefOutput;

/// Lite output schema
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiteOutput {
    pub overall_score: f64,
    pub text_clarity_score: f64,
    pub text_clarity_feedback: String,
    #[serde(default)]
    pub total_words: Option<f64>,
    #[serde(default)]
    pub estimated_reading_time: Option<String>,
}

/// Full output schema: required scores plus every other reported field
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullOutput {
    pub overall_score: f64,
    pub text_clarity_score: f64,
    pub structure_clarity_score: f64,
    pub visual_clarity_score: f64,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// Validated model output, one variant per tier
#[derive(Debug, Clone)]
pub enum TierOutput {
    Full(FullOutput),
    Lite(LiteOutput),
    SuperLite(SuperLiteOutput),
    UltraLite(UltraLiteOutput),
}

impl TierOutput {
    /// Validate raw model JSON against the tier's schema
    pub fn parse(tier: Tier, value: Value) -> Result<Self, ModelError> {
        let invalid = |e: serde_json::Error| ModelError::InvalidOutput(e.to_string());
        Ok(match tier {
            Tier::Full => TierOutput::Full(serde_json::from_value(value).map_err(invalid)?),
            Tier::Lite => TierOutput::Lite(serde_json::from_value(value).map_err(invalid)?),
            Tier::SuperLite => {
                TierOutput::SuperLite(serde_json::from_value(value).map_err(invalid)?)
            }
            Tier::UltraLite => {
                TierOutput::UltraLite(serde_json::from_value(value).map_err(invalid)?)
            }
        })
    }

    /// Canonical report; `analyzed_words` counts the text the model saw
    pub fn into_report(self, analyzed_words: usize) -> CanonicalReport {
        let loose = match self {
            TierOutput::Full(full) => {
                let mut fields = full.details;
                fields.insert("overallScore".into(), json!(full.overall_score));
                fields.insert("textClarityScore".into(), json!(full.text_clarity_score));
                fields.insert(
                    "structureClarityScore".into(),
                    json!(full.structure_clarity_score),
                );
                fields.insert("visualClarityScore".into(), json!(full.visual_clarity_score));
                Value::Object(fields)
            }
            TierOutput::Lite(lite) => json!({
                "overallScore": lite.overall_score,
                "textClarityScore": lite.text_clarity_score,
                "textClarityFeedback": lite.text_clarity_feedback,
                "totalWords": lite.total_words,
                "estimatedReadingTime": lite.estimated_reading_time,
            }),
            TierOutput::SuperLite(brief) | TierOutput::UltraLite(brief) => json!({
                "overallScore": brief.overall_score,
                "textClarityFeedback": brief.short_feedback,
                "totalWords": analyzed_words,
            }),
        };
        normalize(&loose)
    }
}

fn prompt_for(tier: Tier) -> PromptName {
    match tier {
        Tier::Full => PromptName::Full,
        Tier::Lite => PromptName::Lite,
        Tier::SuperLite => PromptName::SuperLite,
        Tier::UltraLite => PromptName::UltraLite,
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Runs one analysis at a chosen tier
pub struct AnalysisOrchestrator {
    invoker: Arc<dyn ModelInvoker>,
    settings: AnalysisSettings,
}

impl AnalysisOrchestrator {
    pub fn new(invoker: Arc<dyn ModelInvoker>, settings: AnalysisSettings) -> Self {
        Self { invoker, settings }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Merge request flags with configured defaults; cheapest tier wins
    pub fn select_tier(&self, request: TierFlags) -> Tier {
        self.settings.default_flags.merge(request).select()
    }

    /// Analyze scraped content at `tier`
    ///
    /// Reduced tiers always return an outcome (model or heuristic). The full
    /// tier returns [`AnalysisError::ModelFailed`] when its single attempt fails.
    pub async fn analyze(
        &self,
        scraped: &ScrapeResult,
        url: &str,
        tier: Tier,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        match self.settings.retry_timeouts(tier) {
            None => self.analyze_full(scraped, url).await,
            Some(timeouts) => {
                let budget = match tier {
                    Tier::UltraLite => self.settings.ultralite_excerpt_chars,
                    _ => self.settings.lite_max_chars,
                };
                let excerpt = truncate_chars(&scraped.text_content, budget);
                let input = match tier {
                    Tier::UltraLite => json!({ "excerpt": excerpt.with_marker(), "url": url }),
                    _ => json!({ "textContent": excerpt.with_marker(), "url": url }),
                };

                Ok(self
                    .analyze_with_retry(tier, input, excerpt.body, timeouts)
                    .await)
            }
        }
    }

    /// Heuristic-only outcome, computed without any model call
    pub fn heuristic_outcome(&self, text: &str, tier: Tier) -> AnalysisOutcome {
        heuristic_outcome(text, tier, HEURISTIC_PREVIEW_MESSAGE.to_string())
    }

    async fn analyze_full(
        &self,
        scraped: &ScrapeResult,
        url: &str,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let excerpt = truncate_chars(&scraped.text_content, self.settings.full_max_chars);
        let input = json!({
            "textContent": excerpt.with_marker(),
            "structure": scraped.structure,
            "imageMetadata": scraped.image_metadata,
            "url": url,
        });
        let timeout = self.settings.full_timeout;

        match self.attempt(Tier::Full, input, timeout).await {
            Ok(output) => {
                info!(tier = %Tier::Full, "Model analysis complete");
                Ok(model_outcome(Tier::Full, output, word_count(excerpt.body)))
            }
            Err(e) => {
                tracing::error!(
                    tier = %Tier::Full,
                    timeout_ms = timeout.as_millis() as u64,
                    error = %e,
                    "Full analysis failed"
                );
                Err(AnalysisError::ModelFailed(e))
            }
        }
    }

    async fn analyze_with_retry(
        &self,
        tier: Tier,
        input: Value,
        analyzed_text: &str,
        timeouts: TierTimeouts,
    ) -> AnalysisOutcome {
        let TierTimeouts {
            first_attempt,
            extended,
        } = timeouts;
        let words = word_count(analyzed_text);

        let first_error = match self.attempt(tier, input.clone(), first_attempt).await {
            Ok(output) => {
                info!(tier = %tier, "Model analysis complete");
                return model_outcome(tier, output, words);
            }
            Err(e) => e,
        };

        warn!(
            tier = %tier,
            timeout_ms = first_attempt.as_millis() as u64,
            extended_timeout_ms = extended.as_millis() as u64,
            error = %first_error,
            "First attempt failed; retrying with extended timeout"
        );

        match self.attempt(tier, input, extended).await {
            Ok(output) => {
                info!(tier = %tier, "Model analysis complete on retry");
                model_outcome(tier, output, words)
            }
            Err(e) => {
                warn!(tier = %tier, error = %e, "Retry failed; falling back to local heuristic");
                let message = format!(
                    "{} analysis timed out or failed after retry; returning local heuristic: {}",
                    tier.label(),
                    e
                );
                heuristic_outcome(analyzed_text, tier, message)
            }
        }
    }

    /// One model call raced against `timeout`; schema failures count as failures
    async fn attempt(
        &self,
        tier: Tier,
        input: Value,
        timeout: Duration,
    ) -> Result<TierOutput, ModelError> {
        let call = self.invoker.invoke(prompt_for(tier), input);
        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(value)) => TierOutput::parse(tier, value),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ModelError::Timeout(timeout)),
        }
    }
}

fn model_outcome(tier: Tier, output: TierOutput, analyzed_words: usize) -> AnalysisOutcome {
    AnalysisOutcome {
        tier,
        source: AnalysisSource::Model,
        message: tier.success_message().to_string(),
        analysis: output.into_report(analyzed_words),
    }
}

fn heuristic_outcome(text: &str, tier: Tier, message: String) -> AnalysisOutcome {
    AnalysisOutcome {
        tier,
        source: AnalysisSource::Heuristic,
        message,
        analysis: normalize(&heuristic::analyze_text(text).to_value()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    enum Step {
        Reply(Value),
        Fail,
        Hang,
    }

    struct ScriptedInvoker {
        steps: Mutex<VecDeque<Step>>,
        calls: Mutex<Vec<(PromptName, Value)>>,
    }

    impl ScriptedInvoker {
        fn new(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(PromptName, Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelInvoker for ScriptedInvoker {
        async fn invoke(&self, prompt: PromptName, input: Value) -> Result<Value, ModelError> {
            self.calls.lock().unwrap().push((prompt, input));
            let step = self.steps.lock().unwrap().pop_front().unwrap_or(Step::Hang);
            match step {
                Step::Reply(value) => Ok(value),
                Step::Fail => Err(ModelError::Transport("connection refused".to_string())),
                Step::Hang => std::future::pending().await,
            }
        }
    }

    fn scraped(text: &str) -> ScrapeResult {
        ScrapeResult {
            text_content: text.to_string(),
            structure: "{}".to_string(),
            image_metadata: "[]".to_string(),
            raw_html: None,
        }
    }

    fn orchestrator(invoker: Arc<ScriptedInvoker>) -> AnalysisOrchestrator {
        AnalysisOrchestrator::new(invoker, AnalysisSettings::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_lite_timeout_twice_falls_back_to_heuristic() {
        let invoker = ScriptedInvoker::new(vec![Step::Hang, Step::Hang]);
        let orch = orchestrator(invoker.clone());

        let outcome = orch
            .analyze(
                &scraped("Short sentence. Another short one."),
                "https://example.com",
                Tier::Lite,
            )
            .await
            .unwrap();

        assert!(outcome.is_fallback());
        assert_eq!(
            outcome.message,
            "Lite analysis timed out or failed after retry; returning local heuristic: \
             AI analysis timed out after 180000ms"
        );
        assert_eq!(outcome.analysis.overall_score, 90);
        assert_eq!(invoker.calls().len(), 2);
        assert_eq!(invoker.calls()[0].0, PromptName::Lite);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_after_first_failure() {
        let invoker = ScriptedInvoker::new(vec![
            Step::Fail,
            Step::Reply(json!({"overallScore": 72, "shortFeedback": "Mostly clear."})),
        ]);
        let orch = orchestrator(invoker.clone());

        let outcome = orch
            .analyze(&scraped("one two three four"), "https://example.com", Tier::SuperLite)
            .await
            .unwrap();

        assert!(!outcome.is_fallback());
        assert_eq!(outcome.message, "Super-lite analysis complete.");
        assert_eq!(outcome.analysis.overall_score, 72);
        assert_eq!(outcome.analysis.text_clarity_score, 72);
        assert_eq!(outcome.analysis.text_clarity_feedback, "Mostly clear.");
        assert_eq!(outcome.analysis.total_words, 4);
        assert_eq!(invoker.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_output_is_treated_like_timeout() {
        let invoker = ScriptedInvoker::new(vec![
            Step::Reply(json!({"score": "high"})),
            Step::Reply(json!({"overallScore": "n/a"})),
        ]);
        let orch = orchestrator(invoker);

        let outcome = orch
            .analyze(&scraped("Some text."), "https://example.com", Tier::UltraLite)
            .await
            .unwrap();

        assert!(outcome.is_fallback());
        assert!(outcome.message.starts_with(
            "Instant analysis timed out or failed after retry; \
             returning local heuristic: Invalid model output"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_failure_is_terminal() {
        let invoker = ScriptedInvoker::new(vec![Step::Hang]);
        let orch = orchestrator(invoker.clone());

        let result = orch
            .analyze(&scraped("Text."), "https://example.com", Tier::Full)
            .await;

        match result {
            Err(AnalysisError::ModelFailed(ModelError::Timeout(t))) => {
                assert_eq!(t, Duration::from_secs(300))
            }
            other => panic!("expected full-tier timeout, got {:?}", other),
        }
        assert_eq!(invoker.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_full_success_folds_flat_fields() {
        let invoker = ScriptedInvoker::new(vec![Step::Reply(json!({
            "overallScore": 81,
            "textClarityScore": 78,
            "structureClarityScore": 85,
            "visualClarityScore": 70,
            "fleschReadingEase": 61.5,
            "tone": "Formal",
            "mainIssues": [{"description": "Dense paragraphs"}]
        }))]);
        let orch = orchestrator(invoker.clone());

        let outcome = orch
            .analyze(&scraped("Body text."), "https://example.com", Tier::Full)
            .await
            .unwrap();

        assert_eq!(outcome.message, "Analysis complete.");
        assert_eq!(outcome.analysis.structure_clarity_score, 85);
        assert_eq!(outcome.analysis.readability_scores.flesch_reading_ease, 61.5);
        assert_eq!(outcome.analysis.voice_and_tone.tone, "Formal");
        assert_eq!(outcome.analysis.main_issues, vec!["Dense paragraphs"]);

        let (prompt, input) = &invoker.calls()[0];
        assert_eq!(*prompt, PromptName::Full);
        assert_eq!(input["structure"], "{}");
        assert_eq!(input["imageMetadata"], "[]");
    }

    #[tokio::test]
    async fn test_ultralite_sends_marked_excerpt() {
        let invoker = ScriptedInvoker::new(vec![Step::Reply(
            json!({"overallScore": 64, "shortFeedback": "Okay."}),
        )]);
        let orch = orchestrator(invoker.clone());
        let text = "é".repeat(500);

        let outcome = orch
            .analyze(&scraped(&text), "https://example.com", Tier::UltraLite)
            .await
            .unwrap();

        assert_eq!(outcome.message, "Instant analysis complete.");
        let (prompt, input) = &invoker.calls()[0];
        assert_eq!(*prompt, PromptName::UltraLite);
        let excerpt = input["excerpt"].as_str().unwrap();
        assert!(excerpt.ends_with(TRUNCATION_MARKER));
        assert_eq!(excerpt.chars().count(), 200 + TRUNCATION_MARKER.chars().count());
    }

    #[tokio::test]
    async fn test_lite_and_superlite_mark_truncated_text() {
        let settings = AnalysisSettings {
            lite_max_chars: 100,
            ..Default::default()
        };
        let text = "Plain words here. ".repeat(20);

        for (tier, prompt) in [
            (Tier::Lite, PromptName::Lite),
            (Tier::SuperLite, PromptName::SuperLite),
        ] {
            let reply = json!({
                "overallScore": 70,
                "textClarityScore": 72,
                "textClarityFeedback": "Fine.",
                "shortFeedback": "Fine."
            });
            let invoker = ScriptedInvoker::new(vec![Step::Reply(reply)]);
            let orch = AnalysisOrchestrator::new(invoker.clone(), settings.clone());

            let outcome = orch
                .analyze(&scraped(&text), "https://example.com", tier)
                .await
                .unwrap();
            assert!(!outcome.is_fallback());

            let (sent_prompt, input) = &invoker.calls()[0];
            assert_eq!(*sent_prompt, prompt);
            let sent = input["textContent"].as_str().unwrap();
            assert!(sent.ends_with(TRUNCATION_MARKER));
            assert_eq!(sent.chars().count(), 100 + TRUNCATION_MARKER.chars().count());
        }
    }

    #[tokio::test]
    async fn test_short_lite_text_is_sent_unmarked() {
        let invoker = ScriptedInvoker::new(vec![Step::Reply(json!({
            "overallScore": 70,
            "textClarityScore": 72,
            "textClarityFeedback": "Fine."
        }))]);
        let orch = orchestrator(invoker.clone());

        orch.analyze(&scraped("Short page."), "https://example.com", Tier::Lite)
            .await
            .unwrap();

        let (_, input) = &invoker.calls()[0];
        assert_eq!(input["textContent"], "Short page.");
    }

    #[tokio::test]
    async fn test_full_tier_marks_text_beyond_its_budget() {
        let settings = AnalysisSettings {
            lite_max_chars: 100,
            full_max_chars: 150,
            ..Default::default()
        };
        let invoker = ScriptedInvoker::new(vec![Step::Reply(json!({
            "overallScore": 80,
            "textClarityScore": 75,
            "structureClarityScore": 85,
            "visualClarityScore": 70
        }))]);
        let orch = AnalysisOrchestrator::new(invoker.clone(), settings);
        let mut page = scraped(&"x".repeat(400));
        page.structure = r#"{"totalHeadings":2}"#.to_string();

        orch.analyze(&page, "https://example.com", Tier::Full)
            .await
            .unwrap();

        let (prompt, input) = &invoker.calls()[0];
        assert_eq!(*prompt, PromptName::Full);
        let sent = input["textContent"].as_str().unwrap();
        assert!(sent.ends_with(TRUNCATION_MARKER));
        assert_eq!(sent.chars().count(), 150 + TRUNCATION_MARKER.chars().count());
        assert_eq!(input["structure"], r#"{"totalHeadings":2}"#);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_scores_text_without_marker() {
        let invoker = ScriptedInvoker::new(vec![Step::Fail, Step::Fail]);
        let orch = orchestrator(invoker);
        // 1000 words, 5000 chars; the lite budget keeps 800 words
        let text = "word ".repeat(1000);

        let outcome = orch
            .analyze(&scraped(&text), "https://example.com", Tier::Lite)
            .await
            .unwrap();

        assert!(outcome.is_fallback());
        assert!(outcome.message.ends_with("Model transport error: connection refused"));
        assert_eq!(outcome.analysis.total_words, 800);
    }

    #[test]
    fn test_select_tier_merges_configured_flags() {
        let settings = AnalysisSettings {
            default_flags: TierFlags {
                lite: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let orch = AnalysisOrchestrator::new(ScriptedInvoker::new(vec![]), settings);
        assert_eq!(orch.select_tier(TierFlags::default()), Tier::Lite);
        assert_eq!(
            orch.select_tier(TierFlags {
                ultralite: true,
                superlite: true,
                lite: false
            }),
            Tier::UltraLite
        );
    }

    #[test]
    fn test_heuristic_preview() {
        let orch = orchestrator(ScriptedInvoker::new(vec![]));
        let outcome = orch.heuristic_outcome("Short sentence. Another short one.", Tier::Full);
        assert_eq!(outcome.source, AnalysisSource::Heuristic);
        assert_eq!(outcome.analysis.overall_score, 90);
    }

    #[test]
    fn test_truncate_chars() {
        let short = truncate_chars("abc", 3);
        assert!(!short.truncated);
        assert_eq!(short.with_marker(), "abc");

        let cut = truncate_chars("añbcd", 2);
        assert!(cut.truncated);
        assert_eq!(cut.body, "añ");
        assert_eq!(cut.with_marker(), "añ\n\n[...truncated]");

        assert_eq!(truncate_chars("", 0).body, "");
        assert!(truncate_chars("x", 0).truncated);
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url(" http://example.com/page?q=1 ").is_ok());
        for bad in ["", "example.com", "ftp://example.com", "not a url", "http://"] {
            let err = validate_url(bad).unwrap_err();
            assert_eq!(err.to_string(), "Please enter a valid URL.", "input {:?}", bad);
        }
    }
}
