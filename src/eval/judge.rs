//! LLM-as-judge scoring.
//!
//! A second Bedrock model grades each answer against the golden answer with
//! a fixed rubric, in the style of G-Eval: the judge returns a 0-10 score
//! plus a rationale, and the score is normalized to [0, 1].

use super::test_cases::EvaluationCase;
use crate::bedrock::BedrockHttp;
use crate::config::{Config, EvaluationConfig};
use crate::error::{RagError, Result};
use crate::knowledge_base::format_context;
use crate::llm::{ConverseClient, Prompts};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A model that can grade answers.
#[async_trait]
pub trait JudgeModel: Send + Sync {
    /// Send a fully composed instruction and return the raw reply.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Display name recorded on metric results.
    fn name(&self) -> &str;
}

/// Judge backed by the Bedrock `Converse` API.
pub struct BedrockJudge {
    client: ConverseClient,
    name: String,
}

impl BedrockJudge {
    pub fn new(client: ConverseClient, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
        }
    }

    /// Create from the `judge` section of the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = BedrockHttp::new(config)?;
        Ok(Self::new(
            ConverseClient::new(http, &config.judge),
            config.judge.model_name.clone(),
        ))
    }
}

#[async_trait]
impl JudgeModel for BedrockJudge {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.client.complete(prompt).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Outcome of one metric on one case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    pub name: String,
    /// Normalized score in [0, 1].
    pub score: f64,
    pub threshold: f64,
    pub success: bool,
    /// The judge's rationale.
    pub reason: String,
    pub evaluation_model: String,
    /// Set when the judge could not be reached or its reply was unusable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Judge verdict as requested in the prompt.
#[derive(Debug, Deserialize)]
struct Verdict {
    score: f64,
    #[serde(default)]
    reason: String,
}

/// The answer-accuracy metric.
#[derive(Debug, Clone)]
pub struct GEvalMetric {
    name: String,
    criteria: String,
    threshold: f64,
    strict_mode: bool,
}

impl GEvalMetric {
    /// Name recorded on results of the default metric.
    pub const NAME: &'static str = "response_accuracy_metric";

    pub fn new(threshold: f64, strict_mode: bool) -> Self {
        Self {
            name: Self::NAME.to_string(),
            criteria: Prompts::evaluation_criteria().to_string(),
            threshold,
            strict_mode,
        }
    }

    pub fn from_config(config: &EvaluationConfig) -> Self {
        Self::new(config.threshold, config.strict_mode)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Effective threshold; strict mode only passes perfect scores.
    pub fn threshold(&self) -> f64 {
        if self.strict_mode { 1.0 } else { self.threshold }
    }

    /// Compose the judge instruction for one case.
    pub fn build_prompt(&self, case: &EvaluationCase) -> String {
        let context = format_context(&case.context);
        Prompts::fill(
            Prompts::judge_answer(),
            &[
                ("criteria", self.criteria.as_str()),
                ("input", case.input.as_str()),
                ("actual_output", case.actual_output.as_str()),
                ("expected_output", case.expected_output.as_str()),
                ("context", context.as_str()),
            ],
        )
    }

    /// Score one case. Judge failures score 0 with `error` set.
    pub async fn measure(&self, judge: &dyn JudgeModel, case: &EvaluationCase) -> MetricResult {
        let prompt = self.build_prompt(case);

        let verdict = match judge.generate(&prompt).await {
            Ok(reply) => {
                debug!(%reply, "judge reply");
                Self::parse_verdict(&reply)
            }
            Err(e) => Err(e),
        };

        match verdict {
            Ok((score, reason)) => self.result(score, reason, judge.name(), None),
            Err(e) => {
                warn!(error = %e, input = %case.input, "judge evaluation failed");
                self.result(
                    0.0,
                    format!("Evaluation failed: {}", e),
                    judge.name(),
                    Some(e.to_string()),
                )
            }
        }
    }

    fn result(
        &self,
        normalized: f64,
        reason: String,
        model: &str,
        error: Option<String>,
    ) -> MetricResult {
        let threshold = self.threshold();
        let score = if self.strict_mode {
            if normalized >= 1.0 { 1.0 } else { 0.0 }
        } else {
            normalized
        };

        MetricResult {
            name: self.name.clone(),
            score,
            threshold,
            success: score >= threshold,
            reason,
            evaluation_model: model.to_string(),
            error,
        }
    }

    /// Parse the judge reply into a normalized score and rationale.
    fn parse_verdict(response: &str) -> Result<(f64, String)> {
        let json_str = Self::extract_json(response);

        let verdict: Verdict = serde_json::from_str(&json_str).map_err(|e| {
            RagError::Parse(format!(
                "Failed to parse judge response: {}. Response: {}",
                e, response
            ))
        })?;

        if !verdict.score.is_finite() {
            return Err(RagError::Parse(format!(
                "Judge returned a non-finite score: {}",
                response
            )));
        }

        Ok(((verdict.score / 10.0).clamp(0.0, 1.0), verdict.reason))
    }

    /// Extract JSON from response.
    fn extract_json(response: &str) -> String {
        let response = response.trim();

        if response.starts_with("```") {
            if let Some(end) = response.rfind("```") {
                let start = response.find('\n').map(|n| n + 1).unwrap_or(3);
                if end > start {
                    return response[start..end].trim().to_string();
                }
            }
        }

        if let Some(start) = response.find('{') {
            if let Some(end) = response.rfind('}') {
                if end > start {
                    return response[start..=end].to_string();
                }
            }
        }

        response.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedJudge, evaluation_case};

    #[test]
    fn test_parse_verdict() {
        let (score, reason) =
            GEvalMetric::parse_verdict(r#"{"score": 8, "reason": "Mostly right"}"#).unwrap();
        assert!((score - 0.8).abs() < 1e-9);
        assert_eq!(reason, "Mostly right");
    }

    #[test]
    fn test_parse_verdict_fenced_and_clamped() {
        let reply = "```json\n{\"score\": 14, \"reason\": \"generous\"}\n```";
        let (score, _) = GEvalMetric::parse_verdict(reply).unwrap();
        assert_eq!(score, 1.0);

        let reply = "Here is my verdict: {\"score\": -2, \"reason\": \"bad\"} Thanks.";
        let (score, _) = GEvalMetric::parse_verdict(reply).unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_parse_verdict_rejects_prose() {
        assert!(GEvalMetric::parse_verdict("I think it is fine.").is_err());
    }

    #[test]
    fn test_prompt_contains_case_fields() {
        let metric = GEvalMetric::new(0.7, false);
        let case = evaluation_case(
            "Who wrote it?",
            "Alice wrote it.",
            "Alice",
            &["Alice wrote the book.", "It was 1999."],
        );
        let prompt = metric.build_prompt(&case);

        assert!(prompt.contains("Factual accuracy"));
        assert!(prompt.contains("Input:\nWho wrote it?"));
        assert!(prompt.contains("Actual Output:\nAlice wrote it."));
        assert!(prompt.contains("Expected Output:\nAlice"));
        assert!(prompt.contains("Context:\nAlice wrote the book.\n\nIt was 1999."));
        assert!(prompt.contains("\"score\": <0-10>"));
    }

    #[tokio::test]
    async fn test_measure_success_follows_threshold() {
        let metric = GEvalMetric::new(0.7, false);
        let judge = ScriptedJudge::new("Judge")
            .reply("good", r#"{"score": 7, "reason": "ok"}"#)
            .reply("weak", r#"{"score": 6, "reason": "meh"}"#);

        let good = metric
            .measure(&judge, &evaluation_case("q", "good", "e", &[]))
            .await;
        assert!((good.score - 0.7).abs() < 1e-9);
        assert!(good.success);
        assert_eq!(good.threshold, 0.7);
        assert_eq!(good.name, GEvalMetric::NAME);
        assert_eq!(good.evaluation_model, "Judge");

        let weak = metric
            .measure(&judge, &evaluation_case("q", "weak", "e", &[]))
            .await;
        assert!(!weak.success);
        assert_eq!(weak.reason, "meh");
    }

    #[tokio::test]
    async fn test_strict_mode_is_binary() {
        let metric = GEvalMetric::new(0.5, true);
        assert_eq!(metric.threshold(), 1.0);

        let judge = ScriptedJudge::new("Judge")
            .reply("perfect", r#"{"score": 10, "reason": "exact"}"#)
            .reply("close", r#"{"score": 9, "reason": "almost"}"#);

        let perfect = metric
            .measure(&judge, &evaluation_case("q", "perfect", "e", &[]))
            .await;
        assert_eq!(perfect.score, 1.0);
        assert!(perfect.success);

        let close = metric
            .measure(&judge, &evaluation_case("q", "close", "e", &[]))
            .await;
        assert_eq!(close.score, 0.0);
        assert!(!close.success);
    }

    #[tokio::test]
    async fn test_judge_failure_is_recorded() {
        let judge = ScriptedJudge::new("Judge");
        let case = evaluation_case("q", "unscripted", "e", &[]);

        let result = GEvalMetric::new(0.7, false).measure(&judge, &case).await;
        assert_eq!(result.score, 0.0);
        assert!(!result.success);
        assert_eq!(result.success, result.score >= result.threshold);
        assert!(result.error.is_some());
        assert!(result.reason.starts_with("Evaluation failed:"));

        let strict = GEvalMetric::new(0.7, true).measure(&judge, &case).await;
        assert_eq!(strict.threshold, 1.0);
        assert_eq!(strict.success, strict.score >= strict.threshold);
        assert!(!strict.success);
    }
}
