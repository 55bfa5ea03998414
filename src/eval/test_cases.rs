//! Pairing golden cases with the pipeline's answers.

use super::dataset::GoldenCase;
use crate::rag::RagPipeline;
use serde::{Deserialize, Serialize};
use tracing::info;

/// A golden case together with the answer the pipeline produced for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationCase {
    pub input: String,
    pub expected_output: String,
    pub context: Vec<String>,
    pub actual_output: String,
}

impl EvaluationCase {
    /// Attach an answer to a golden case.
    pub fn from_golden(golden: &GoldenCase, actual_output: impl Into<String>) -> Self {
        Self {
            input: golden.input.clone(),
            expected_output: golden.expected_output.clone(),
            context: golden.context.clone(),
            actual_output: actual_output.into(),
        }
    }
}

/// Runs every golden question through the pipeline.
pub struct TestCaseGenerator<'a> {
    pipeline: &'a RagPipeline,
}

impl<'a> TestCaseGenerator<'a> {
    pub fn new(pipeline: &'a RagPipeline) -> Self {
        Self { pipeline }
    }

    /// One case per golden, in the same order, one query at a time.
    ///
    /// Pipeline failures become error answers rather than aborting the pass.
    pub async fn generate(&self, goldens: &[GoldenCase]) -> Vec<EvaluationCase> {
        let mut cases = Vec::with_capacity(goldens.len());

        for (idx, golden) in goldens.iter().enumerate() {
            info!(case = idx + 1, total = goldens.len(), "generating answer");
            let answer = self.pipeline.get_response(&golden.input).await;
            cases.push(EvaluationCase::from_golden(golden, answer));
        }

        cases
    }
}
