//! Running the judge over a batch of evaluation cases.

use super::judge::{GEvalMetric, JudgeModel, MetricResult};
use super::test_cases::EvaluationCase;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// A case together with its metric results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub case: EvaluationCase,
    pub metrics: Vec<MetricResult>,
}

impl TestResult {
    /// A case passes only when every metric succeeded.
    pub fn success(&self) -> bool {
        self.metrics.iter().all(|m| m.success)
    }

    /// The primary (first) metric.
    pub fn primary(&self) -> Option<&MetricResult> {
        self.metrics.first()
    }
}

/// How judge calls are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One judge call at a time.
    Sequential,
    /// Up to `max_in_flight` judge calls at once.
    Concurrent { max_in_flight: usize },
}

/// Scores evaluation cases with a judge model.
pub struct Evaluator {
    judge: Arc<dyn JudgeModel>,
    metric: GEvalMetric,
    mode: ExecutionMode,
}

impl Evaluator {
    pub fn new(judge: Arc<dyn JudgeModel>, metric: GEvalMetric, mode: ExecutionMode) -> Self {
        Self {
            judge,
            metric,
            mode,
        }
    }

    pub fn metric(&self) -> &GEvalMetric {
        &self.metric
    }

    pub fn judge_name(&self) -> &str {
        self.judge.name()
    }

    /// Score every case. Results are returned in input order in both modes.
    pub async fn evaluate(&self, cases: &[EvaluationCase]) -> Vec<TestResult> {
        info!(cases = cases.len(), mode = ?self.mode, judge = %self.judge.name(), "running evaluation");

        match self.mode {
            ExecutionMode::Sequential => {
                let mut results = Vec::with_capacity(cases.len());
                for case in cases {
                    results.push(self.evaluate_one(case).await);
                }
                results
            }
            ExecutionMode::Concurrent { max_in_flight } => {
                self.evaluate_concurrently(cases, max_in_flight.max(1)).await
            }
        }
    }

    async fn evaluate_concurrently(
        &self,
        cases: &[EvaluationCase],
        max_in_flight: usize,
    ) -> Vec<TestResult> {
        // Completion order is arbitrary; each result lands in its case's slot.
        let mut slots: Vec<Option<TestResult>> = vec![None; cases.len()];

        let mut completed = stream::iter(cases.iter().enumerate())
            .map(|(idx, case)| async move { (idx, self.evaluate_one(case).await) })
            .buffer_unordered(max_in_flight);

        while let Some((idx, result)) = completed.next().await {
            slots[idx] = Some(result);
        }

        slots.into_iter().flatten().collect()
    }

    async fn evaluate_one(&self, case: &EvaluationCase) -> TestResult {
        let metric = self.metric.measure(self.judge.as_ref(), case).await;
        TestResult {
            case: case.clone(),
            metrics: vec![metric],
        }
    }
}
