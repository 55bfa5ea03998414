//! Offline evaluation of the RAG pipeline.
//!
//! This module provides:
//! - Golden test case loading
//! - Test case generation by running goldens through the pipeline
//! - LLM-as-judge scoring, sequential or concurrent
//! - Summary and per-case CSV reports

pub mod dataset;
pub mod evaluator;
pub mod judge;
pub mod report;
pub mod runner;
pub mod test_cases;

pub use dataset::{GoldenCase, load_golden_cases, parse_golden_cases};
pub use evaluator::{Evaluator, ExecutionMode, TestResult};
pub use judge::{BedrockJudge, GEvalMetric, JudgeModel, MetricResult};
pub use report::{DetailRow, ReportGenerator, ReportPaths, SummaryReport};
pub use runner::{EvaluationRunner, RunOutcome};
pub use test_cases::{EvaluationCase, TestCaseGenerator};
