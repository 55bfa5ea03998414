//! End-to-end evaluation: goldens -> answers -> judge -> reports.

use super::dataset::load_golden_cases;
use super::evaluator::Evaluator;
use super::report::{DetailRow, ReportGenerator, ReportPaths, SummaryReport};
use super::test_cases::TestCaseGenerator;
use crate::error::Result;
use crate::rag::RagPipeline;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Everything an evaluation run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub summary: SummaryReport,
    pub details: Vec<DetailRow>,
    pub paths: ReportPaths,
    pub elapsed_secs: f64,
}

/// Drives one evaluation run.
pub struct EvaluationRunner<'a> {
    pipeline: &'a RagPipeline,
    evaluator: &'a Evaluator,
    reports: &'a ReportGenerator,
    limit: Option<usize>,
}

impl<'a> EvaluationRunner<'a> {
    pub fn new(
        pipeline: &'a RagPipeline,
        evaluator: &'a Evaluator,
        reports: &'a ReportGenerator,
    ) -> Self {
        Self {
            pipeline,
            evaluator,
            reports,
            limit: None,
        }
    }

    /// Only evaluate the first `limit` golden cases.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Run the whole evaluation. The golden file is fully loaded and
    /// validated before the pipeline is queried.
    pub async fn run(&self, golden_path: &Path) -> Result<RunOutcome> {
        let start = Instant::now();

        let mut goldens = load_golden_cases(golden_path)?;
        if let Some(limit) = self.limit {
            goldens.truncate(limit);
        }
        info!(path = %golden_path.display(), cases = goldens.len(), "loaded golden test cases");

        println!("Generating test cases...");
        let cases = TestCaseGenerator::new(self.pipeline)
            .generate(&goldens)
            .await;

        println!(
            "Running evaluation: {} (judge: {})...",
            self.evaluator.metric().name(),
            self.evaluator.judge_name()
        );
        let results = self.evaluator.evaluate(&cases).await;

        println!("Generating reports in {}...", self.reports.output_dir().display());
        let summary = self.reports.generate_summary(&results);
        let details = self.reports.generate_detailed(&results);
        let paths = self.reports.save(&summary, &details)?;

        Ok(RunOutcome {
            summary,
            details,
            paths,
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }
}
