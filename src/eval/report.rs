//! Summary and per-case reports.
//!
//! Both reports are written as CSV files whose names share the run's
//! `YYYYMMDD_HHMMSS` timestamp.

use super::evaluator::TestResult;
use crate::error::{RagError, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Aggregate view of an evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub total_test_cases: usize,
    pub passed_test_cases: usize,
    /// `passed / total`, 0 for an empty run.
    pub pass_rate: f64,
    pub metric_name: String,
    /// Mean primary-metric score, 0 for an empty run.
    pub score: f64,
    pub threshold: f64,
    /// Whether the pass rate reached the threshold.
    pub success: bool,
    pub model_used: String,
    pub analysis: String,
    pub evaluation_timestamp: DateTime<Local>,
}

impl SummaryReport {
    /// Aggregate `results`.
    ///
    /// The threshold comes from the first result; every case is scored with
    /// the same configured threshold, so `fallback_threshold` is only used
    /// for an empty run.
    pub fn from_results(results: &[TestResult], fallback_threshold: f64) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.success()).count();
        let total_score: f64 = results
            .iter()
            .filter_map(|r| r.primary())
            .map(|m| m.score)
            .sum();

        let first = results.first().and_then(|r| r.primary());
        let threshold = first.map(|m| m.threshold).unwrap_or(fallback_threshold);

        if results
            .iter()
            .filter_map(|r| r.primary())
            .any(|m| m.threshold != threshold)
        {
            warn!(threshold, "cases were scored with different thresholds; summarizing with the first");
        }

        let (pass_rate, score) = if total > 0 {
            (passed as f64 / total as f64, total_score / total as f64)
        } else {
            (0.0, 0.0)
        };

        Self {
            total_test_cases: total,
            passed_test_cases: passed,
            pass_rate,
            metric_name: first.map(|m| m.name.clone()).unwrap_or_default(),
            score,
            threshold,
            success: pass_rate >= threshold,
            model_used: first.map(|m| m.evaluation_model.clone()).unwrap_or_default(),
            analysis: format!(
                "Overall pass rate: {:.2}%. Average score: {:.4}",
                pass_rate * 100.0,
                score
            ),
            evaluation_timestamp: Local::now(),
        }
    }

    /// Print summary to stdout.
    pub fn print_summary(&self) {
        println!("\n========== Evaluation Summary ==========");
        println!("Metric:            {}", self.metric_name);
        println!("Judge model:       {}", self.model_used);
        println!("----------------------------------------");
        println!("Total Test Cases:  {}", self.total_test_cases);
        println!("Passed Test Cases: {}", self.passed_test_cases);
        println!("Pass Rate:         {:.2}%", self.pass_rate * 100.0);
        println!("Average Score:     {:.4}", self.score);
        println!("Threshold:         {}", self.threshold);
        println!(
            "Result:            {}",
            if self.success { "PASS" } else { "FAIL" }
        );
        println!("========================================\n");
    }

    /// Timestamp used in report file names.
    pub fn file_stamp(&self) -> String {
        self.evaluation_timestamp.format("%Y%m%d_%H%M%S").to_string()
    }
}

/// One row of the detailed report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRow {
    /// 1-based position in the golden file.
    #[serde(rename = "Test ID")]
    pub test_id: usize,
    #[serde(rename = "Input Query")]
    pub input: String,
    #[serde(rename = "Expected Output")]
    pub expected_output: String,
    #[serde(rename = "Actual Output")]
    pub actual_output: String,
    /// Score with four decimals.
    #[serde(rename = "Score")]
    pub score: String,
    #[serde(rename = "Threshold")]
    pub threshold: f64,
    #[serde(rename = "Success")]
    pub success: bool,
    #[serde(rename = "Reason")]
    pub reason: String,
}

/// Where a run's reports were written.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub summary: PathBuf,
    pub detailed: PathBuf,
}

/// Builds and saves reports into an output directory.
pub struct ReportGenerator {
    output_dir: PathBuf,
    threshold: f64,
}

impl ReportGenerator {
    /// Create the generator, creating `output_dir` if needed.
    pub fn new(output_dir: impl Into<PathBuf>, threshold: f64) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|e| RagError::io(&output_dir, e))?;

        Ok(Self {
            output_dir,
            threshold,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn generate_summary(&self, results: &[TestResult]) -> SummaryReport {
        SummaryReport::from_results(results, self.threshold)
    }

    /// One row per case, numbered from 1 in input order.
    pub fn generate_detailed(&self, results: &[TestResult]) -> Vec<DetailRow> {
        results
            .iter()
            .enumerate()
            .map(|(idx, result)| {
                let metric = result.primary();
                DetailRow {
                    test_id: idx + 1,
                    input: result.case.input.clone(),
                    expected_output: result.case.expected_output.clone(),
                    actual_output: result.case.actual_output.clone(),
                    score: format!("{:.4}", metric.map(|m| m.score).unwrap_or(0.0)),
                    threshold: metric.map(|m| m.threshold).unwrap_or(self.threshold),
                    success: result.success(),
                    reason: metric.map(|m| m.reason.clone()).unwrap_or_default(),
                }
            })
            .collect()
    }

    /// Write both reports. Any failure aborts the run.
    pub fn save(&self, summary: &SummaryReport, details: &[DetailRow]) -> Result<ReportPaths> {
        let stamp = summary.file_stamp();
        let paths = ReportPaths {
            summary: self.output_dir.join(format!("summary_report_{}.csv", stamp)),
            detailed: self.output_dir.join(format!("detailed_report_{}.csv", stamp)),
        };

        write_summary_csv(&paths.summary, summary)?;
        write_detailed_csv(&paths.detailed, details)?;

        info!(summary = %paths.summary.display(), detailed = %paths.detailed.display(), "reports written");
        Ok(paths)
    }
}

fn report_error(path: &Path, err: impl std::fmt::Display) -> RagError {
    RagError::Report(format!("{}: {}", path.display(), err))
}

fn write_summary_csv(path: &Path, summary: &SummaryReport) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| report_error(path, e))?;

    let rows = [
        (
            "Timestamp",
            summary
                .evaluation_timestamp
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        ),
        ("Total Test Cases", summary.total_test_cases.to_string()),
        ("Passed Test Cases", summary.passed_test_cases.to_string()),
        ("Pass Rate", format!("{:.2}%", summary.pass_rate * 100.0)),
        ("Overall Score", format!("{:.4}", summary.score)),
        ("Threshold", summary.threshold.to_string()),
        (
            "Pass/Fail",
            if summary.success { "PASS" } else { "FAIL" }.to_string(),
        ),
        ("Model Used", summary.model_used.clone()),
    ];

    writer
        .write_record(["Metric", "Value"])
        .map_err(|e| report_error(path, e))?;
    for (metric, value) in &rows {
        writer
            .write_record([*metric, value.as_str()])
            .map_err(|e| report_error(path, e))?;
    }
    writer.flush().map_err(|e| report_error(path, e))?;
    Ok(())
}

fn write_detailed_csv(path: &Path, details: &[DetailRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| report_error(path, e))?;

    for row in details {
        writer.serialize(row).map_err(|e| report_error(path, e))?;
    }
    writer.flush().map_err(|e| report_error(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::judge::MetricResult;
    use crate::testing::evaluation_case;

    fn result(idx: usize, score: f64, threshold: f64) -> TestResult {
        TestResult {
            case: evaluation_case(
                &format!("question {}", idx),
                &format!("actual {}", idx),
                &format!("expected {}", idx),
                &[],
            ),
            metrics: vec![MetricResult {
                name: "response_accuracy_metric".to_string(),
                score,
                threshold,
                success: score >= threshold,
                reason: format!("reason {}", idx),
                evaluation_model: "Judge".to_string(),
                error: None,
            }],
        }
    }

    #[test]
    fn test_summary_half_passing() {
        let scores = [1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let results: Vec<_> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| result(i, *s, 0.7))
            .collect();

        let summary = SummaryReport::from_results(&results, 0.7);
        assert_eq!(summary.total_test_cases, 10);
        assert_eq!(summary.passed_test_cases, 5);
        assert!((summary.pass_rate - 0.5).abs() < 1e-9);
        assert!((summary.score - 0.5).abs() < 1e-9);
        assert_eq!(summary.threshold, 0.7);
        assert!(!summary.success);
        assert_eq!(summary.model_used, "Judge");
        assert_eq!(summary.analysis, "Overall pass rate: 50.00%. Average score: 0.5000");
    }

    #[test]
    fn test_summary_all_passing() {
        let results: Vec<_> = (0..4).map(|i| result(i, 0.9, 0.7)).collect();
        let summary = SummaryReport::from_results(&results, 0.7);
        assert_eq!(summary.pass_rate, 1.0);
        assert!(summary.success);
    }

    #[test]
    fn test_summary_empty_run() {
        let summary = SummaryReport::from_results(&[], 0.7);
        assert_eq!(summary.total_test_cases, 0);
        assert_eq!(summary.pass_rate, 0.0);
        assert_eq!(summary.score, 0.0);
        assert_eq!(summary.threshold, 0.7);
        assert!(!summary.success);
    }

    #[test]
    fn test_detailed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path(), 0.7).unwrap();
        let results = vec![result(0, 0.83333, 0.7), result(1, 0.5, 0.7)];

        let rows = generator.generate_detailed(&results);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].test_id, 1);
        assert_eq!(rows[0].input, "question 0");
        assert_eq!(rows[0].score, "0.8333");
        assert!(rows[0].success);
        assert_eq!(rows[1].test_id, 2);
        assert_eq!(rows[1].score, "0.5000");
        assert!(!rows[1].success);
        assert_eq!(rows[1].reason, "reason 1");
    }

    #[test]
    fn test_save_writes_both_reports() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested").join("reports");
        let generator = ReportGenerator::new(&output, 0.7).unwrap();
        assert!(output.is_dir());

        let results = vec![result(0, 1.0, 0.7), result(1, 0.2, 0.7)];
        let summary = generator.generate_summary(&results);
        let details = generator.generate_detailed(&results);
        let paths = generator.save(&summary, &details).unwrap();

        let stamp = summary.file_stamp();
        assert_eq!(stamp.len(), 15);
        assert!(paths.summary.ends_with(format!("summary_report_{}.csv", stamp)));
        assert!(paths.detailed.ends_with(format!("detailed_report_{}.csv", stamp)));

        let summary_csv = fs::read_to_string(&paths.summary).unwrap();
        assert!(summary_csv.starts_with("Metric,Value\n"));
        assert!(summary_csv.contains("Total Test Cases,2\n"));
        assert!(summary_csv.contains("Pass/Fail,FAIL\n"));

        let mut reader = csv::Reader::from_path(&paths.detailed).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec![
                "Test ID",
                "Input Query",
                "Expected Output",
                "Actual Output",
                "Score",
                "Threshold",
                "Success",
                "Reason"
            ]
        );
        let rows: Vec<DetailRow> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows, details);
    }

    #[test]
    fn test_unwritable_output_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();

        assert!(matches!(
            ReportGenerator::new(blocker.join("reports"), 0.7),
            Err(RagError::Io { .. })
        ));
    }
}
