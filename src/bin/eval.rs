//! Evaluation CLI binary for the Bedrock RAG pipeline.
//!
//! Usage:
//!   rag-eval                         # Evaluate synthetic_data/goldens.json
//!   rag-eval --goldens <path>        # Evaluate another golden file
//!
//! Options:
//!   --output-dir <dir>     # Where CSV reports are written (default: reports)
//!   --threshold <F>        # Passing threshold for the judge score
//!   --sequential           # Judge one case at a time
//!   --max-concurrency <N>  # Judge calls in flight when concurrent
//!   --strict               # Binary scoring
//!   --limit <N>            # Only evaluate the first N cases

use anyhow::{Context, Result};
use bedrock_rag_eval::config::Config;
use bedrock_rag_eval::eval::{
    BedrockJudge, EvaluationRunner, Evaluator, ExecutionMode, GEvalMetric, ReportGenerator,
};
use bedrock_rag_eval::logging;
use bedrock_rag_eval::rag::RagPipeline;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "rag-eval")]
#[command(about = "Evaluate the Bedrock RAG pipeline against golden test cases", long_about = None)]
struct Cli {
    /// Path to the golden test cases JSON file
    #[arg(short, long)]
    goldens: Option<PathBuf>,

    /// Directory for the CSV reports
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Passing threshold for the judge score (0-1)
    #[arg(long)]
    threshold: Option<f64>,

    /// Judge cases one at a time
    #[arg(long)]
    sequential: bool,

    /// Maximum judge calls in flight
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Binary scoring: only perfect scores pass
    #[arg(long)]
    strict: bool,

    /// Maximum number of golden cases to evaluate
    #[arg(long)]
    limit: Option<usize>,

    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    apply_overrides(&mut config, &cli);
    config.validate().context("Invalid configuration")?;

    println!("Knowledge base:  {}", config.rag.knowledge_base_id);
    println!("RAG model:       {} ({})", config.rag.model_id, config.rag.region);
    println!(
        "Judge model:     {} ({}) [{}]",
        config.judge.model_id, config.judge.region, config.judge.model_name
    );

    let pipeline = RagPipeline::from_config(&config).context("Failed to create RAG pipeline")?;
    let judge = BedrockJudge::from_config(&config).context("Failed to create judge model")?;

    let mode = if config.evaluation.async_mode {
        ExecutionMode::Concurrent {
            max_in_flight: config.evaluation.max_concurrency,
        }
    } else {
        ExecutionMode::Sequential
    };
    let evaluator = Evaluator::new(
        Arc::new(judge),
        GEvalMetric::from_config(&config.evaluation),
        mode,
    );
    let reports = ReportGenerator::new(&config.evaluation.output_dir, config.evaluation.threshold)
        .context("Failed to prepare report directory")?;

    let outcome = EvaluationRunner::new(&pipeline, &evaluator, &reports)
        .with_limit(cli.limit)
        .run(&config.evaluation.golden_path)
        .await
        .context("Evaluation failed")?;

    println!("Reports generated successfully:");
    println!("Summary: {}", outcome.paths.summary.display());
    println!("Detailed: {}", outcome.paths.detailed.display());

    outcome.summary.print_summary();
    println!("{}", outcome.summary.analysis);
    println!("Total time: {:.1}s", outcome.elapsed_secs);

    Ok(())
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(goldens) = &cli.goldens {
        config.evaluation.golden_path = goldens.clone();
    }
    if let Some(output_dir) = &cli.output_dir {
        config.evaluation.output_dir = output_dir.clone();
    }
    if let Some(threshold) = cli.threshold {
        config.evaluation.threshold = threshold;
    }
    if let Some(max) = cli.max_concurrency {
        config.evaluation.max_concurrency = max;
    }
    if cli.sequential {
        config.evaluation.async_mode = false;
    }
    if cli.strict {
        config.evaluation.strict_mode = true;
    }
}
