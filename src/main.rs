//! Bedrock RAG CLI
//!
//! Ask questions against a Bedrock knowledge base. Without a subcommand it
//! starts an interactive prompt; type `quit` to exit.

use anyhow::{Context, Result, bail};
use bedrock_rag_eval::{
    bedrock::BedrockHttp,
    config::Config,
    knowledge_base::KnowledgeBaseClient,
    llm::GenerationClient,
    logging,
    rag::{RagPipeline, RagResponse, Retriever},
};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;

/// Bedrock RAG - answer questions from a Bedrock knowledge base
#[derive(Parser)]
#[command(name = "bedrock-rag")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to a YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output (prints the assembled prompt)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive question loop (default)
    Chat,

    /// Answer a single question
    Ask {
        /// The question
        question: String,
    },

    /// Show the passages retrieved for a query
    Retrieve {
        /// The search query
        query: String,

        /// Number of passages to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Test knowledge base and model connectivity
    Test,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => cmd_chat(&config, cli.verbose).await,
        Commands::Ask { question } => cmd_ask(&config, &question, cli.verbose).await,
        Commands::Retrieve { query, top_k } => cmd_retrieve(&config, &query, top_k).await,
        Commands::Test => cmd_test(&config).await,
    }
}

fn build_pipeline(config: &Config) -> Result<RagPipeline> {
    config.validate_rag().context("Invalid configuration")?;
    RagPipeline::from_config(config).context("Failed to create RAG pipeline")
}

async fn cmd_chat(config: &Config, verbose: bool) -> Result<()> {
    let pipeline = build_pipeline(config)?;

    println!("\n=== Bedrock RAG Query System ===");
    println!("Type 'quit' to exit");
    println!("--------------------------------");

    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("\nEnter your question: ");
        io::stdout().flush().ok();

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!("\nGoodbye!");
            break;
        }

        let question = line.trim();
        if question.eq_ignore_ascii_case("quit") {
            println!("Goodbye!");
            break;
        }
        if question.is_empty() {
            continue;
        }

        println!("\nQuerying knowledge base...");
        answer_and_print(&pipeline, question, verbose).await;
    }

    Ok(())
}

async fn cmd_ask(config: &Config, question: &str, verbose: bool) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    answer_and_print(&pipeline, question, verbose).await;
    Ok(())
}

async fn answer_and_print(pipeline: &RagPipeline, question: &str, verbose: bool) {
    let start = Instant::now();

    match pipeline.answer(question).await {
        Ok(response) => {
            print!("{}", render_response(&response, verbose));
            println!(
                "({} passages, {:.2?})",
                response.passages.len(),
                start.elapsed()
            );
        }
        Err(e) => {
            eprintln!("\nError: {}", e);
        }
    }
}

/// Retrieved context (or the full prompt when verbose) followed by the answer.
fn render_response(response: &RagResponse, verbose: bool) -> String {
    let mut out = String::new();

    match (&response.prompt, verbose) {
        (Some(prompt), true) => {
            out.push_str("\n=== Enhanced Prompt ===\n");
            out.push_str(prompt);
            out.push_str("\n=====================\n");
        }
        _ if !response.passages.is_empty() => {
            out.push_str("\n=== Retrieved Context ===\n");
            for (i, passage) in response.passages.iter().enumerate() {
                out.push_str(&format!("[{}] {}\n", i + 1, passage));
            }
            out.push_str("=========================\n");
        }
        _ => {}
    }

    out.push_str("\n=== Response ===\n");
    out.push_str(&response.answer);
    out.push_str("\n---------------\n");
    out
}

async fn cmd_retrieve(config: &Config, query: &str, top_k: Option<usize>) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    let top_k = top_k.unwrap_or(pipeline.num_results());
    if top_k == 0 {
        bail!("--top-k must be at least 1");
    }

    println!("Searching for: \"{}\"", query);
    println!("Knowledge base: {}", config.rag.knowledge_base_id);
    println!();

    let passages = pipeline.retriever().retrieve_context(query, top_k).await;

    if passages.is_empty() {
        println!("No relevant passages found.");
        return Ok(());
    }

    println!("Results:");
    println!("{}", "─".repeat(60));
    for (i, passage) in passages.iter().enumerate() {
        println!("{:>2}. {}", i + 1, passage);
        println!();
    }
    println!("{}", "─".repeat(60));

    Ok(())
}

async fn cmd_test(config: &Config) -> Result<()> {
    println!("Testing Bedrock connectivity...\n");

    println!("Configuration:");
    println!("  Region:          {}", config.rag.region);
    println!("  Knowledge base:  {}", config.rag.knowledge_base_id);
    println!("  Model:           {}", config.rag.model_id);
    println!(
        "  API Key:         {}",
        if config.api_key.is_some() { "set" } else { "not set" }
    );
    println!();

    if let Err(e) = config.validate_rag() {
        println!("Configuration error: {}", e);
        return Ok(());
    }

    let http = BedrockHttp::new(config)?;
    let knowledge_base = KnowledgeBaseClient::new(http.clone(), &config.rag);

    println!(
        "Sending retrieval request to {}...",
        knowledge_base.knowledge_base_id()
    );
    match knowledge_base.retrieve("test", 1).await {
        Ok(passages) => println!("Knowledge base reachable ({} passages)", passages.len()),
        Err(e) => println!("Knowledge base request failed: {}", e),
    }

    let generator = GenerationClient::new(http, &config.rag);
    println!("Sending generation request to {}...", generator.model_id());
    match generator.test_connection().await {
        Ok(()) => println!("Connection successful!"),
        Err(e) => println!("Connection failed: {}", e),
    }

    Ok(())
}
