//! Bedrock RAG - retrieval-augmented answering over an Amazon Bedrock
//! knowledge base, plus an LLM-as-judge evaluation harness.
//!
//! # Overview
//!
//! Answering a question is a straight pipeline:
//! 1. Retrieve ranked passages from the knowledge base
//! 2. Join them into a context block and fill the answer prompt
//! 3. Invoke the generation model and extract its answer
//!
//! Evaluation runs every golden case through that pipeline, asks a separate
//! judge model to score each answer against the golden answer, and writes
//! summary and per-case CSV reports.
//!
//! # Quick Start
//!
//! ```no_run
//! use bedrock_rag_eval::{config::Config, rag::RagPipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     config.validate_rag()?;
//!
//!     let pipeline = RagPipeline::from_config(&config)?;
//!     let answer = pipeline.get_response("What does the warranty cover?").await;
//!     println!("{}", answer);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **KnowledgeBaseClient**: Bedrock `Retrieve` API client
//! - **GenerationClient**: Bedrock `InvokeModel` client for answers
//! - **RagPipeline**: retrieval -> prompt -> generation
//! - **eval**: golden loading, judging and reporting

pub mod bedrock;
pub mod config;
pub mod error;
pub mod eval;
pub mod knowledge_base;
pub mod llm;
pub mod logging;
pub mod rag;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::Config;
pub use error::{RagError, Result};
pub use knowledge_base::{KnowledgeBaseClient, format_context};
pub use llm::GenerationClient;
pub use rag::{RagPipeline, RagResponse};
