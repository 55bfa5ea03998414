//! Retrieval-augmented answering.
//!
//! [`RagPipeline`] wires retrieval, context formatting, prompt building and
//! generation into one `query -> answer` call. It holds no mutable state, so
//! one pipeline can serve concurrent queries.

use crate::bedrock::BedrockHttp;
use crate::config::Config;
use crate::error::{RagError, Result};
use crate::knowledge_base::{KnowledgeBaseClient, format_context};
use crate::llm::{GenerationClient, Prompts};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Answer returned when the retrieval step fails.
pub const RETRIEVAL_FAILED: &str = "Error: Failed to retrieve context";

/// Answer returned when the generation step fails.
pub const GENERATION_FAILED: &str = "Error: Failed to generate response";

/// Answer returned when the knowledge base has nothing for the query.
pub const NO_RELEVANT_INFORMATION: &str = "No relevant information found in the knowledge base.";

/// Source of ranked passages for a query.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieve up to `num_results` passages, in relevance order.
    async fn retrieve(&self, query: &str, num_results: usize) -> Result<Vec<String>>;

    /// Like [`Retriever::retrieve`], but failures are logged and yield no passages.
    async fn retrieve_context(&self, query: &str, num_results: usize) -> Vec<String> {
        match self.retrieve(query, num_results).await {
            Ok(passages) => passages,
            Err(e) => {
                warn!(error = %e, "error in retrieval");
                Vec::new()
            }
        }
    }
}

/// Text generation backend.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
impl Retriever for KnowledgeBaseClient {
    async fn retrieve(&self, query: &str, num_results: usize) -> Result<Vec<String>> {
        KnowledgeBaseClient::retrieve(self, query, num_results).await
    }
}

#[async_trait]
impl Generator for GenerationClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        GenerationClient::generate(self, prompt).await
    }
}

/// Everything produced while answering one query.
#[derive(Debug, Clone)]
pub struct RagResponse {
    /// Retrieved passages, in service order.
    pub passages: Vec<String>,
    /// The prompt sent to the model; `None` when generation was skipped.
    pub prompt: Option<String>,
    /// The answer text.
    pub answer: String,
}

/// The retrieval -> prompt -> generation pipeline.
#[derive(Clone)]
pub struct RagPipeline {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    num_results: usize,
}

impl RagPipeline {
    /// Create a pipeline from explicit components.
    pub fn new(
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn Generator>,
        num_results: usize,
    ) -> Self {
        Self {
            retriever,
            generator,
            num_results,
        }
    }

    /// Create a pipeline backed by Bedrock, using the `rag` section.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = BedrockHttp::new(config)?;
        let retriever = KnowledgeBaseClient::new(http.clone(), &config.rag);
        let generator = GenerationClient::new(http, &config.rag);

        Ok(Self::new(
            Arc::new(retriever),
            Arc::new(generator),
            config.rag.num_results,
        ))
    }

    pub fn num_results(&self) -> usize {
        self.num_results
    }

    pub fn retriever(&self) -> &dyn Retriever {
        self.retriever.as_ref()
    }

    /// Answer `query`, reporting which stage failed.
    pub async fn answer(&self, query: &str) -> Result<RagResponse> {
        let passages = self
            .retriever
            .retrieve(query, self.num_results)
            .await
            .map_err(|e| RagError::RetrievalFailed(e.to_string()))?;

        if passages.is_empty() {
            return Ok(RagResponse {
                passages,
                prompt: None,
                answer: NO_RELEVANT_INFORMATION.to_string(),
            });
        }

        let context = format_context(&passages);
        let prompt = Prompts::build_rag_prompt(&context, query);
        debug!(%prompt, "enhanced prompt");

        let answer = self
            .generator
            .generate(&prompt)
            .await
            .map_err(|e| RagError::GenerationFailed(e.to_string()))?;

        Ok(RagResponse {
            passages,
            prompt: Some(prompt),
            answer,
        })
    }

    /// Answer `query`, mapping stage failures to fixed error answers.
    pub async fn get_response(&self, query: &str) -> String {
        match self.answer(query).await {
            Ok(response) => response.answer,
            Err(RagError::RetrievalFailed(e)) => {
                warn!(error = %e, "error in context retrieval");
                RETRIEVAL_FAILED.to_string()
            }
            Err(e) => {
                warn!(error = %e, "error in RAG response generation");
                GENERATION_FAILED.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeGenerator, FakeRetriever};

    fn build(
        retriever: FakeRetriever,
        generator: FakeGenerator,
    ) -> (RagPipeline, Arc<FakeRetriever>, Arc<FakeGenerator>) {
        let retriever = Arc::new(retriever);
        let generator = Arc::new(generator);
        let pipeline = RagPipeline::new(retriever.clone(), generator.clone(), 3);
        (pipeline, retriever, generator)
    }

    #[test]
    fn test_answer_literals() {
        assert_eq!(
            NO_RELEVANT_INFORMATION,
            "No relevant information found in the knowledge base."
        );
        assert_eq!(RETRIEVAL_FAILED, "Error: Failed to retrieve context");
        assert_eq!(GENERATION_FAILED, "Error: Failed to generate response");
    }

    #[tokio::test]
    async fn test_no_passages_skips_generation() {
        let (pipeline, _, generator) =
            build(FakeRetriever::with_passages(&[]), FakeGenerator::replying("unused"));

        assert_eq!(pipeline.get_response("anything").await, NO_RELEVANT_INFORMATION);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_prompt_context_is_blank_line_join() {
        let (pipeline, retriever, generator) = build(
            FakeRetriever::with_passages(&["first passage", "second passage"]),
            FakeGenerator::replying("the answer"),
        );

        let response = pipeline.answer("What is it?").await.unwrap();
        assert_eq!(response.answer, "the answer");
        assert_eq!(retriever.last_num_results(), Some(3));

        let prompt = generator.prompts().pop().unwrap();
        assert!(prompt.contains(
            "Context:\nfirst passage\n\nsecond passage\n\nQuestion:\nWhat is it?\n\nAnswer:"
        ));
        assert_eq!(response.prompt.as_deref(), Some(prompt.as_str()));
    }

    #[tokio::test]
    async fn test_retrieval_failure_sentinel() {
        let (pipeline, _, generator) =
            build(FakeRetriever::failing(), FakeGenerator::replying("unused"));

        assert_eq!(pipeline.get_response("q").await, RETRIEVAL_FAILED);
        assert!(matches!(
            pipeline.answer("q").await,
            Err(RagError::RetrievalFailed(_))
        ));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_generation_failure_sentinel() {
        let (pipeline, _, _) =
            build(FakeRetriever::with_passages(&["ctx"]), FakeGenerator::failing());

        assert_eq!(pipeline.get_response("q").await, GENERATION_FAILED);
        assert!(matches!(
            pipeline.answer("q").await,
            Err(RagError::GenerationFailed(_))
        ));
    }

    #[test]
    fn test_retrieve_context_swallows_errors() {
        let retriever = FakeRetriever::failing();
        let passages = tokio_test::block_on(retriever.retrieve_context("q", 3));
        assert!(passages.is_empty());

        let retriever = FakeRetriever::with_passages(&["a"]);
        let passages = tokio_test::block_on(retriever.retrieve_context("q", 3));
        assert_eq!(passages, vec!["a"]);
    }
}
