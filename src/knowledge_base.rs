//! Bedrock knowledge base retrieval.
//!
//! Vector search runs entirely on the service side; this client only sends
//! the query and collects passage text in the order the service ranked it.

use crate::bedrock::{BedrockHttp, endpoint_url};
use crate::config::RagConfig;
use crate::error::{RagError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Request body for the `Retrieve` API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveRequest<'a> {
    retrieval_query: RetrievalQuery<'a>,
    retrieval_configuration: RetrievalConfiguration,
}

#[derive(Debug, Serialize)]
struct RetrievalQuery<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalConfiguration {
    vector_search_configuration: VectorSearchConfiguration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VectorSearchConfiguration {
    number_of_results: usize,
}

/// Response from the `Retrieve` API. Fields we do not read are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveResponse {
    #[serde(default)]
    retrieval_results: Vec<RetrievalResult>,
}

#[derive(Debug, Deserialize)]
struct RetrievalResult {
    #[serde(default)]
    content: Option<ResultContent>,
}

#[derive(Debug, Deserialize)]
struct ResultContent {
    #[serde(default)]
    text: Option<String>,
}

/// Client for a single knowledge base.
#[derive(Clone)]
pub struct KnowledgeBaseClient {
    http: BedrockHttp,
    endpoint: String,
    knowledge_base_id: String,
}

impl KnowledgeBaseClient {
    /// Create a client for the knowledge base named in the configuration.
    pub fn new(http: BedrockHttp, config: &RagConfig) -> Self {
        Self {
            http,
            endpoint: config.agent_endpoint(),
            knowledge_base_id: config.knowledge_base_id.clone(),
        }
    }

    pub fn knowledge_base_id(&self) -> &str {
        &self.knowledge_base_id
    }

    /// Retrieve up to `num_results` passages for `query`.
    pub async fn retrieve(&self, query: &str, num_results: usize) -> Result<Vec<String>> {
        if num_results == 0 {
            return Err(RagError::Config(
                "number of results must be at least 1".to_string(),
            ));
        }

        let url = endpoint_url(
            &self.endpoint,
            &["knowledgebases", &self.knowledge_base_id, "retrieve"],
        )?;
        let request = RetrieveRequest {
            retrieval_query: RetrievalQuery { text: query },
            retrieval_configuration: RetrievalConfiguration {
                vector_search_configuration: VectorSearchConfiguration {
                    number_of_results: num_results,
                },
            },
        };

        let body = self
            .http
            .post_json("bedrock-agent-runtime", url, &request)
            .await?;
        let passages = parse_passages(&body)?;

        debug!(
            knowledge_base = %self.knowledge_base_id,
            requested = num_results,
            returned = passages.len(),
            "retrieved passages"
        );
        Ok(passages)
    }
}

/// Extract non-empty passage texts, keeping the service's order.
fn parse_passages(body: &str) -> Result<Vec<String>> {
    let response: RetrieveResponse = serde_json::from_str(body)?;

    Ok(response
        .retrieval_results
        .into_iter()
        .filter_map(|result| result.content.and_then(|c| c.text))
        .filter(|text| !text.is_empty())
        .collect())
}

/// Join passages into one context block, separated by a blank line.
pub fn format_context<S: AsRef<str>>(passages: &[S]) -> String {
    passages
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<&str>>()
        .join("\n\n")
}
