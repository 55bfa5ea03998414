//! Bedrock model clients.
//!
//! [`GenerationClient`] calls `InvokeModel` with a Llama-style text body for
//! answer generation. [`ConverseClient`] calls the chat-style `Converse` API
//! and backs the judge model.

use crate::bedrock::{BedrockHttp, endpoint_url};
use crate::config::{DecodingConfig, JudgeConfig, RagConfig};
use crate::error::{RagError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Returned when `outputs` carries no usable text.
pub const NO_RESPONSE_GENERATED: &str = "No response generated";

/// Returned when the response body matches no known shape.
pub const UNEXPECTED_RESPONSE_FORMAT: &str = "Unexpected response format.";

/// Request body for `InvokeModel`.
#[derive(Debug, Serialize)]
struct InvokeRequest<'a> {
    prompt: &'a str,
    max_gen_len: u32,
    temperature: f32,
    top_p: f32,
}

/// Text generation client for the RAG answer.
#[derive(Clone)]
pub struct GenerationClient {
    http: BedrockHttp,
    endpoint: String,
    model_id: String,
    decoding: DecodingConfig,
}

impl GenerationClient {
    /// Create a new generation client from the RAG configuration.
    pub fn new(http: BedrockHttp, config: &RagConfig) -> Self {
        Self {
            http,
            endpoint: config.runtime_endpoint(),
            model_id: config.model_id.clone(),
            decoding: config.decoding.clone(),
        }
    }

    /// The configured model identifier.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Send `prompt` to the model and extract the answer text.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = endpoint_url(&self.endpoint, &["model", &self.model_id, "invoke"])?;
        let request = InvokeRequest {
            prompt,
            max_gen_len: self.decoding.max_gen_len,
            temperature: self.decoding.temperature,
            top_p: self.decoding.top_p,
        };

        debug!(model = %self.model_id, prompt_len = prompt.len(), "invoking model");
        let body = self.http.post_json("bedrock-runtime", url, &request).await?;
        let value: Value = serde_json::from_str(&body)?;

        Ok(extract_generation(&value))
    }

    /// Test connectivity to the model.
    pub async fn test_connection(&self) -> Result<()> {
        let reply = self.generate("Say 'hello' and nothing else.").await?;

        if reply == UNEXPECTED_RESPONSE_FORMAT {
            Err(RagError::Parse(format!(
                "Model '{}' answered in an unrecognized format",
                self.model_id
            )))
        } else {
            Ok(())
        }
    }
}

/// Pull the answer text out of an `InvokeModel` response body.
///
/// Checks `generation` first, then `outputs[0].text`; anything else,
/// including a non-text `generation`, is reported and mapped to
/// [`UNEXPECTED_RESPONSE_FORMAT`].
pub fn extract_generation(body: &Value) -> String {
    match body.get("generation") {
        Some(Value::String(text)) => return text.clone(),
        Some(other) => {
            warn!(generation = %other, "generation field is not text");
            return UNEXPECTED_RESPONSE_FORMAT.to_string();
        }
        None => {}
    }

    if let Some(outputs) = body.get("outputs").and_then(Value::as_array) {
        return outputs
            .first()
            .and_then(|first| first.get("text"))
            .and_then(Value::as_str)
            .unwrap_or(NO_RESPONSE_GENERATED)
            .to_string();
    }

    let keys: Vec<&str> = body
        .as_object()
        .map(|map| map.keys().map(String::as_str).collect())
        .unwrap_or_default();
    warn!(?keys, "received unrecognized response format");
    UNEXPECTED_RESPONSE_FORMAT.to_string()
}

/// Request body for `Converse`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConverseRequest<'a> {
    messages: Vec<ConverseMessage<'a>>,
    inference_config: InferenceConfig,
}

#[derive(Debug, Serialize)]
struct ConverseMessage<'a> {
    role: &'static str,
    content: Vec<TextBlock<'a>>,
}

#[derive(Debug, Serialize)]
struct TextBlock<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InferenceConfig {
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

/// Response from `Converse`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseResponse {
    output: ConverseOutput,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConverseOutput {
    message: OutputMessage,
}

#[derive(Debug, Deserialize)]
struct OutputMessage {
    #[serde(default)]
    content: Vec<OutputBlock>,
}

#[derive(Debug, Deserialize)]
struct OutputBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Chat-style client used by the judge.
#[derive(Clone)]
pub struct ConverseClient {
    http: BedrockHttp,
    endpoint: String,
    model_id: String,
    decoding: DecodingConfig,
}

impl ConverseClient {
    /// Create a new client from the judge configuration.
    pub fn new(http: BedrockHttp, config: &JudgeConfig) -> Self {
        Self {
            http,
            endpoint: config.runtime_endpoint(),
            model_id: config.model_id.clone(),
            decoding: config.decoding.clone(),
        }
    }

    /// Send a single user message and return the concatenated reply text.
    pub async fn complete(&self, user: &str) -> Result<String> {
        let url = endpoint_url(&self.endpoint, &["model", &self.model_id, "converse"])?;
        let request = ConverseRequest {
            messages: vec![ConverseMessage {
                role: "user",
                content: vec![TextBlock { text: user }],
            }],
            inference_config: InferenceConfig {
                max_tokens: self.decoding.max_gen_len,
                temperature: self.decoding.temperature,
                top_p: self.decoding.top_p,
            },
        };

        let body = self.http.post_json("bedrock-runtime", url, &request).await?;
        parse_converse(&body)
    }
}

fn parse_converse(body: &str) -> Result<String> {
    let response: ConverseResponse = serde_json::from_str(body)?;

    let text: String = response
        .output
        .message
        .content
        .into_iter()
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("");

    if text.is_empty() {
        return Err(RagError::Parse(format!(
            "Converse reply had no text content (stop reason: {})",
            response.stop_reason.as_deref().unwrap_or("unknown")
        )));
    }
    Ok(text)
}
