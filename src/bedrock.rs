//! Shared HTTP plumbing for the Bedrock REST APIs.
//!
//! Both the knowledge base client and the model clients send a JSON body
//! with `POST` and read back a JSON body; this module owns the
//! `reqwest::Client`, authentication and the error mapping.

use crate::config::Config;
use crate::error::{RagError, Result};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Error body returned by AWS services.
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(alias = "Message")]
    message: String,
}

/// Thin wrapper around a `reqwest::Client` for Bedrock endpoints.
#[derive(Clone)]
pub struct BedrockHttp {
    client: Client,
    api_key: Option<String>,
}

impl BedrockHttp {
    /// Create a client honoring the configured timeout and API key.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
        })
    }

    /// POST `body` to `url` and return the raw response body on success.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        service: &'static str,
        url: Url,
        body: &B,
    ) -> Result<String> {
        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(body);

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(RagError::Api {
                service,
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }
}

/// Join a base URL with path segments, percent-encoding each segment.
///
/// Model identifiers may be ARNs containing `:` and `/`, so they must be
/// pushed as a single encoded segment rather than formatted into the path.
pub fn endpoint_url(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base.trim_end_matches('/'))
        .map_err(|e| RagError::Config(format!("Invalid endpoint '{}': {}", base, e)))?;

    url.path_segments_mut()
        .map_err(|_| RagError::Config(format!("Endpoint '{}' cannot be a base URL", base)))?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}
