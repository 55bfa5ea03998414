//! Configuration for the RAG pipeline and the evaluation harness.
//!
//! Supports both environment variables and YAML config file.
//! Environment variables take precedence over config file values.
//!
//! Region and model identifiers have no defaults: they must come from the
//! environment (or a `.env` file) or the config file, and `validate_*`
//! rejects them when empty.

use crate::error::{RagError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Display name used for the judge model when none is configured.
pub const DEFAULT_JUDGE_MODEL_NAME: &str = "Custom AWS Bedrock Model";

/// Default location of the golden test cases.
pub const DEFAULT_GOLDEN_PATH: &str = "synthetic_data/goldens.json";

/// Decoding parameters, fixed at configuration time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodingConfig {
    /// Maximum number of generated tokens.
    pub max_gen_len: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus-sampling probability.
    pub top_p: f32,
}

impl Default for DecodingConfig {
    fn default() -> Self {
        Self {
            max_gen_len: 2048,
            temperature: 0.7,
            top_p: 0.8,
        }
    }
}

/// Retrieval + generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// AWS region hosting the knowledge base and the generation model.
    pub region: String,
    /// Bedrock knowledge base identifier.
    pub knowledge_base_id: String,
    /// Generation model identifier (model id, inference profile or ARN).
    pub model_id: String,
    /// Number of passages to retrieve per query.
    pub num_results: usize,
    pub decoding: DecodingConfig,
    /// Override for the agent-runtime endpoint (retrieval).
    pub agent_endpoint: Option<String>,
    /// Override for the runtime endpoint (generation).
    pub runtime_endpoint: Option<String>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            region: String::new(),
            knowledge_base_id: String::new(),
            model_id: String::new(),
            num_results: 3,
            decoding: DecodingConfig::default(),
            agent_endpoint: None,
            runtime_endpoint: None,
        }
    }
}

impl RagConfig {
    /// Base URL of the knowledge base retrieval API.
    pub fn agent_endpoint(&self) -> String {
        self.agent_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://bedrock-agent-runtime.{}.amazonaws.com", self.region))
    }

    /// Base URL of the model invocation API.
    pub fn runtime_endpoint(&self) -> String {
        runtime_endpoint_for(self.runtime_endpoint.as_deref(), &self.region)
    }
}

/// Judge model settings. Independent of [`RagConfig`] so the judge can live
/// in another region and run a different model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    pub region: String,
    pub model_id: String,
    /// Display name recorded on every metric result.
    pub model_name: String,
    pub decoding: DecodingConfig,
    /// Override for the runtime endpoint.
    pub endpoint: Option<String>,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            region: String::new(),
            model_id: String::new(),
            model_name: DEFAULT_JUDGE_MODEL_NAME.to_string(),
            decoding: DecodingConfig::default(),
            endpoint: None,
        }
    }
}

impl JudgeConfig {
    /// Base URL of the model invocation API in the judge's region.
    pub fn runtime_endpoint(&self) -> String {
        runtime_endpoint_for(self.endpoint.as_deref(), &self.region)
    }
}

fn runtime_endpoint_for(endpoint: Option<&str>, region: &str) -> String {
    endpoint
        .map(str::to_string)
        .unwrap_or_else(|| format!("https://bedrock-runtime.{}.amazonaws.com", region))
}

/// Evaluation run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// JSON file holding the golden test cases.
    pub golden_path: PathBuf,
    /// Directory receiving the CSV reports.
    pub output_dir: PathBuf,
    /// Passing threshold for the judge score.
    pub threshold: f64,
    /// Binary scoring: a case passes only with a perfect score.
    pub strict_mode: bool,
    /// Run judge calls concurrently.
    pub async_mode: bool,
    /// Upper bound on in-flight judge calls when `async_mode` is set.
    pub max_concurrency: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            golden_path: PathBuf::from(DEFAULT_GOLDEN_PATH),
            output_dir: PathBuf::from("reports"),
            threshold: 0.7,
            strict_mode: false,
            async_mode: true,
            max_concurrency: 4,
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rag: RagConfig,
    pub judge: JudgeConfig,
    pub evaluation: EvaluationConfig,
    /// Bedrock API key, sent as a bearer token when present.
    pub api_key: Option<String>,
    /// Per-request timeout for every remote call.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rag: RagConfig::default(),
            judge: JudgeConfig::default(),
            evaluation: EvaluationConfig::default(),
            api_key: None,
            request_timeout_secs: 120,
        }
    }
}

impl Config {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (AWS_BEDROCK_REGION, KNOWLEDGE_BASE_ID, ...)
    /// 2. Config file (`explicit` path, else ~/.config/bedrock-rag/config.yaml)
    /// 3. Default values
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => match Self::config_file_path() {
                Some(path) if path.exists() => Self::load_from_file(&path)?,
                _ => Config::default(),
            },
        };

        config.apply_env_with(|key| env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RagError::io(path, e))?;

        serde_yaml::from_str(&content)
            .map_err(|e| RagError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "bedrock-rag")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Override fields from an environment-like lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |target: &mut String, key: &str| {
            if let Some(value) = lookup(key) {
                *target = value;
            }
        };

        set(&mut self.rag.region, "AWS_BEDROCK_REGION");
        set(&mut self.rag.knowledge_base_id, "KNOWLEDGE_BASE_ID");
        set(&mut self.rag.model_id, "AWS_BEDROCK_MODEL_ID");
        set(&mut self.judge.region, "AWS_EVALUATOR_REGION");
        set(&mut self.judge.model_id, "AWS_EVALUATOR_MODEL_ID");
        set(&mut self.judge.model_name, "AWS_EVALUATOR_MODEL_NAME");

        if let Some(key) = lookup("AWS_BEARER_TOKEN_BEDROCK") {
            self.api_key = Some(key);
        }

        if let Some(timeout) = lookup("BEDROCK_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse() {
                self.request_timeout_secs = secs;
            }
        }
    }

    /// Validate the settings needed to answer questions.
    pub fn validate_rag(&self) -> Result<()> {
        require(&self.rag.region, "AWS_BEDROCK_REGION")?;
        require(&self.rag.knowledge_base_id, "KNOWLEDGE_BASE_ID")?;
        require(&self.rag.model_id, "AWS_BEDROCK_MODEL_ID")?;

        if self.rag.num_results == 0 {
            return Err(RagError::Config(
                "rag.num_results must be at least 1".to_string(),
            ));
        }
        self.validate_timeout()?;
        validate_decoding(&self.rag.decoding, "rag")
    }

    /// Validate the settings needed to score answers.
    pub fn validate_judge(&self) -> Result<()> {
        require(&self.judge.region, "AWS_EVALUATOR_REGION")?;
        require(&self.judge.model_id, "AWS_EVALUATOR_MODEL_ID")?;
        self.validate_timeout()?;
        validate_decoding(&self.judge.decoding, "judge")?;

        // Failed judge calls score 0, so the threshold must be positive.
        let threshold = self.evaluation.threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(RagError::Config(format!(
                "evaluation.threshold must be within (0, 1], got {}",
                threshold
            )));
        }
        if self.evaluation.max_concurrency == 0 {
            return Err(RagError::Config(
                "evaluation.max_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_timeout(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(RagError::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate everything an evaluation run needs.
    pub fn validate(&self) -> Result<()> {
        self.validate_rag()?;
        self.validate_judge()
    }
}

fn require(value: &str, variable: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RagError::Config(format!(
            "{} is required. Set it in the environment, a .env file, or the config file.",
            variable
        )));
    }
    Ok(())
}

fn validate_decoding(decoding: &DecodingConfig, section: &str) -> Result<()> {
    if !(0.0..=1.0).contains(&decoding.temperature) || !(0.0..=1.0).contains(&decoding.top_p) {
        return Err(RagError::Config(format!(
            "{}.decoding temperature and top_p must be within [0, 1]",
            section
        )));
    }
    if decoding.max_gen_len == 0 {
        return Err(RagError::Config(format!(
            "{}.decoding.max_gen_len must be at least 1",
            section
        )));
    }
    Ok(())
}
