//! In-memory stand-ins for the remote services, shared by unit tests.

use crate::error::{RagError, Result};
use crate::eval::{EvaluationCase, GoldenCase, JudgeModel};
use crate::rag::{Generator, Retriever};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn golden(input: &str, expected: &str) -> GoldenCase {
    GoldenCase {
        input: input.to_string(),
        expected_output: expected.to_string(),
        context: vec![format!("context for {}", input)],
        source_file: None,
    }
}

pub fn evaluation_case(
    input: &str,
    actual: &str,
    expected: &str,
    context: &[&str],
) -> EvaluationCase {
    EvaluationCase {
        input: input.to_string(),
        expected_output: expected.to_string(),
        context: context.iter().map(|c| c.to_string()).collect(),
        actual_output: actual.to_string(),
    }
}

/// Retriever returning fixed passages, or failing when built with `failing`.
pub struct FakeRetriever {
    passages: Option<Vec<String>>,
    queries: Mutex<Vec<String>>,
    last_num_results: Mutex<Option<usize>>,
}

impl FakeRetriever {
    pub fn with_passages(passages: &[&str]) -> Self {
        Self {
            passages: Some(passages.iter().map(|p| p.to_string()).collect()),
            queries: Mutex::new(Vec::new()),
            last_num_results: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            passages: None,
            queries: Mutex::new(Vec::new()),
            last_num_results: Mutex::new(None),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn last_num_results(&self) -> Option<usize> {
        *self.last_num_results.lock().unwrap()
    }
}

#[async_trait]
impl Retriever for FakeRetriever {
    async fn retrieve(&self, query: &str, num_results: usize) -> Result<Vec<String>> {
        self.queries.lock().unwrap().push(query.to_string());
        *self.last_num_results.lock().unwrap() = Some(num_results);

        match &self.passages {
            Some(passages) => Ok(passages.iter().take(num_results).cloned().collect()),
            None => Err(RagError::Http("connection refused".to_string())),
        }
    }
}

enum GeneratorReply {
    Fixed(String),
    EchoQuestion,
    Fail,
}

/// Generator recording every prompt it receives.
pub struct FakeGenerator {
    reply: GeneratorReply,
    prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn replying(answer: &str) -> Self {
        Self::with_reply(GeneratorReply::Fixed(answer.to_string()))
    }

    /// Answers `answer to <question>`, reading the question from the prompt.
    pub fn echoing_question() -> Self {
        Self::with_reply(GeneratorReply::EchoQuestion)
    }

    pub fn failing() -> Self {
        Self::with_reply(GeneratorReply::Fail)
    }

    fn with_reply(reply: GeneratorReply) -> Self {
        Self {
            reply,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        match &self.reply {
            GeneratorReply::Fixed(answer) => Ok(answer.clone()),
            GeneratorReply::EchoQuestion => {
                let question = prompt
                    .split_once("Question:\n")
                    .and_then(|(_, rest)| rest.split_once("\n\nAnswer:"))
                    .map(|(q, _)| q)
                    .unwrap_or_default();
                Ok(format!("answer to {}", question))
            }
            GeneratorReply::Fail => Err(RagError::Api {
                service: "bedrock-runtime",
                status: 500,
                message: "internal error".to_string(),
            }),
        }
    }
}

type DelayFn = Box<dyn Fn(&str) -> Duration + Send + Sync>;

/// Judge replying by the actual output found in the prompt.
pub struct ScriptedJudge {
    name: String,
    replies: Vec<(String, String)>,
    delay: Option<DelayFn>,
    calls: AtomicUsize,
}

impl ScriptedJudge {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            replies: Vec::new(),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Reply with `reply` when the case's actual output is `actual_output`.
    pub fn reply(mut self, actual_output: &str, reply: &str) -> Self {
        self.replies
            .push((format!("Actual Output:\n{}\n", actual_output), reply.to_string()));
        self
    }

    /// Sleep before replying, for a duration chosen from the prompt.
    pub fn with_delay<F>(mut self, delay: F) -> Self
    where
        F: Fn(&str) -> Duration + Send + Sync + 'static,
    {
        self.delay = Some(Box::new(delay));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JudgeModel for ScriptedJudge {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = &self.delay {
            tokio::time::sleep(delay(prompt)).await;
        }

        self.replies
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .ok_or_else(|| RagError::Http("judge timed out".to_string()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
