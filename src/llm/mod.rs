//! LLM integration module.
//!
//! Provides the Bedrock model clients (answer generation and the chat-style
//! judge endpoint) and the prompts they are fed.

mod client;
mod prompts;

pub use client::{
    ConverseClient, GenerationClient, NO_RESPONSE_GENERATED, UNEXPECTED_RESPONSE_FORMAT,
    extract_generation,
};
pub use prompts::Prompts;
