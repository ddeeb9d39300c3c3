// src/llm/provider/mod.rs
// LLM Provider trait - clean, provider-agnostic interface

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod gemini;
pub mod openai;

// Export providers
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

/// Simple message format for all providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Basic chat response
#[derive(Debug, Clone)]
pub struct Response {
    pub content: String,
    pub model: String,
    pub latency_ms: i64,
}

/// Universal LLM provider interface.
///
/// `messages` is the accumulated conversation (user/assistant roles) with the
/// live user turn last; `system` is the composed system prompt. Each provider
/// is responsible for its own request shaping, including role-label remapping
/// where the backend uses different labels.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &'static str;

    /// Single-completion chat call with a bounded timeout.
    async fn chat(&self, messages: Vec<Message>, system: String) -> Result<Response>;
}
