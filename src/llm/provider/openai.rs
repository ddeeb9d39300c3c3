// src/llm/provider/openai.rs
// OpenAI chat-completions provider (primary conversational model and the
// zero-temperature safety classifier share this implementation)

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

use super::{LlmProvider, Message, Response};
use crate::config::llm::{ClassifierConfig, OpenAiConfig};

const BASE_URL: &str = "https://api.openai.com/v1";

/// Fixed sampling parameters for one provider instance.
#[derive(Debug, Clone, Copy)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_output_tokens: usize,
    pub frequency_penalty: f32,
    pub timeout: Duration,
}

/// OpenAI chat-completions provider
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
    sampling: SamplingParams,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String, sampling: SamplingParams) -> Result<Self> {
        if api_key.is_empty() {
            return Err(anyhow!("OpenAI API key is required"));
        }

        Ok(Self {
            client: Client::new(),
            api_key,
            model,
            sampling,
        })
    }

    /// Provider instance for the main conversational turn.
    pub fn conversational(config: &OpenAiConfig) -> Result<Self> {
        Self::new(
            config.api_key.clone(),
            config.model.clone(),
            SamplingParams {
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
                frequency_penalty: config.frequency_penalty,
                timeout: Duration::from_secs(config.timeout_secs),
            },
        )
    }

    /// Provider instance for the semantic safety classifier: deterministic,
    /// tiny output budget, short timeout.
    pub fn classifier(api_key: String, config: &ClassifierConfig) -> Result<Self> {
        Self::new(
            api_key,
            config.model.clone(),
            SamplingParams {
                temperature: 0.0,
                max_output_tokens: config.max_output_tokens,
                frequency_penalty: 0.0,
                timeout: Duration::from_secs(config.timeout_secs),
            },
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send_request(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        debug!(
            "Sending request to OpenAI {} with {} messages",
            self.model,
            request.messages.len()
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", BASE_URL))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(self.sampling.timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(error_resp) = serde_json::from_str::<ErrorResponse>(&error_text) {
                return Err(anyhow!(
                    "OpenAI API error ({}): {}",
                    error_resp.error.error_type,
                    error_resp.error.message
                ));
            }

            return Err(anyhow!("OpenAI API returned {}: {}", status, error_text));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn chat(&self, messages: Vec<Message>, system: String) -> Result<Response> {
        let start = Instant::now();

        let mut chat_messages = Vec::with_capacity(messages.len() + 1);
        if !system.is_empty() {
            chat_messages.push(ChatMessage {
                role: "system".to_string(),
                content: system,
            });
        }
        chat_messages.extend(messages.into_iter().map(|m| ChatMessage {
            role: m.role,
            content: m.content,
        }));

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: chat_messages,
            temperature: self.sampling.temperature,
            max_tokens: self.sampling.max_output_tokens,
            frequency_penalty: self.sampling.frequency_penalty,
        };

        let response = self.send_request(&request).await?;
        let latency_ms = start.elapsed().as_millis() as i64;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| anyhow!("No choices in OpenAI response"))?;
        let content = choice.message.content.clone().unwrap_or_default();

        debug!(
            "OpenAI {} responded in {}ms ({} chars)",
            self.model,
            latency_ms,
            content.len()
        );

        Ok(Response {
            content,
            model: self.model.clone(),
            latency_ms,
        })
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: usize,
    frequency_penalty: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}
