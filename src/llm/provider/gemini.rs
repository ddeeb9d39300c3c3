// src/llm/provider/gemini.rs
// Gemini provider using the Google AI API. The secondary backend in the
// fallback chain: history is replayed as Gemini `contents` with remapped
// role labels, and the live turn is the final user entry.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;

use super::{LlmProvider, Message, Response};
use crate::config::llm::GeminiConfig;

/// Gemini provider using the Google AI API
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(anyhow!("Gemini API key is required"));
        }

        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model,
            timeout,
        })
    }

    pub fn from_config(config: &GeminiConfig) -> Result<Self> {
        Self::new(
            config.api_key.clone(),
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.base_url, self.model, method, self.api_key
        )
    }

    fn parse_response(&self, response: Value, latency_ms: i64) -> Result<Response> {
        let candidate = response
            .get("candidates")
            .and_then(|c| c.get(0))
            .ok_or_else(|| anyhow!("No candidates in Gemini response"))?;

        let content = candidate
            .pointer("/content/parts")
            .and_then(|p| p.as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(Response {
            content,
            model: self.model.clone(),
            latency_ms,
        })
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn chat(&self, messages: Vec<Message>, system: String) -> Result<Response> {
        let start = Instant::now();
        debug!(
            "Sending request to Gemini {} with {} messages",
            self.model,
            messages.len()
        );

        let contents = messages_to_gemini_contents(&messages, &system);
        let request_body = serde_json::json!({ "contents": contents });

        let response = self
            .client
            .post(self.api_url("generateContent"))
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!("Gemini API returned {}: {}", status, error_text));
        }

        let response_body: Value = response.json().await?;
        let latency_ms = start.elapsed().as_millis() as i64;

        self.parse_response(response_body, latency_ms)
    }
}

/// Convert our Message format to Gemini API format.
/// Roles remap `assistant` -> `model`; the system prompt is folded into the
/// first user content since the v1beta generateContent shape carries no
/// standalone system role in `contents`.
pub fn messages_to_gemini_contents(messages: &[Message], system: &str) -> Vec<Value> {
    let mut contents = Vec::new();

    let system_text = if system.is_empty() {
        None
    } else {
        Some(system.to_string())
    };
    let mut system_added = false;

    for msg in messages {
        let role = match msg.role.as_str() {
            "assistant" => "model",
            "system" => continue, // handled separately
            _ => "user",
        };

        let text = if role == "user" && !system_added {
            system_added = true;
            match system_text {
                Some(ref sys) => format!("[System]\n{}\n\n[User]\n{}", sys, msg.content),
                None => msg.content.clone(),
            }
        } else {
            msg.content.clone()
        };

        if text.is_empty() {
            continue;
        }

        contents.push(serde_json::json!({
            "role": role,
            "parts": [{"text": text}]
        }));
    }

    // If system wasn't added (no user messages), add it as first message
    if !system_added {
        if let Some(sys) = system_text {
            contents.insert(
                0,
                serde_json::json!({
                    "role": "user",
                    "parts": [{"text": sys}]
                }),
            );
        }
    }

    contents
}
