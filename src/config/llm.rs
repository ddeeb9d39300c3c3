// src/config/llm.rs
// Model backend configuration (OpenAI primary, Gemini fallback, classifier)

use serde::{Deserialize, Serialize};

/// Primary model configuration (OpenAI chat completions)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: usize,
    pub frequency_penalty: f32,
    pub timeout_secs: u64,
}

impl OpenAiConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: super::helpers::env_or("OPENAI_API_KEY", ""),
            model: super::helpers::env_or("OPENAI_MODEL", "gpt-4o-mini"),
            temperature: super::helpers::env_f32("OPENAI_TEMPERATURE", 0.7),
            max_output_tokens: super::helpers::env_usize("OPENAI_MAX_OUTPUT_TOKENS", 150),
            frequency_penalty: super::helpers::env_f32("OPENAI_FREQUENCY_PENALTY", 0.5),
            timeout_secs: super::helpers::env_u64("OPENAI_TIMEOUT_SECS", 12),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Secondary model configuration (Gemini, history-replay API shape)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl GeminiConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: super::helpers::env_or("GEMINI_API_KEY", ""),
            model: super::helpers::env_or("GEMINI_MODEL", "gemini-1.5-pro-latest"),
            timeout_secs: super::helpers::env_u64("GEMINI_TIMEOUT_SECS", 12),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Semantic safety classifier configuration.
/// Zero temperature and a tiny output budget: the model answers with a label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub model: String,
    pub max_output_tokens: usize,
    pub timeout_secs: u64,
}

impl ClassifierConfig {
    pub fn from_env() -> Self {
        Self {
            model: super::helpers::env_or("SAWT_CLASSIFIER_MODEL", "gpt-4o-mini"),
            max_output_tokens: super::helpers::env_usize("SAWT_CLASSIFIER_MAX_TOKENS", 5),
            timeout_secs: super::helpers::env_u64("SAWT_CLASSIFIER_TIMEOUT_SECS", 5),
        }
    }
}
