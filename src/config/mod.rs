// src/config/mod.rs
// Central configuration for the Sawt backend

pub mod helpers;
pub mod llm;
pub mod prompts;
pub mod server;
pub mod speech;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

lazy_static! {
    pub static ref CONFIG: SawtConfig = SawtConfig::from_env();
}

/// Main configuration structure - composes all domain configs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SawtConfig {
    pub server: server::ServerConfig,
    pub logging: server::LoggingConfig,
    pub session: server::SessionConfig,
    pub openai: llm::OpenAiConfig,
    pub gemini: llm::GeminiConfig,
    pub classifier: llm::ClassifierConfig,
    pub stt: speech::SttConfig,
    pub tts: speech::TtsConfig,

    /// Path to the persona/safety prompt YAML, loaded once at startup.
    pub prompt_path: String,
}

impl SawtConfig {
    pub fn from_env() -> Self {
        // Don't panic if .env doesn't exist (for production)
        dotenv::dotenv().ok();

        Self {
            server: server::ServerConfig::from_env(),
            logging: server::LoggingConfig::from_env(),
            session: server::SessionConfig::from_env(),
            openai: llm::OpenAiConfig::from_env(),
            gemini: llm::GeminiConfig::from_env(),
            classifier: llm::ClassifierConfig::from_env(),
            stt: speech::SttConfig::from_env(),
            tts: speech::TtsConfig::from_env(),
            prompt_path: helpers::env_or("SAWT_PROMPT_PATH", "prompt.yaml"),
        }
    }
}
