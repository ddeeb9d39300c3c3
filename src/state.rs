// src/state.rs
// Application state shared across connections. Everything here is built once
// at startup, in a defined order, and read-only afterwards: the composed
// prompt store, the audit sink, the model providers, and the pooled speech
// engine clients. Only a missing synthesis client is fatal.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::audio::ContainerDecoder;
use crate::api::ws::TurnPipeline;
use crate::config::CONFIG;
use crate::config::prompts::PromptStore;
use crate::generation::ResponseGenerator;
use crate::llm::LlmProvider;
use crate::llm::provider::{GeminiProvider, OpenAiProvider};
use crate::safety::{SafetyAuditLog, SemanticScreen};
use crate::speech::{GoogleSttClient, GoogleTtsClient, SpeechToText, TextToSpeech};

/// Application state shared across handlers
pub struct AppState {
    pub prompts: Arc<PromptStore>,
    pub audit: Arc<SafetyAuditLog>,
    pub pipeline: Arc<TurnPipeline>,
}

impl AppState {
    pub fn new() -> Result<Self> {
        // 1. Audit sink first so every later init failure can be recorded.
        let audit = Arc::new(SafetyAuditLog::open(
            &CONFIG.logging.audit_log_path,
            CONFIG.logging.audit_max_bytes,
            CONFIG.logging.audit_max_backups,
        ));

        // 2. Prompt/keyword configuration. Degrades, never fails.
        let prompts = Arc::new(PromptStore::load(&CONFIG.prompt_path));

        // 3. Model providers, in fallback order: primary then secondary.
        let mut providers: Vec<Arc<dyn LlmProvider>> = Vec::new();
        match OpenAiProvider::conversational(&CONFIG.openai) {
            Ok(provider) => {
                info!("Primary model provider initialized ({})", provider.model());
                providers.push(Arc::new(provider));
            }
            Err(e) => error!("Failed to initialize primary model provider: {}", e),
        }
        match GeminiProvider::from_config(&CONFIG.gemini) {
            Ok(provider) => {
                info!(
                    "Secondary model provider initialized ({})",
                    provider.model()
                );
                providers.push(Arc::new(provider));
            }
            Err(e) => warn!("Secondary model fallback will be disabled: {}", e),
        }

        // 4. Semantic safety screen. Misconfiguration disables the screen
        //    (fail-open, logged); the generator reports it on every turn.
        let semantic = match (
            prompts.semantic_prompt.clone(),
            OpenAiProvider::classifier(CONFIG.openai.api_key.clone(), &CONFIG.classifier),
        ) {
            (Some(prompt), Ok(provider)) => Some(SemanticScreen::new(
                Arc::new(provider),
                prompt,
                audit.clone(),
            )),
            (None, _) => {
                error!("No semantic safety prompt configured; semantic screen disabled.");
                None
            }
            (_, Err(e)) => {
                error!("Failed to initialize classifier provider: {}", e);
                None
            }
        };

        let generator = Arc::new(ResponseGenerator::new(
            prompts.clone(),
            audit.clone(),
            semantic,
            providers,
        ));

        // 5. Speech engines. The synthesis client is the one hard startup
        //    requirement: the service cannot function without a voice.
        let tts: Arc<dyn TextToSpeech> = Arc::new(
            GoogleTtsClient::new(&CONFIG.tts)
                .context("Could not initialize the speech synthesis client")?,
        );
        let stt: Arc<dyn SpeechToText> = Arc::new(
            GoogleSttClient::new(&CONFIG.stt)
                .context("Could not initialize the transcription client")?,
        );

        let pipeline = Arc::new(TurnPipeline::new(
            Arc::new(ContainerDecoder),
            stt,
            tts,
            generator,
        ));

        Ok(Self {
            prompts,
            audit,
            pipeline,
        })
    }
}
