// tests/common/mod.rs
// Shared doubles for the integration tests: scripted engine clients, a
// recording model provider, and a recording turn sink.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use bytes::Bytes;

use sawt_backend::api::ws::TurnSink;
use sawt_backend::audio::AudioDecoder;
use sawt_backend::config::prompts::{InjectedTier, PromptStore, RiskTables, ScriptedTier};
use sawt_backend::generation::ResponseGenerator;
use sawt_backend::llm::{LlmProvider, Message, Response};
use sawt_backend::safety::SafetyAuditLog;
use sawt_backend::speech::{SpeechToText, TextToSpeech};

// ---------------------------------------------------------------------------
// Prompt store
// ---------------------------------------------------------------------------

/// A small but fully populated prompt store, mirroring the production YAML.
pub fn test_prompts() -> Arc<PromptStore> {
    Arc::new(PromptStore {
        system_prompt: "You are a supportive companion.".to_string(),
        risk: RiskTables {
            high_risk: ScriptedTier {
                keywords: vec!["kill myself".to_string(), "end my life".to_string()],
                response_script: Some("HIGH SCRIPT".to_string()),
            },
            medium_risk: ScriptedTier {
                keywords: vec!["hurt myself".to_string()],
                response_script: Some("MEDIUM SCRIPT".to_string()),
            },
            low_risk: InjectedTier {
                keywords: vec!["sad".to_string()],
                prompt_injection: Some("Be extra gentle this turn.".to_string()),
            },
        },
        semantic_prompt: Some("Classify the message.".to_string()),
    })
}

// ---------------------------------------------------------------------------
// Model provider double
// ---------------------------------------------------------------------------

/// One recorded `chat` invocation.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub system: String,
}

/// Scripted provider: answers with a fixed reply (or a fixed failure) and
/// records every call it receives.
pub struct ScriptedProvider {
    name: &'static str,
    reply: Result<String, String>,
    pub calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    pub fn replying(name: &'static str, reply: &str) -> Arc<Self> {
        Arc::new(Self {
            name,
            reply: Ok(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(name: &'static str, error: &str) -> Arc<Self> {
        Arc::new(Self {
            name,
            reply: Err(error.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> RecordedCall {
        self.calls.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn chat(&self, messages: Vec<Message>, system: String) -> Result<Response> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages,
            system,
        });
        match &self.reply {
            Ok(text) => Ok(Response {
                content: text.clone(),
                model: self.name.to_string(),
                latency_ms: 1,
            }),
            Err(e) => Err(anyhow!("{}", e)),
        }
    }
}

/// A generator with no semantic screen and the given fallback chain.
pub fn generator_with_providers(providers: Vec<Arc<dyn LlmProvider>>) -> ResponseGenerator {
    ResponseGenerator::new(
        test_prompts(),
        Arc::new(SafetyAuditLog::disabled()),
        None,
        providers,
    )
}

// ---------------------------------------------------------------------------
// Engine doubles
// ---------------------------------------------------------------------------

pub struct ScriptedDecoder {
    result: Result<Vec<u8>, String>,
}

impl ScriptedDecoder {
    pub fn ok(pcm: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(pcm.to_vec()),
        })
    }

    pub fn failing(error: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Err(error.to_string()),
        })
    }
}

impl AudioDecoder for ScriptedDecoder {
    fn decode(&self, _frame: &[u8]) -> Result<Vec<u8>> {
        match &self.result {
            Ok(pcm) => Ok(pcm.clone()),
            Err(e) => Err(anyhow!("{}", e)),
        }
    }
}

pub struct ScriptedStt {
    result: Result<Option<String>, String>,
}

impl ScriptedStt {
    pub fn transcribing(text: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(Some(text.to_string())),
        })
    }

    pub fn silent() -> Arc<Self> {
        Arc::new(Self { result: Ok(None) })
    }

    pub fn failing(error: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Err(error.to_string()),
        })
    }
}

#[async_trait]
impl SpeechToText for ScriptedStt {
    async fn transcribe(&self, _pcm: &[u8]) -> Result<Option<String>> {
        match &self.result {
            Ok(text) => Ok(text.clone()),
            Err(e) => Err(anyhow!("{}", e)),
        }
    }
}

pub struct ScriptedTts {
    result: Result<Vec<u8>, String>,
}

impl ScriptedTts {
    pub fn synthesizing(audio: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(audio.to_vec()),
        })
    }

    pub fn failing(error: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Err(error.to_string()),
        })
    }
}

#[async_trait]
impl TextToSpeech for ScriptedTts {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
        match &self.result {
            Ok(audio) => Ok(audio.clone()),
            Err(e) => Err(anyhow!("{}", e)),
        }
    }
}

// ---------------------------------------------------------------------------
// Turn sink double
// ---------------------------------------------------------------------------

/// Records everything sent to the client; can simulate a dead transport.
#[derive(Default)]
pub struct RecordingSink {
    pub audio: Vec<Bytes>,
    pub statuses: Vec<String>,
    pub fail_audio_send: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dead_transport() -> Self {
        Self {
            fail_audio_send: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl TurnSink for RecordingSink {
    async fn send_audio(&mut self, audio: Bytes) -> Result<()> {
        if self.fail_audio_send {
            return Err(anyhow!("connection reset by peer"));
        }
        self.audio.push(audio);
        Ok(())
    }

    async fn send_status(&mut self, message: &str) -> Result<()> {
        self.statuses.push(message.to_string());
        Ok(())
    }
}
