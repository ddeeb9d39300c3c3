// src/speech/mod.rs
// Transcription and synthesis engine seams. The turn pipeline only sees the
// traits; the Google REST clients are the production implementations.

pub mod stt;
pub mod tts;

use anyhow::Result;
use async_trait::async_trait;

pub use stt::GoogleSttClient;
pub use tts::GoogleTtsClient;

/// Single-utterance transcription. Input is mono 16 kHz s16le PCM.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Returns the first final non-empty transcript, or `None` when the
    /// engine produced nothing usable for this utterance.
    async fn transcribe(&self, pcm: &[u8]) -> Result<Option<String>>;
}

/// Speech synthesis with a fixed voice/locale/encoding configuration.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Returns the encoded audio bytes for the reply text.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}
