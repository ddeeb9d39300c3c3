// src/config/speech.rs
// Transcription and synthesis engine configuration (Google Cloud Speech REST)

use serde::{Deserialize, Serialize};

/// Speech-to-text configuration. The pipeline decodes every inbound frame to
/// this sample rate before transcription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttConfig {
    pub api_key: String,
    pub language_code: String,
    pub sample_rate_hertz: u32,
    pub timeout_secs: u64,
}

impl SttConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: super::helpers::env_or("GOOGLE_API_KEY", ""),
            language_code: super::helpers::env_or("SAWT_STT_LANGUAGE", "ar-OM"),
            sample_rate_hertz: super::helpers::env_u64("SAWT_STT_SAMPLE_RATE", 16_000) as u32,
            timeout_secs: super::helpers::env_u64("SAWT_STT_TIMEOUT_SECS", 15),
        }
    }
}

/// Text-to-speech configuration: fixed voice, locale, and output encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    pub api_key: String,
    pub language_code: String,
    pub ssml_gender: String,
    pub audio_encoding: String,
    pub timeout_secs: u64,
}

impl TtsConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: super::helpers::env_or("GOOGLE_API_KEY", ""),
            language_code: super::helpers::env_or("SAWT_TTS_LANGUAGE", "ar-OM"),
            ssml_gender: super::helpers::env_or("SAWT_TTS_GENDER", "FEMALE"),
            audio_encoding: super::helpers::env_or("SAWT_TTS_ENCODING", "MP3"),
            timeout_secs: super::helpers::env_u64("SAWT_TTS_TIMEOUT_SECS", 15),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
