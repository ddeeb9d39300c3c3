// src/speech/tts.rs
// Google Cloud Text-to-Speech REST client. A single long-lived client is
// shared across all connections and turns; the service cannot run without it.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::TextToSpeech;
use crate::config::speech::TtsConfig;

const BASE_URL: &str = "https://texttospeech.googleapis.com/v1";

#[derive(Clone)]
pub struct GoogleTtsClient {
    client: Client,
    api_key: String,
    language_code: String,
    ssml_gender: String,
    audio_encoding: String,
    timeout: Duration,
}

impl GoogleTtsClient {
    pub fn new(config: &TtsConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(anyhow!("Google API key is required for speech synthesis"));
        }

        Ok(Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            language_code: config.language_code.clone(),
            ssml_gender: config.ssml_gender.clone(),
            audio_encoding: config.audio_encoding.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}

#[async_trait]
impl TextToSpeech for GoogleTtsClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let request = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: &self.language_code,
                ssml_gender: &self.ssml_gender,
            },
            audio_config: AudioConfig {
                audio_encoding: &self.audio_encoding,
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/text:synthesize?key={}",
                BASE_URL, self.api_key
            ))
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Text-to-Speech API returned {}: {}",
                status,
                error_text
            ));
        }

        let body: SynthesizeResponse = response.json().await?;
        let audio = base64::engine::general_purpose::STANDARD
            .decode(body.audio_content)
            .map_err(|e| anyhow!("Invalid audio content in synthesis response: {}", e))?;

        debug!("TTS produced {} bytes of {}", audio.len(), self.audio_encoding);
        Ok(audio)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig<'a>,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    ssml_gender: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig<'a> {
    audio_encoding: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}
