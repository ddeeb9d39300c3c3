// src/speech/stt.rs
// Google Cloud Speech-to-Text REST client. One pooled client shared across
// connections; a recognize call is a single bounded HTTP round trip.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::SpeechToText;
use crate::config::speech::SttConfig;

const BASE_URL: &str = "https://speech.googleapis.com/v1";

#[derive(Clone)]
pub struct GoogleSttClient {
    client: Client,
    api_key: String,
    language_code: String,
    sample_rate_hertz: u32,
    timeout: Duration,
}

impl GoogleSttClient {
    pub fn new(config: &SttConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(anyhow!("Google API key is required for transcription"));
        }

        Ok(Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            language_code: config.language_code.clone(),
            sample_rate_hertz: config.sample_rate_hertz,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}

#[async_trait]
impl SpeechToText for GoogleSttClient {
    async fn transcribe(&self, pcm: &[u8]) -> Result<Option<String>> {
        let request = RecognizeRequest {
            config: RecognitionConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: self.sample_rate_hertz,
                language_code: &self.language_code,
                enable_automatic_punctuation: true,
            },
            audio: RecognitionAudio {
                content: base64::engine::general_purpose::STANDARD.encode(pcm),
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/speech:recognize?key={}",
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
            return Err(anyhow!("Speech API returned {}: {}", status, error_text));
        }

        let body: RecognizeResponse = response.json().await?;

        // Single-utterance capture: only the first final non-empty
        // alternative matters, remaining candidates are ignored.
        for result in body.results.unwrap_or_default() {
            for alternative in result.alternatives.unwrap_or_default() {
                let transcript = alternative.transcript.trim();
                if !transcript.is_empty() {
                    debug!("STT produced transcript of {} chars", transcript.len());
                    return Ok(Some(transcript.to_string()));
                }
            }
        }

        Ok(None)
    }
}

#[derive(Debug, Serialize)]
struct RecognizeRequest<'a> {
    config: RecognitionConfig<'a>,
    audio: RecognitionAudio,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig<'a> {
    encoding: &'static str,
    sample_rate_hertz: u32,
    language_code: &'a str,
    enable_automatic_punctuation: bool,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    results: Option<Vec<RecognitionResult>>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    alternatives: Option<Vec<RecognitionAlternative>>,
}

#[derive(Debug, Deserialize)]
struct RecognitionAlternative {
    #[serde(default)]
    transcript: String,
}
