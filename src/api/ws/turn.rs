// src/api/ws/turn.rs
// The per-connection turn state machine:
//   AWAIT_AUDIO -> DECODE -> TRANSCRIBE -> RESPOND -> SYNTHESIZE -> SEND
// Stages run strictly in order, once per inbound frame. A failed stage
// aborts only the current turn; the connection keeps waiting for the next
// utterance. History grows only after a fully completed turn.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use metrics::{counter, histogram};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::audio::AudioDecoder;
use crate::generation::ResponseGenerator;
use crate::session::SessionContext;
use crate::speech::{SpeechToText, TextToSpeech};

/// Status notice sent when no usable transcript came out of an utterance.
pub const STATUS_NOT_UNDERSTOOD: &str = "لم ألتقط ذلك. الرجاء المحاولة مرة أخرى.";

/// Where a turn's output goes. The production sink is the WebSocket
/// connection; tests substitute a recording sink.
#[async_trait]
pub trait TurnSink: Send {
    /// Send synthesized reply audio as one binary message.
    async fn send_audio(&mut self, audio: Bytes) -> Result<()>;
    /// Send a structured status notice.
    async fn send_status(&mut self, message: &str) -> Result<()>;
}

/// Why a turn ended early. None of these terminate the connection.
#[derive(Debug, Error)]
pub enum TurnAbort {
    #[error("audio decode failed: {0}")]
    Decode(#[source] anyhow::Error),
    #[error("transcription failed: {0}")]
    Transcription(#[source] anyhow::Error),
    #[error("utterance produced no final transcript")]
    EmptyTranscript,
    #[error("speech synthesis failed: {0}")]
    Synthesis(#[source] anyhow::Error),
}

impl TurnAbort {
    fn stage(&self) -> &'static str {
        match self {
            TurnAbort::Decode(_) => "decode",
            TurnAbort::Transcription(_) | TurnAbort::EmptyTranscript => "transcribe",
            TurnAbort::Synthesis(_) => "synthesize",
        }
    }
}

#[derive(Debug)]
pub enum TurnOutcome {
    /// Empty inbound frame: a no-op, straight back to waiting.
    Idle,
    Completed {
        transcript: String,
        reply: String,
    },
    Aborted(TurnAbort),
}

pub struct TurnPipeline {
    decoder: Arc<dyn AudioDecoder>,
    stt: Arc<dyn SpeechToText>,
    tts: Arc<dyn TextToSpeech>,
    generator: Arc<ResponseGenerator>,
}

impl TurnPipeline {
    pub fn new(
        decoder: Arc<dyn AudioDecoder>,
        stt: Arc<dyn SpeechToText>,
        tts: Arc<dyn TextToSpeech>,
        generator: Arc<ResponseGenerator>,
    ) -> Self {
        Self {
            decoder,
            stt,
            tts,
            generator,
        }
    }

    /// Run one turn for one inbound frame. `Err` means the sink (transport)
    /// failed and the caller should terminate the connection loop; every
    /// other failure is a turn-level abort carried in the outcome.
    pub async fn run_turn(
        &self,
        frame: &[u8],
        session: &mut SessionContext,
        sink: &mut dyn TurnSink,
    ) -> Result<TurnOutcome> {
        let session_id = session.session_id().to_string();

        if frame.is_empty() {
            info!(
                "[{}] Received empty message; waiting for next utterance.",
                session_id
            );
            return Ok(TurnOutcome::Idle);
        }

        let turn_start = Instant::now();
        info!(
            "[{}] Received {} bytes of audio. Converting...",
            session_id,
            frame.len()
        );

        // DECODE (CPU-bound, no suspension)
        let pcm = match self.decoder.decode(frame) {
            Ok(pcm) => pcm,
            Err(e) => {
                error!("[{}] Failed to convert audio: {}", session_id, e);
                return Ok(self.abort(TurnAbort::Decode(e)));
            }
        };
        let decode_elapsed = turn_start.elapsed();
        histogram!("sawt_stage_duration_seconds", "stage" => "decode")
            .record(decode_elapsed.as_secs_f64());
        info!(
            "[{}] PERF: Audio conversion took {:.2}s",
            session_id,
            decode_elapsed.as_secs_f64()
        );

        // TRANSCRIBE
        let stt_start = Instant::now();
        let transcript = match self.stt.transcribe(&pcm).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                warn!(
                    "[{}] Transcription ended without a final transcript.",
                    session_id
                );
                sink.send_status(STATUS_NOT_UNDERSTOOD).await?;
                return Ok(self.abort(TurnAbort::EmptyTranscript));
            }
            Err(e) => {
                error!("[{}] Transcription request failed: {}", session_id, e);
                sink.send_status(STATUS_NOT_UNDERSTOOD).await?;
                return Ok(self.abort(TurnAbort::Transcription(e)));
            }
        };
        let stt_elapsed = stt_start.elapsed();
        histogram!("sawt_stage_duration_seconds", "stage" => "transcribe")
            .record(stt_elapsed.as_secs_f64());
        info!(
            "[{}] PERF: Transcription took {:.2}s",
            session_id,
            stt_elapsed.as_secs_f64()
        );
        info!("[{}] Final transcript: '{}'", session_id, transcript);

        // RESPOND - total, never aborts the turn
        let respond_start = Instant::now();
        let reply = self
            .generator
            .respond(&transcript, session.history(), &session_id, Utc::now())
            .await;
        let respond_elapsed = respond_start.elapsed();
        histogram!("sawt_stage_duration_seconds", "stage" => "respond")
            .record(respond_elapsed.as_secs_f64());
        info!(
            "[{}] PERF: Response generation took {:.2}s",
            session_id,
            respond_elapsed.as_secs_f64()
        );

        // SYNTHESIZE
        let tts_start = Instant::now();
        let audio = match self.tts.synthesize(&reply).await {
            Ok(audio) => audio,
            Err(e) => {
                error!("[{}] Speech synthesis failed: {}", session_id, e);
                return Ok(self.abort(TurnAbort::Synthesis(e)));
            }
        };
        let tts_elapsed = tts_start.elapsed();
        histogram!("sawt_stage_duration_seconds", "stage" => "synthesize")
            .record(tts_elapsed.as_secs_f64());
        info!(
            "[{}] PERF: Synthesis took {:.2}s",
            session_id,
            tts_elapsed.as_secs_f64()
        );

        // SEND, then commit the exchange to history. Aborted turns never
        // reach this point, so history reflects only completed turns.
        sink.send_audio(Bytes::from(audio)).await?;
        session.append_exchange(&transcript, &reply);

        let total = turn_start.elapsed().as_secs_f64();
        counter!("sawt_turns_total").increment(1);
        histogram!("sawt_stage_duration_seconds", "stage" => "turn").record(total);
        info!("[{}] PERF: Full turn processed in {:.2}s", session_id, total);

        Ok(TurnOutcome::Completed { transcript, reply })
    }

    fn abort(&self, abort: TurnAbort) -> TurnOutcome {
        counter!("sawt_turns_aborted_total", "stage" => abort.stage()).increment(1);
        TurnOutcome::Aborted(abort)
    }
}
