// src/generation/mod.rs
// Response generation for one turn: safety gates first, then the dynamic
// system prompt, then an ordered fallback chain of model providers. Exactly
// one of {fixed safety script, primary text, secondary text, fixed apology}
// comes back; this function never raises and never returns empty.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use tracing::{error, info};

use crate::config::prompts::PromptStore;
use crate::llm::{LlmProvider, Message};
use crate::safety::keyword::script_or_default;
use crate::safety::{
    KeywordScreen, RiskPayload, SafetyAuditLog, SemanticScreen, SemanticVerdict,
};

/// Fixed user-facing apology when every model backend fails.
pub const APOLOGY_SCRIPT: &str =
    "عفواً، أواجه صعوبة في الاتصال بخدمات الذكاء الاصطناعي حاليًا. الرجاء المحاولة مرة أخرى لاحقًا.";

pub struct ResponseGenerator {
    prompts: Arc<PromptStore>,
    keyword: KeywordScreen,
    /// `None` when the semantic check is misconfigured (no prompt or no
    /// classifier client). That state fails open to SAFE with an error log;
    /// see DESIGN.md for why this asymmetry is kept.
    semantic: Option<SemanticScreen>,
    /// Ordered fallback chain, tried in sequence without retries.
    providers: Vec<Arc<dyn LlmProvider>>,
    audit: Arc<SafetyAuditLog>,
}

impl ResponseGenerator {
    pub fn new(
        prompts: Arc<PromptStore>,
        audit: Arc<SafetyAuditLog>,
        semantic: Option<SemanticScreen>,
        providers: Vec<Arc<dyn LlmProvider>>,
    ) -> Self {
        Self {
            keyword: KeywordScreen::new(prompts.clone(), audit.clone()),
            prompts,
            semantic,
            providers,
            audit,
        }
    }

    /// Produce the reply text for one transcript. Total function: every call
    /// path returns a non-empty string.
    pub async fn respond(
        &self,
        transcript: &str,
        history: &[Message],
        session_id: &str,
        timestamp: DateTime<Utc>,
    ) -> String {
        // First pass: keyword check. HIGH/MEDIUM resolve the turn outright.
        let keyword_assessment = self.keyword.check(transcript, session_id);
        if let Some(assessment) = &keyword_assessment {
            if assessment.short_circuits() {
                if let RiskPayload::Script(script) = &assessment.payload {
                    return script.clone();
                }
            }
        }

        // Second pass: semantic check, only when the lexical pass did not
        // already resolve the turn.
        match &self.semantic {
            Some(screen) => match screen.classify(transcript, session_id).await {
                SemanticVerdict::HighRisk => {
                    counter!("sawt_safety_detections_total", "pass" => "semantic", "level" => "high")
                        .increment(1);
                    self.audit.warn(
                        session_id,
                        &format!(
                            "SEMANTIC CHECK: HIGH RISK DETECTED! Transcript: '{}'",
                            transcript
                        ),
                    );
                    return script_or_default(
                        self.prompts.risk.high_risk.response_script.as_deref(),
                    );
                }
                SemanticVerdict::MediumRisk => {
                    counter!("sawt_safety_detections_total", "pass" => "semantic", "level" => "medium")
                        .increment(1);
                    self.audit.warn(
                        session_id,
                        &format!(
                            "SEMANTIC CHECK: MEDIUM RISK DETECTED! Transcript: '{}'",
                            transcript
                        ),
                    );
                    return script_or_default(
                        self.prompts.risk.medium_risk.response_script.as_deref(),
                    );
                }
                SemanticVerdict::Safe => {}
            },
            None => {
                error!(
                    "[{}] Semantic safety check misconfigured. Defaulting to SAFE.",
                    session_id
                );
            }
        }

        // Per-turn dynamic system prompt: base template, optional LOW-risk
        // instruction, session metadata. Never cached.
        let mut system_prompt = self.prompts.system_prompt.clone();
        if let Some(assessment) = &keyword_assessment {
            if let RiskPayload::Instruction(instruction) = &assessment.payload {
                if !instruction.is_empty() {
                    system_prompt.push_str(&format!(
                        "\n\n# Special Instruction for This Turn\n{}",
                        instruction
                    ));
                }
            }
        }
        system_prompt.push_str(&format!(
            "\n\n# Session Context\n- **Session ID:** {}\n- **Timestamp (UTC):** {}",
            session_id,
            timestamp.to_rfc3339()
        ));

        let mut messages = history.to_vec();
        messages.push(Message::user(transcript));

        // Linear, retry-free fallback chain: first non-empty completion wins.
        for provider in &self.providers {
            info!(
                "[{}] MAIN AI: Attempting model via {}...",
                session_id,
                provider.name()
            );
            match provider
                .chat(messages.clone(), system_prompt.clone())
                .await
            {
                Ok(response) => {
                    let text = response.content.trim();
                    if text.is_empty() {
                        error!(
                            "[{}] MAIN AI: {} returned an empty completion; trying next provider",
                            session_id,
                            provider.name()
                        );
                        continue;
                    }
                    info!(
                        "[{}] MAIN AI: Received response from {} ({}ms)",
                        session_id,
                        provider.name(),
                        response.latency_ms
                    );
                    return text.to_string();
                }
                Err(e) => {
                    error!(
                        "[{}] MAIN AI: {} failed: {}",
                        session_id,
                        provider.name(),
                        e
                    );
                }
            }
        }

        APOLOGY_SCRIPT.to_string()
    }
}
