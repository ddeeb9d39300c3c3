// src/safety/semantic.rs
// Second-pass semantic risk screen: a classification-only model call with a
// fixed system prompt, zero temperature, and a short output budget. Anything
// the model says outside the three expected labels - and any timeout or call
// failure - is treated as MEDIUM_RISK. An unparseable safety verdict is never
// treated as safe.

use std::sync::Arc;

use tracing::{error, info};

use super::SafetyAuditLog;
use crate::llm::{LlmProvider, Message};

/// The three labels a semantic check can produce. Nothing else escapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticVerdict {
    Safe,
    MediumRisk,
    HighRisk,
}

impl SemanticVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticVerdict::Safe => "SAFE",
            SemanticVerdict::MediumRisk => "MEDIUM_RISK",
            SemanticVerdict::HighRisk => "HIGH_RISK",
        }
    }
}

pub struct SemanticScreen {
    provider: Arc<dyn LlmProvider>,
    system_prompt: String,
    audit: Arc<SafetyAuditLog>,
}

impl SemanticScreen {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        system_prompt: String,
        audit: Arc<SafetyAuditLog>,
    ) -> Self {
        Self {
            provider,
            system_prompt,
            audit,
        }
    }

    /// Classify a transcript. Total: every input maps to exactly one verdict.
    pub async fn classify(&self, transcript: &str, session_id: &str) -> SemanticVerdict {
        info!(
            "[{}] SEMANTIC CHECK: Performing safety analysis on transcript...",
            session_id
        );

        let result = self
            .provider
            .chat(
                vec![Message::user(transcript)],
                self.system_prompt.clone(),
            )
            .await;

        match result {
            Ok(response) => {
                let label = response.content.trim().to_uppercase();
                info!("[{}] SEMANTIC CHECK: Result: {}", session_id, label);
                match label.as_str() {
                    "SAFE" => SemanticVerdict::Safe,
                    "MEDIUM_RISK" => SemanticVerdict::MediumRisk,
                    "HIGH_RISK" => SemanticVerdict::HighRisk,
                    other => {
                        self.audit.warn(
                            session_id,
                            &format!(
                                "SEMANTIC CHECK: model returned invalid classification: '{}'. Defaulting to MEDIUM_RISK.",
                                other
                            ),
                        );
                        SemanticVerdict::MediumRisk
                    }
                }
            }
            Err(e) => {
                error!("[{}] SEMANTIC CHECK: call failed: {}", session_id, e);
                SemanticVerdict::MediumRisk
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use crate::llm::Response;

    struct CannedProvider {
        reply: Option<String>,
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        fn name(&self) -> &'static str {
            "canned"
        }

        async fn chat(&self, _messages: Vec<Message>, _system: String) -> Result<Response> {
            match &self.reply {
                Some(text) => Ok(Response {
                    content: text.clone(),
                    model: "canned".to_string(),
                    latency_ms: 0,
                }),
                None => Err(anyhow!("simulated timeout")),
            }
        }
    }

    fn screen(reply: Option<&str>) -> SemanticScreen {
        SemanticScreen::new(
            Arc::new(CannedProvider {
                reply: reply.map(String::from),
            }),
            "classify".to_string(),
            Arc::new(SafetyAuditLog::disabled()),
        )
    }

    #[tokio::test]
    async fn maps_expected_labels() {
        assert_eq!(
            screen(Some("SAFE")).classify("hello", "s").await,
            SemanticVerdict::Safe
        );
        assert_eq!(
            screen(Some(" medium_risk \n")).classify("hello", "s").await,
            SemanticVerdict::MediumRisk
        );
        assert_eq!(
            screen(Some("HIGH_RISK")).classify("hello", "s").await,
            SemanticVerdict::HighRisk
        );
    }

    #[tokio::test]
    async fn unexpected_label_fails_closed() {
        assert_eq!(
            screen(Some("I think this is fine")).classify("hello", "s").await,
            SemanticVerdict::MediumRisk
        );
    }

    #[tokio::test]
    async fn call_failure_fails_closed() {
        assert_eq!(
            screen(None).classify("hello", "s").await,
            SemanticVerdict::MediumRisk
        );
    }
}
