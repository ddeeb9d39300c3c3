// src/safety/keyword.rs
// First-pass lexical risk screen: case-insensitive scan of the transcript
// against the configured keyword tiers, highest priority first. A higher
// tier match wins outright; lower tiers are never consulted after a hit.

use std::sync::Arc;

use metrics::counter;
use tracing::info;

use super::{
    DEFAULT_DEESCALATION_SCRIPT, RiskAssessment, RiskLevel, RiskPayload, SafetyAuditLog,
};
use crate::config::prompts::PromptStore;

pub struct KeywordScreen {
    prompts: Arc<PromptStore>,
    audit: Arc<SafetyAuditLog>,
}

impl KeywordScreen {
    pub fn new(prompts: Arc<PromptStore>, audit: Arc<SafetyAuditLog>) -> Self {
        Self { prompts, audit }
    }

    /// Scan the transcript. Returns `None` when no configured keyword
    /// matches; that is the normal case, not an error.
    pub fn check(&self, transcript: &str, session_id: &str) -> Option<RiskAssessment> {
        let transcript_lower = transcript.to_lowercase();
        let risk = &self.prompts.risk;

        for keyword in &risk.high_risk.keywords {
            if transcript_lower.contains(&keyword.to_lowercase()) {
                self.audit.warn(
                    session_id,
                    &format!(
                        "KEYWORD CHECK: HIGH RISK DETECTED! Keyword: '{}'. Transcript: '{}'",
                        keyword, transcript
                    ),
                );
                counter!("sawt_safety_detections_total", "pass" => "keyword", "level" => "high")
                    .increment(1);
                return Some(RiskAssessment {
                    level: RiskLevel::High,
                    payload: RiskPayload::Script(script_or_default(
                        risk.high_risk.response_script.as_deref(),
                    )),
                });
            }
        }

        for keyword in &risk.medium_risk.keywords {
            if transcript_lower.contains(&keyword.to_lowercase()) {
                self.audit.warn(
                    session_id,
                    &format!(
                        "KEYWORD CHECK: MEDIUM RISK DETECTED! Keyword: '{}'. Transcript: '{}'",
                        keyword, transcript
                    ),
                );
                counter!("sawt_safety_detections_total", "pass" => "keyword", "level" => "medium")
                    .increment(1);
                return Some(RiskAssessment {
                    level: RiskLevel::Medium,
                    payload: RiskPayload::Script(script_or_default(
                        risk.medium_risk.response_script.as_deref(),
                    )),
                });
            }
        }

        for keyword in &risk.low_risk.keywords {
            if transcript_lower.contains(&keyword.to_lowercase()) {
                info!(
                    "[{}] KEYWORD CHECK: LOW RISK DETECTED. Keyword: '{}'.",
                    session_id, keyword
                );
                counter!("sawt_safety_detections_total", "pass" => "keyword", "level" => "low")
                    .increment(1);
                return Some(RiskAssessment {
                    level: RiskLevel::Low,
                    payload: RiskPayload::Instruction(
                        risk.low_risk.prompt_injection.clone().unwrap_or_default(),
                    ),
                });
            }
        }

        None
    }
}

/// A detection with no configured script still produces a fixed reply.
pub(crate) fn script_or_default(script: Option<&str>) -> String {
    match script {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => DEFAULT_DEESCALATION_SCRIPT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::prompts::{InjectedTier, RiskTables, ScriptedTier};

    fn screen() -> KeywordScreen {
        let prompts = PromptStore {
            system_prompt: "base".to_string(),
            semantic_prompt: None,
            risk: RiskTables {
                high_risk: ScriptedTier {
                    keywords: vec!["kill myself".into(), "end my life".into()],
                    response_script: Some("HIGH SCRIPT".into()),
                },
                medium_risk: ScriptedTier {
                    keywords: vec!["hopeless".into()],
                    response_script: Some("MEDIUM SCRIPT".into()),
                },
                low_risk: InjectedTier {
                    keywords: vec!["sad".into()],
                    prompt_injection: Some("Be gentle.".into()),
                },
            },
        };
        KeywordScreen::new(Arc::new(prompts), Arc::new(SafetyAuditLog::disabled()))
    }

    #[test]
    fn high_keyword_returns_high_script() {
        let assessment = screen()
            .check("I want to kill myself", "s1")
            .expect("should match");
        assert_eq!(assessment.level, RiskLevel::High);
        assert_eq!(
            assessment.payload,
            RiskPayload::Script("HIGH SCRIPT".into())
        );
        assert!(assessment.short_circuits());
    }

    #[test]
    fn high_wins_over_medium_and_low() {
        // Transcript carries all three tiers; HIGH must win.
        let assessment = screen()
            .check("I feel sad and hopeless and want to end my life", "s1")
            .unwrap();
        assert_eq!(assessment.level, RiskLevel::High);
    }

    #[test]
    fn medium_wins_over_low() {
        let assessment = screen().check("I feel sad and hopeless", "s1").unwrap();
        assert_eq!(assessment.level, RiskLevel::Medium);
        assert_eq!(
            assessment.payload,
            RiskPayload::Script("MEDIUM SCRIPT".into())
        );
    }

    #[test]
    fn low_carries_instruction_and_does_not_short_circuit() {
        let assessment = screen().check("I feel a bit sad today", "s1").unwrap();
        assert_eq!(assessment.level, RiskLevel::Low);
        assert_eq!(
            assessment.payload,
            RiskPayload::Instruction("Be gentle.".into())
        );
        assert!(!assessment.short_circuits());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let assessment = screen().check("I WANT TO KILL MYSELF", "s1").unwrap();
        assert_eq!(assessment.level, RiskLevel::High);
    }

    #[test]
    fn no_keyword_yields_no_assessment() {
        assert!(screen().check("the weather is lovely", "s1").is_none());
    }

    #[test]
    fn missing_script_substitutes_builtin_line() {
        assert_eq!(script_or_default(None), DEFAULT_DEESCALATION_SCRIPT);
        assert_eq!(script_or_default(Some("")), DEFAULT_DEESCALATION_SCRIPT);
        assert_eq!(script_or_default(Some("x")), "x");
    }
}
