// src/safety/mod.rs
// Two-pass risk screening over user utterances: a lexical keyword pass and a
// model-backed semantic pass, with an append-only audit trail for detections.

pub mod audit;
pub mod keyword;
pub mod semantic;

pub use audit::SafetyAuditLog;
pub use keyword::KeywordScreen;
pub use semantic::{SemanticScreen, SemanticVerdict};

/// Built-in de-escalation line used when a detection fires but the keyword
/// table carries no script (degraded configuration). Keeps the reply
/// guarantee intact: a crisis turn always gets a non-empty fixed response.
pub const DEFAULT_DEESCALATION_SCRIPT: &str =
    "أنا قلقة عليك، وأنت لست وحدك. الرجاء التواصل الآن مع شخص تثق به أو مع خدمات الطوارئ المحلية للحصول على الدعم الفوري.";

/// Lexical risk tiers, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::High => "HIGH",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::Low => "LOW",
        }
    }
}

/// What a detection carries: HIGH/MEDIUM produce a fixed script that becomes
/// the entire reply; LOW produces an instruction injected into the next
/// generation prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum RiskPayload {
    Script(String),
    Instruction(String),
}

/// One per-turn assessment, produced fresh and never stored.
#[derive(Debug, Clone)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub payload: RiskPayload,
}

impl RiskAssessment {
    /// True when this assessment resolves the turn on its own (no model call).
    pub fn short_circuits(&self) -> bool {
        matches!(self.level, RiskLevel::High | RiskLevel::Medium)
    }
}
