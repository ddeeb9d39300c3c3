// src/config/prompts.rs
// Persona/safety prompt store - loaded once at startup, read-only thereafter.
// Composes the structured YAML sections into a single immutable system prompt
// and holds the three-tier risk keyword tables for the safety screens.

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

/// Fallback prompt when the YAML cannot be loaded or parsed.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Composed prompt template plus risk tables. Immutable for process lifetime.
#[derive(Debug, Clone)]
pub struct PromptStore {
    pub system_prompt: String,
    pub risk: RiskTables,
    pub semantic_prompt: Option<String>,
}

/// Keyword tables in priority order. HIGH and MEDIUM tiers carry a fixed
/// de-escalation script; LOW carries an instruction injected into the next
/// model prompt instead of a direct reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RiskTables {
    #[serde(default)]
    pub high_risk: ScriptedTier,
    #[serde(default)]
    pub medium_risk: ScriptedTier,
    #[serde(default)]
    pub low_risk: InjectedTier,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptedTier {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub response_script: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InjectedTier {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub prompt_injection: Option<String>,
}

impl RiskTables {
    pub fn is_empty(&self) -> bool {
        self.high_risk.keywords.is_empty()
            && self.medium_risk.keywords.is_empty()
            && self.low_risk.keywords.is_empty()
    }
}

// ---------------------------------------------------------------------------
// YAML file shape. Every section defaults so a partial file still composes.
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct PromptFile {
    #[serde(default)]
    persona: Persona,
    #[serde(default)]
    rules_of_engagement: RulesOfEngagement,
    #[serde(default)]
    boundaries_and_limitations: Boundaries,
    #[serde(default)]
    cultural_context_omani: CulturalContext,
    #[serde(default)]
    therapeutic_framework_cbt: TherapeuticFramework,
    #[serde(default)]
    safety_protocol_critical: SafetyProtocol,
    #[serde(default)]
    risk_analysis_config: RiskTables,
    #[serde(default)]
    semantic_safety_check: SemanticCheck,
}

#[derive(Debug, Default, Deserialize)]
struct Persona {
    #[serde(default)]
    role: String,
    #[serde(default)]
    identity_declaration: String,
    #[serde(default)]
    language_and_dialect: LanguageAndDialect,
}

#[derive(Debug, Default, Deserialize)]
struct LanguageAndDialect {
    #[serde(default)]
    primary: String,
    #[serde(default)]
    instructions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RulesOfEngagement {
    #[serde(default)]
    primary_objective: String,
    #[serde(default)]
    communication_style: Vec<String>,
    #[serde(default)]
    interaction_method: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Boundaries {
    #[serde(default)]
    no_direct_advice: String,
    #[serde(default)]
    no_medical_diagnosis: String,
    #[serde(default)]
    no_personal_opinions: String,
    #[serde(default)]
    data_privacy_statement: String,
}

#[derive(Debug, Default, Deserialize)]
struct CulturalContext {
    #[serde(default)]
    islamic_values: Vec<String>,
    #[serde(default)]
    social_norms: Vec<String>,
    #[serde(default)]
    communication_etiquette: String,
}

#[derive(Debug, Default, Deserialize)]
struct TherapeuticFramework {
    #[serde(default)]
    active_listening: String,
    #[serde(default)]
    guided_discovery: String,
    #[serde(default)]
    cognitive_reframing: Vec<String>,
    #[serde(default)]
    behavioral_activation: String,
    #[serde(default)]
    handling_nuance: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SafetyProtocol {
    #[serde(default)]
    trigger_detection: Vec<String>,
    #[serde(default)]
    immediate_action_plan: Vec<String>,
    #[serde(default)]
    de_escalation_script: String,
}

#[derive(Debug, Default, Deserialize)]
struct SemanticCheck {
    #[serde(default)]
    system_prompt: Option<String>,
}

fn bullet_list(items: &[String]) -> String {
    items.join("\n- ")
}

impl PromptFile {
    /// Assemble the full system prompt from the structured sections.
    fn compose(&self) -> String {
        let persona = &self.persona;
        let rules = &self.rules_of_engagement;
        let bounds = &self.boundaries_and_limitations;
        let cultural = &self.cultural_context_omani;
        let framework = &self.therapeutic_framework_cbt;
        let protocol = &self.safety_protocol_critical;

        let pieces = [
            format!("# Persona\nRole: {}", persona.role),
            format!("Identity Declaration: {}", persona.identity_declaration),
            format!(
                "Language and Dialect: {}",
                persona.language_and_dialect.primary
            ),
            format!(
                "Language Instructions:\n- {}",
                bullet_list(&persona.language_and_dialect.instructions)
            ),
            format!(
                "\n# Rules of Engagement\nPrimary Objective: {}",
                rules.primary_objective
            ),
            format!(
                "Communication Style:\n- {}",
                bullet_list(&rules.communication_style)
            ),
            format!(
                "Interaction Method:\n- {}",
                bullet_list(&rules.interaction_method)
            ),
            format!(
                "\n# Boundaries and Limitations\nNo Direct Advice: {}",
                bounds.no_direct_advice
            ),
            format!("No Medical Diagnosis: {}", bounds.no_medical_diagnosis),
            format!("No Personal Opinions: {}", bounds.no_personal_opinions),
            format!(
                "Data Privacy Statement: {}",
                bounds.data_privacy_statement
            ),
            format!(
                "\n# Cultural Context: Omani\nIslamic Values:\n- {}",
                bullet_list(&cultural.islamic_values)
            ),
            format!("Social Norms:\n- {}", bullet_list(&cultural.social_norms)),
            format!(
                "Communication Etiquette: {}",
                cultural.communication_etiquette
            ),
            format!(
                "\n# Therapeutic Framework (based on CBT principles)\nActive Listening: {}",
                framework.active_listening
            ),
            format!("Guided Discovery: {}", framework.guided_discovery),
            format!(
                "Cognitive Reframing:\n- {}",
                bullet_list(&framework.cognitive_reframing)
            ),
            format!(
                "Behavioral Activation: {}",
                framework.behavioral_activation
            ),
            format!(
                "Handling Nuance:\n- {}",
                bullet_list(&framework.handling_nuance)
            ),
            format!(
                "\n# CRITICAL SAFETY PROTOCOL (Overrides all other rules)\nTrigger Detection:\n- {}",
                bullet_list(&protocol.trigger_detection)
            ),
            format!(
                "Immediate Action Plan:\n- {}",
                bullet_list(&protocol.immediate_action_plan)
            ),
            format!(
                "De-escalation Script (Use this exact text):\n{}",
                protocol.de_escalation_script
            ),
        ];

        pieces.join("\n")
    }
}

impl PromptStore {
    /// Load the prompt configuration from disk. Never fails: any read or
    /// parse error degrades to the minimal default prompt and empty risk
    /// tables with a critical-level error log, and the process still starts.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_yaml::from_str::<PromptFile>(&raw) {
                Ok(file) => {
                    let store = Self {
                        system_prompt: file.compose(),
                        semantic_prompt: file.semantic_safety_check.system_prompt.clone(),
                        risk: file.risk_analysis_config,
                    };
                    info!(
                        "Loaded prompt configuration from {} ({} high / {} medium / {} low keywords)",
                        path.display(),
                        store.risk.high_risk.keywords.len(),
                        store.risk.medium_risk.keywords.len(),
                        store.risk.low_risk.keywords.len(),
                    );
                    store
                }
                Err(e) => {
                    error!("CRITICAL: failed to parse {}: {}", path.display(), e);
                    Self::degraded()
                }
            },
            Err(e) => {
                error!("CRITICAL: failed to read {}: {}", path.display(), e);
                Self::degraded()
            }
        }
    }

    /// Minimal store used when the configuration cannot be loaded.
    pub fn degraded() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            risk: RiskTables::default(),
            semantic_prompt: None,
        }
    }
}
