//! Per-prompt tier assignment (spec §4.4).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Which of the two configured model tiers a prompt resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Complex reasoning, orchestration, SQL writing.
    Frontier,
    /// Extraction, classification, selection.
    Lightweight,
}

/// The nine named prompts a complete turn may invoke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PromptName {
    SqlGeneration,
    GraphqlClassification,
    GraphqlEntityExtraction,
    IdResolutionSelection,
    ProductExtraction,
    ProductCodeSelection,
    DocumentSelection,
    DocumentationSynthesis,
    AgentSystemPrompt,
}

impl PromptName {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptName::SqlGeneration => "sql_generation",
            PromptName::GraphqlClassification => "graphql_classification",
            PromptName::GraphqlEntityExtraction => "graphql_entity_extraction",
            PromptName::IdResolutionSelection => "id_resolution_selection",
            PromptName::ProductExtraction => "product_extraction",
            PromptName::ProductCodeSelection => "product_code_selection",
            PromptName::DocumentSelection => "document_selection",
            PromptName::DocumentationSynthesis => "documentation_synthesis",
            PromptName::AgentSystemPrompt => "agent_system_prompt",
        }
    }

    /// Default tier when `prompt_model_assignments` doesn't override it.
    fn default_tier(&self) -> ModelTier {
        match self {
            PromptName::SqlGeneration | PromptName::AgentSystemPrompt => ModelTier::Frontier,
            _ => ModelTier::Lightweight,
        }
    }
}

/// Maps each named prompt to a tier, per `prompt_model_assignments` (§6.5)
/// layered over the spec's documented defaults.
#[derive(Clone, Debug, Default)]
pub struct PromptRegistry {
    overrides: HashMap<String, ModelTier>,
}

impl PromptRegistry {
    pub fn new(overrides: HashMap<String, ModelTier>) -> Self {
        Self { overrides }
    }

    pub fn tier_for(&self, name: PromptName) -> ModelTier {
        self.overrides
            .get(name.as_str())
            .copied()
            .unwrap_or_else(|| name.default_tier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tiers_match_spec_examples() {
        let registry = PromptRegistry::default();
        assert_eq!(registry.tier_for(PromptName::SqlGeneration), ModelTier::Frontier);
        assert_eq!(
            registry.tier_for(PromptName::DocumentSelection),
            ModelTier::Lightweight
        );
    }

    #[test]
    fn override_replaces_default_tier() {
        let mut overrides = HashMap::new();
        overrides.insert("document_selection".to_string(), ModelTier::Frontier);
        let registry = PromptRegistry::new(overrides);
        assert_eq!(
            registry.tier_for(PromptName::DocumentSelection),
            ModelTier::Frontier
        );
    }
}
