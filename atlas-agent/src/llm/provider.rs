//! Provider/tier selection for the prompt registry (spec §4.4, §6.5).

use serde::{Deserialize, Serialize};

/// The three supported LLM providers, selected by configuration string key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Openai,
    Anthropic,
    Google,
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Provider::Openai),
            "anthropic" => Ok(Provider::Anthropic),
            "google" => Ok(Provider::Google),
            other => Err(format!("unknown LLM provider: {other}")),
        }
    }
}

pub use crate::prompts::ModelTier;

/// A concrete (provider, model) pair a tier resolves to.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub provider: Provider,
    pub model: String,
    pub api_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_str_is_case_insensitive() {
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::Openai);
        assert_eq!("ANTHROPIC".parse::<Provider>().unwrap(), Provider::Anthropic);
    }

    #[test]
    fn provider_from_str_rejects_unknown() {
        assert!("cohere".parse::<Provider>().is_err());
    }
}
