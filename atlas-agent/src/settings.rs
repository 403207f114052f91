//! Process-wide configuration surface (spec §6.5, §10.4).
//!
//! `Settings::load` bootstraps the process environment via the teacher's
//! `env_config::load_and_apply` (XDG `config.toml` + project `.env`, existing
//! env wins) and then reads every field documented in §6.5 from env vars,
//! applying compiled-in defaults where the spec allows one.
//!
//! Grounded in `original_source/src/config.py`'s `Settings` model; lives in
//! this crate rather than `atlas-agent-config` because it depends on
//! `AgentMode` and `ModelTier`, both defined here — `atlas-agent-config` sits
//! below this crate in the dependency graph and cannot see them. See
//! DESIGN.md for this deviation from the spec's literal `atlas-agent-config::Settings` naming.

use std::collections::HashMap;

use crate::agent_node::AgentMode;
use crate::error::AgentError;
use crate::llm::{ModelTier, Provider};

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_var(key).unwrap_or_else(|| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T, AgentError> {
    match env_var(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| AgentError::Config(format!("{key}: invalid value {raw:?}"))),
    }
}

/// Every field of spec §6.5, plus the checkpoint/app database URLs and the
/// three provider API keys (§10.4).
#[derive(Clone, Debug)]
pub struct Settings {
    pub agent_mode: AgentMode,
    pub max_queries_per_turn: u32,
    pub max_rows_per_query: u32,

    pub frontier_provider: Provider,
    pub frontier_model: String,
    pub lightweight_provider: Provider,
    pub lightweight_model: String,

    /// Prompt name -> tier, layered over `PromptName::default_tier()`.
    pub prompt_model_assignments: HashMap<String, ModelTier>,

    pub max_docs_per_selection: usize,
    pub docs_enabled: bool,
    pub docs_dir: String,

    pub sql_max_year: u32,
    pub graphql_max_year: u32,
    pub graphql_max_requests_per_turn: u32,
    pub graphql_endpoint: String,
    pub visualization_base_url: String,

    pub warehouse_url: String,
    pub checkpoint_db_path: String,
    pub app_db_path: String,

    pub openai_api_key: String,
    pub anthropic_api_key: String,
    pub google_api_key: String,

    /// Consumer-side only (`atlas-agent-serve`'s CORS layer); unused by the
    /// graph itself but part of the configuration surface §6.5 names.
    pub cors_origins: Vec<String>,
}

impl Settings {
    /// Loads XDG/`.env` layering for `app_name`, then reads every field.
    /// `override_dir`: see `env_config::load_and_apply`.
    pub fn load(app_name: &str, override_dir: Option<&std::path::Path>) -> Result<Self, AgentError> {
        env_config::load_and_apply(app_name, override_dir)
            .map_err(|e| AgentError::Config(format!("loading environment: {e}")))?;
        Self::from_env()
    }

    /// Reads settings from whatever is currently in `std::env`, without the
    /// XDG/`.env` bootstrap step (for tests, or callers that already applied it).
    pub fn from_env() -> Result<Self, AgentError> {
        let agent_mode = match env_var("AGENT_MODE").as_deref() {
            None => AgentMode::Auto,
            Some("auto") => AgentMode::Auto,
            Some("graphql_sql") => AgentMode::GraphqlSql,
            Some("sql_only") => AgentMode::SqlOnly,
            Some("graphql_only") => AgentMode::GraphqlOnly,
            Some(other) => return Err(AgentError::Config(format!("AGENT_MODE: unknown mode {other:?}"))),
        };

        let frontier_provider = env_or("FRONTIER_PROVIDER", "anthropic")
            .parse::<Provider>()
            .map_err(AgentError::Config)?;
        let lightweight_provider = env_or("LIGHTWEIGHT_PROVIDER", "anthropic")
            .parse::<Provider>()
            .map_err(AgentError::Config)?;

        let prompt_model_assignments = env_var("PROMPT_MODEL_ASSIGNMENTS")
            .map(|raw| parse_prompt_model_assignments(&raw))
            .transpose()?
            .unwrap_or_default();

        let cors_origins = env_var("CORS_ORIGINS")
            .map(|raw| raw.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        Ok(Settings {
            agent_mode,
            max_queries_per_turn: env_parse("MAX_QUERIES_PER_TURN", 5)?,
            max_rows_per_query: env_parse("MAX_ROWS_PER_QUERY", 500)?,

            frontier_provider,
            frontier_model: env_or("FRONTIER_MODEL", "claude-sonnet-4-5"),
            lightweight_provider,
            lightweight_model: env_or("LIGHTWEIGHT_MODEL", "claude-haiku-4-5"),

            prompt_model_assignments,

            // spec §10.4: 2, not model_config.py's stale 3 — see DESIGN.md.
            max_docs_per_selection: env_parse("MAX_DOCS_PER_SELECTION", 2usize)?,
            docs_enabled: env_parse("DOCS_ENABLED", true)?,
            docs_dir: env_or("DOCS_DIR", "docs/methodology"),

            sql_max_year: env_parse("SQL_MAX_YEAR", 2023)?,
            graphql_max_year: env_parse("GRAPHQL_MAX_YEAR", 2023)?,
            graphql_max_requests_per_turn: env_parse("GRAPHQL_MAX_REQUESTS_PER_TURN", 10)?,
            graphql_endpoint: env_or("GRAPHQL_ENDPOINT", "https://atlas.hks.harvard.edu/graphql"),
            visualization_base_url: env_or("VISUALIZATION_BASE_URL", "https://atlas.hks.harvard.edu"),

            warehouse_url: env_or("WAREHOUSE_URL", "warehouse.db"),
            checkpoint_db_path: env_or("CHECKPOINT_DB_PATH", "checkpoints.db"),
            app_db_path: env_or("APP_DB_PATH", "conversations.db"),

            openai_api_key: env_or("OPENAI_API_KEY", ""),
            anthropic_api_key: env_or("ANTHROPIC_API_KEY", ""),
            google_api_key: env_or("GOOGLE_API_KEY", ""),

            cors_origins,
        })
    }

    /// API key configured for `provider`, or a `Config` error naming the
    /// missing env var (fails fast rather than letting a client construct
    /// with an empty key and fail opaquely on first call).
    pub fn api_key_for(&self, provider: Provider) -> Result<String, AgentError> {
        let (key, env_name) = match provider {
            Provider::Openai => (&self.openai_api_key, "OPENAI_API_KEY"),
            Provider::Anthropic => (&self.anthropic_api_key, "ANTHROPIC_API_KEY"),
            Provider::Google => (&self.google_api_key, "GOOGLE_API_KEY"),
        };
        if key.is_empty() {
            return Err(AgentError::Config(format!("{env_name} is not set")));
        }
        Ok(key.clone())
    }
}

/// Parses `"sql_generation=frontier,document_selection=lightweight"`.
fn parse_prompt_model_assignments(raw: &str) -> Result<HashMap<String, ModelTier>, AgentError> {
    let mut map = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (name, tier) = entry
            .split_once('=')
            .ok_or_else(|| AgentError::Config(format!("PROMPT_MODEL_ASSIGNMENTS: malformed entry {entry:?}")))?;
        let tier = match tier.trim() {
            "frontier" => ModelTier::Frontier,
            "lightweight" => ModelTier::Lightweight,
            other => {
                return Err(AgentError::Config(format!(
                    "PROMPT_MODEL_ASSIGNMENTS: unknown tier {other:?} for {name:?}"
                )))
            }
        };
        map.insert(name.trim().to_string(), tier);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_var<T>(key: &str, value: &str, f: impl FnOnce() -> T) -> T {
        let prev = std::env::var(key).ok();
        std::env::set_var(key, value);
        let result = f();
        match prev {
            Some(v) => std::env::set_var(key, v),
            None => std::env::remove_var(key),
        }
        result
    }

    #[test]
    fn default_max_docs_per_selection_is_two() {
        std::env::remove_var("MAX_DOCS_PER_SELECTION");
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.max_docs_per_selection, 2);
    }

    #[test]
    fn unknown_agent_mode_is_a_config_error() {
        with_var("AGENT_MODE", "bogus", || {
            assert!(matches!(Settings::from_env(), Err(AgentError::Config(_))));
        });
    }

    #[test]
    fn api_key_for_missing_provider_is_a_config_error() {
        std::env::remove_var("ANTHROPIC_API_KEY");
        let settings = Settings::from_env().unwrap();
        assert!(matches!(settings.api_key_for(Provider::Anthropic), Err(AgentError::Config(_))));
    }

    #[test]
    fn prompt_model_assignments_parses_entries() {
        with_var("PROMPT_MODEL_ASSIGNMENTS", "document_selection=frontier", || {
            let settings = Settings::from_env().unwrap();
            assert_eq!(
                settings.prompt_model_assignments.get("document_selection"),
                Some(&ModelTier::Frontier)
            );
        });
    }
}
