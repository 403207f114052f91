//! Wires [`Settings`] into a runnable [`AppRuntime`]: constructs the LLM
//! clients, opens the warehouse/checkpoint/conversation stores, and compiles
//! the graph (spec §10.6's `CheckpointerManager` fallback policy).
//!
//! Lives in this crate, not `atlas-agent-config`, for the same reason as
//! [`crate::settings::Settings`] — it depends on types (`TurnState`,
//! `Checkpointer`, `LlmClient`) that `atlas-agent-config` cannot see. See
//! DESIGN.md.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::build::{build_graph_checked, GraphBuildConfig};
use crate::conversation::{ConversationStore, MemoryConversationStore, SqliteConversationStore};
use crate::error::AgentError;
use crate::graph::CompiledStateGraph;
use crate::llm::{AnthropicClient, GoogleClient, LlmClient, OpenAiClient, Provider};
use crate::memory::{Checkpointer, JsonSerializer, MemorySaver, SqliteSaver};
use crate::pipelines::docs::DocManifest;
use crate::pipelines::graphql::GraphqlBudget;
use crate::pipelines::sql::TableCatalog;
use crate::settings::Settings;
use crate::turn_state::TurnState;

/// Everything a turn dispatcher (`atlas-agent-cli`, `atlas-agent-serve`) needs.
pub struct AppRuntime {
    pub graph: Arc<CompiledStateGraph<TurnState>>,
    pub conversations: Arc<dyn ConversationStore>,
    pub settings: Settings,
}

fn build_llm_client(provider: Provider, model: &str, api_key: String) -> Arc<dyn LlmClient> {
    match provider {
        Provider::Openai => Arc::new(OpenAiClient::new(api_key, model.to_string())),
        Provider::Anthropic => Arc::new(AnthropicClient::new(api_key, model.to_string())),
        Provider::Google => Arc::new(GoogleClient::new(api_key, model.to_string())),
    }
}

/// Compiles the graph and opens every store `settings` names, falling back
/// to in-memory stores when a SQLite path can't be opened (spec §10.6).
pub fn build_runtime(settings: Settings) -> Result<AppRuntime, AgentError> {
    let frontier = build_llm_client(
        settings.frontier_provider,
        &settings.frontier_model,
        settings.api_key_for(settings.frontier_provider)?,
    );
    let lightweight = build_llm_client(
        settings.lightweight_provider,
        &settings.lightweight_model,
        settings.api_key_for(settings.lightweight_provider)?,
    );

    let checkpointer: Arc<dyn Checkpointer<TurnState>> =
        match SqliteSaver::new(&settings.checkpoint_db_path, Arc::new(JsonSerializer)) {
            Ok(saver) => Arc::new(saver),
            Err(e) => {
                warn!(error = %e, path = %settings.checkpoint_db_path, "falling back to in-memory checkpointer");
                Arc::new(MemorySaver::new())
            }
        };

    let conversations: Arc<dyn ConversationStore> = match SqliteConversationStore::new(&settings.app_db_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(error = %e, path = %settings.app_db_path, "falling back to in-memory conversation store");
            Arc::new(MemoryConversationStore::new())
        }
    };

    let warehouse_conn = rusqlite::Connection::open(&settings.warehouse_url)
        .map_err(|e| AgentError::Config(format!("opening warehouse {}: {e}", settings.warehouse_url)))?;
    let warehouse = Arc::new(tokio::sync::Mutex::new(warehouse_conn));

    let doc_manifest = Arc::new(
        DocManifest::load_from_dir(std::path::Path::new(&settings.docs_dir)).unwrap_or_else(|e| {
            warn!(error = %e, dir = %settings.docs_dir, "no documentation manifest loaded");
            DocManifest::default()
        }),
    );

    let config = GraphBuildConfig {
        agent_mode: settings.agent_mode,
        max_uses: settings.max_queries_per_turn,
        docs_enabled: settings.docs_enabled,
        sql_max_year: settings.sql_max_year,
        graphql_max_year: settings.graphql_max_year,

        llm_frontier: frontier,
        llm_lightweight: lightweight,

        // The classification/table catalog is a deployment artifact (one
        // entry per warehouse table); an empty catalog here still lets the
        // graph compile and run, `generate_sql` simply gets no table hints.
        table_catalog: Arc::new(TableCatalog::default()),
        warehouse,
        max_rows: settings.max_rows_per_query,

        graphql_budget: Arc::new(GraphqlBudget::new(settings.graphql_max_requests_per_turn)),
        // Entity-name -> id resolution is loaded from the warehouse in a
        // full deployment; empty here means `resolve_ids` finds nothing,
        // which the pipeline already handles (empty `resolved_ids`).
        graphql_entity_lookup: Arc::new(HashMap::new()),
        graphql_http: reqwest::Client::new(),
        graphql_endpoint: settings.graphql_endpoint.clone(),
        // The Atlas GraphQL API's own rate limit: at most two requests in
        // flight across the whole process.
        graphql_rate_limiter: Arc::new(tokio::sync::Semaphore::new(2)),
        visualization_base_url: settings.visualization_base_url.clone(),

        doc_manifest,

        checkpointer,
    };

    let graph = Arc::new(build_graph_checked(config)?);

    Ok(AppRuntime {
        graph,
        conversations,
        settings,
    })
}
