//! Assembles the one `CompiledStateGraph<TurnState>` Ask-Atlas runs every
//! turn through: the agent node plus the three tool pipelines (spec §4.9).
//!
//! Control flow between the agent and a pipeline is carried entirely by each
//! node's own `Next::Node(..)` return value (see [`crate::graph::Next`]);
//! the `StateGraph` edges declared here exist only to satisfy the builder's
//! structural validation (every edge's endpoints must be registered nodes,
//! and at least one edge must terminate at `END`).

use std::sync::Arc;

use crate::agent_node::{AgentMode, AgentNode};
use crate::error::AgentError;
use crate::graph::{CompilationError, LoggingNodeMiddleware, StateGraph, END, START};
use crate::llm::LlmClient;
use crate::memory::Checkpointer;
use crate::pipelines::{self, docs, graphql, sql};
use crate::turn_state::TurnState;

/// Everything the graph builder needs to wire one turn's full node set.
pub struct GraphBuildConfig {
    pub agent_mode: AgentMode,
    pub max_uses: u32,
    pub docs_enabled: bool,
    pub sql_max_year: u32,
    pub graphql_max_year: u32,

    pub llm_frontier: Arc<dyn LlmClient>,
    pub llm_lightweight: Arc<dyn LlmClient>,

    pub table_catalog: Arc<sql::TableCatalog>,
    pub warehouse: Arc<tokio::sync::Mutex<rusqlite::Connection>>,
    pub max_rows: u32,

    pub graphql_budget: Arc<graphql::GraphqlBudget>,
    pub graphql_entity_lookup: Arc<std::collections::HashMap<String, String>>,
    pub graphql_http: reqwest::Client,
    pub graphql_endpoint: String,
    pub graphql_rate_limiter: Arc<tokio::sync::Semaphore>,
    pub visualization_base_url: String,

    pub doc_manifest: Arc<docs::DocManifest>,

    pub checkpointer: Arc<dyn Checkpointer<TurnState>>,
}

pub fn build_graph(
    config: GraphBuildConfig,
) -> Result<crate::graph::CompiledStateGraph<TurnState>, CompilationError> {
    let mut graph = StateGraph::<TurnState>::new();

    graph.add_node(
        crate::agent_node::AGENT_NODE_ID,
        Arc::new(AgentNode {
            llm: config.llm_frontier.clone(),
            mode: config.agent_mode,
            max_uses: config.max_uses,
            docs_enabled: config.docs_enabled,
            sql_max_year: config.sql_max_year,
            graphql_max_year: config.graphql_max_year,
            graphql_budget: Some(config.graphql_budget.clone()),
        }),
    );
    graph.add_node(
        pipelines::MAX_QUERIES_EXCEEDED_NODE_ID,
        Arc::new(pipelines::max_queries_exceeded_node()),
    );

    let sql_nodes = sql::sql_pipeline_nodes(
        config.llm_frontier.clone(),
        config.llm_lightweight.clone(),
        config.table_catalog.clone(),
        config.warehouse.clone(),
        config.max_rows,
        config.sql_max_year,
    );
    for (id, node) in sql::SQL_NODE_IDS.iter().zip(sql_nodes) {
        graph.add_node(*id, node);
    }
    for pair in sql::SQL_NODE_IDS.windows(2) {
        graph.add_edge(pair[0], pair[1]);
    }

    let graphql_nodes = graphql::graphql_pipeline_nodes(
        config.llm_lightweight.clone(),
        config.graphql_budget.clone(),
        config.graphql_entity_lookup.clone(),
        config.graphql_http.clone(),
        config.graphql_endpoint.clone(),
        config.visualization_base_url.clone(),
        config.graphql_rate_limiter.clone(),
    );
    for (id, node) in graphql::GRAPHQL_NODE_IDS.iter().zip(graphql_nodes) {
        graph.add_node(*id, node);
    }
    for pair in graphql::GRAPHQL_NODE_IDS.windows(2) {
        graph.add_edge(pair[0], pair[1]);
    }
    // classify_query can short-circuit straight to format_graphql_results
    // (budget exhausted / out of scope) via its own explicit Next::Node;
    // the edge above only covers the in-scope linear path.

    let docs_nodes = docs::docs_pipeline_nodes(config.llm_lightweight.clone(), config.doc_manifest.clone());
    for (id, node) in docs::DOCS_NODE_IDS.iter().zip(docs_nodes) {
        graph.add_node(*id, node);
    }
    for pair in docs::DOCS_NODE_IDS.windows(2) {
        graph.add_edge(pair[0], pair[1]);
    }

    graph.add_edge(START, crate::agent_node::AGENT_NODE_ID);
    graph.add_edge(crate::agent_node::AGENT_NODE_ID, END);

    graph.compile_with_checkpointer_and_middleware(config.checkpointer, Arc::new(LoggingNodeMiddleware))
}

/// Convenience wrapper matching `AgentError` for callers outside `graph`.
pub fn build_graph_checked(
    config: GraphBuildConfig,
) -> Result<crate::graph::CompiledStateGraph<TurnState>, AgentError> {
    build_graph(config).map_err(AgentError::from)
}
