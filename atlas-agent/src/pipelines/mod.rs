//! Tool pipelines: linear sub-graphs invoked when the agent calls a tool
//! (spec §4.6-§4.8). Each module exposes a `nodes()` constructor returning its
//! ordered `Node<TurnState>` chain plus the tool name it answers to.

pub mod docs;
pub mod graphql;
mod shared;
pub mod sql;

pub use docs::{docs_pipeline_nodes, DocManifest};
pub use graphql::{graphql_pipeline_nodes, GraphqlBudget};
pub use shared::{max_queries_exceeded_node, MAX_QUERIES_EXCEEDED_NODE_ID};
pub use sql::{sql_pipeline_nodes, TableCatalog};

/// Tool names exposed to the LLM (spec §6.1). Identical argument shape
/// `{question: string, context?: string}` across all three.
pub const QUERY_TOOL: &str = "query_tool";
pub const ATLAS_GRAPHQL: &str = "atlas_graphql";
pub const DOCS_TOOL: &str = "docs_tool";

/// First node id of each pipeline, what `tool_calls[0].name` routes to.
pub fn first_node_for_tool(tool_name: &str) -> Option<&'static str> {
    match tool_name {
        QUERY_TOOL => Some(sql::EXTRACT_TOOL_QUESTION),
        ATLAS_GRAPHQL => Some(graphql::EXTRACT_GRAPHQL_QUESTION),
        DOCS_TOOL => Some(docs::EXTRACT_DOCS_QUESTION),
        _ => None,
    }
}
