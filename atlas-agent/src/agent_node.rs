//! The agent node: the single LLM-driven decision point every turn passes
//! through before and after each tool pipeline (spec §4.5).

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::graph::{Next, Node, RunContext};
use crate::llm::{LlmClient, ToolSchema};
use crate::message::Message;
use crate::pipelines::{self, MAX_QUERIES_EXCEEDED_NODE_ID};
use crate::prompts::{build_agent_system_prompt, DualToolStatus};
use crate::stream_data::StreamData;
use crate::timing::NodeTimer;
use crate::turn_state::TurnState;
use crate::usage::usage_record_from_llm_usage;

pub const AGENT_NODE_ID: &str = "agent";

/// Which tools are offered to the model this turn (spec §6.5's `agent_mode`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentMode {
    /// Both `query_tool` and `atlas_graphql` available.
    Auto,
    /// Both available, `atlas_graphql` is never rejected for being "in auto's discretion" -
    /// i.e. the same tool set as `Auto`, kept as a distinct named mode per configuration intent.
    GraphqlSql,
    /// Only `query_tool`.
    SqlOnly,
    /// Only `atlas_graphql`.
    GraphqlOnly,
}

impl AgentMode {
    fn offers_sql(&self) -> bool {
        matches!(self, AgentMode::Auto | AgentMode::GraphqlSql | AgentMode::SqlOnly)
    }

    fn offers_graphql(&self) -> bool {
        matches!(self, AgentMode::Auto | AgentMode::GraphqlSql | AgentMode::GraphqlOnly)
    }
}

fn query_tool_schema() -> ToolSchema {
    ToolSchema {
        name: pipelines::QUERY_TOOL.to_string(),
        description: "Runs a read-only SQL query against the trade-data warehouse to answer a specific, well-scoped question about trade flows, values, or classifications.".to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "question": {"type": "string", "description": "The specific question this query should answer."},
                "context": {"type": "string", "description": "Any additional technical context (units, prior results, constraints)."},
            },
            "required": ["question"],
        }),
    }
}

fn atlas_graphql_schema() -> ToolSchema {
    ToolSchema {
        name: pipelines::ATLAS_GRAPHQL.to_string(),
        description: "Queries the Atlas GraphQL API for pre-aggregated trade statistics (growth dynamics, product space, market share) and returns a deep link to the matching visualization.".to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "question": {"type": "string", "description": "The specific question this query should answer."},
                "context": {"type": "string", "description": "Any additional technical context."},
            },
            "required": ["question"],
        }),
    }
}

fn docs_tool_schema() -> ToolSchema {
    ToolSchema {
        name: pipelines::DOCS_TOOL.to_string(),
        description: "Retrieves methodology documentation to answer questions about how a metric is defined or computed.".to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "question": {"type": "string"},
                "context": {"type": "string"},
            },
            "required": ["question"],
        }),
    }
}

/// The single agent decision node: assembles the system prompt and available
/// tools for the configured mode and budget, calls the LLM, and routes to
/// whichever tool pipeline (or end of turn) the model's response implies.
pub struct AgentNode {
    pub llm: Arc<dyn LlmClient>,
    pub mode: AgentMode,
    pub max_uses: u32,
    pub docs_enabled: bool,
    pub sql_max_year: u32,
    pub graphql_max_year: u32,
    pub graphql_budget: Option<Arc<pipelines::GraphqlBudget>>,
}

impl AgentNode {
    fn available_tools(&self) -> Vec<ToolSchema> {
        let mut tools = Vec::new();
        if self.mode.offers_sql() {
            tools.push(query_tool_schema());
        }
        if self.mode.offers_graphql()
            && self.graphql_budget.as_ref().map_or(true, |b| b.available())
        {
            tools.push(atlas_graphql_schema());
        }
        if self.docs_enabled {
            tools.push(docs_tool_schema());
        }
        tools
    }

    fn system_prompt(&self) -> String {
        let dual_tool = if self.mode.offers_sql() && self.mode.offers_graphql() {
            let (remaining, max) = self
                .graphql_budget
                .as_ref()
                .map(|b| (b.max_requests().saturating_sub(b.used()), b.max_requests()))
                .unwrap_or((0, 0));
            Some(DualToolStatus {
                sql_max_year: self.sql_max_year,
                graphql_max_year: self.graphql_max_year,
                graphql_budget_remaining: remaining,
                graphql_budget_max: max,
            })
        } else {
            None
        };
        build_agent_system_prompt(dual_tool.as_ref(), self.docs_enabled)
    }
}

#[async_trait]
impl Node<TurnState> for AgentNode {
    fn id(&self) -> &str {
        AGENT_NODE_ID
    }

    async fn run_with_context(
        &self,
        mut state: TurnState,
        ctx: &RunContext<TurnState>,
    ) -> Result<(TurnState, Next), AgentError> {
        StreamData::node_start(self.id(), "Thinking")
            .emit(&ctx.stream_writer())
            .await;
        let mut timer = NodeTimer::start(self.id(), "agent");

        let mut messages = vec![Message::human(self.system_prompt())];
        messages.extend(state.messages.clone());
        let tools = self.available_tools();

        let llm_start = std::time::Instant::now();
        let response = self.llm.invoke(&messages, &tools).await?;
        timer.add_llm_ms(llm_start.elapsed().as_millis() as u64);
        if let Some(usage) = &response.usage {
            state.record_usage(usage_record_from_llm_usage(self.id(), "agent", "frontier", usage));
        }

        let ai_message = if response.tool_calls.is_empty() {
            Message::ai(response.content.clone())
        } else {
            Message::ai_with_tool_calls(response.content.clone(), response.tool_calls.clone())
        };
        state.messages.push(ai_message);
        state.record_timing(timer.finish());

        if !response.content.is_empty() {
            StreamData::agent_talk(response.content.clone())
                .emit(&ctx.stream_writer())
                .await;
        }

        let Some(first_call) = response.tool_calls.first() else {
            return Ok((state, Next::End));
        };
        StreamData::tool_call(first_call.name.clone())
            .emit(&ctx.stream_writer())
            .await;

        if state.queries_executed >= self.max_uses {
            return Ok((state, Next::Node(MAX_QUERIES_EXCEEDED_NODE_ID.to_string())));
        }
        match pipelines::first_node_for_tool(&first_call.name) {
            Some(node_id) => Ok((state, Next::Node(node_id.to_string()))),
            None => {
                state.last_error = format!("unknown tool requested: {}", first_call.name);
                Ok((state, Next::End))
            }
        }
    }

    async fn run(&self, state: TurnState) -> Result<(TurnState, Next), AgentError> {
        self.run_with_context(state, &RunContext::new(Default::default())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_only_mode_offers_only_sql() {
        assert!(AgentMode::SqlOnly.offers_sql());
        assert!(!AgentMode::SqlOnly.offers_graphql());
    }

    #[test]
    fn auto_mode_offers_both() {
        assert!(AgentMode::Auto.offers_sql());
        assert!(AgentMode::Auto.offers_graphql());
    }
}
