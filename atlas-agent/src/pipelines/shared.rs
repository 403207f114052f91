//! Helpers shared by all three pipelines.

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Next, Node, RunContext};
use crate::message::Message;
use crate::stream_data::StreamData;
use crate::turn_state::TurnState;

pub const MAX_QUERIES_EXCEEDED_NODE_ID: &str = "max_queries_exceeded";

/// Reads `{question, context?}` off the originating tool call's JSON args.
pub fn parse_tool_args(args_json: &str) -> (String, String) {
    let value: serde_json::Value = serde_json::from_str(args_json).unwrap_or_default();
    let question = value
        .get("question")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();
    let context = value
        .get("context")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();
    (question, context)
}

/// Remaining tool calls on the triggering AIMessage beyond the first one
/// (spec §4.5/§5: only the first of parallel tool calls is dispatched; the
/// rest get an immediate ToolMessage explaining sequential execution).
pub fn rejected_parallel_tool_messages(state: &TurnState) -> Vec<Message> {
    let Some(ai) = state.last_ai_message() else {
        return Vec::new();
    };
    ai.tool_calls()
        .iter()
        .skip(1)
        .map(|call| {
            tracing::warn!(tool_call_id = %call.id, "rejecting parallel tool call; only the first is dispatched");
            Message::tool(
                "Parallel tool calls are not supported; only the first call in this turn was executed. Please retry this call in a subsequent turn.",
                call.id.clone(),
                call.name.clone(),
            )
        })
        .collect()
}

/// Short-circuit node reached when `queries_executed >= max_uses` for a
/// budget-counting tool (spec §4.6's `max_queries_exceeded` branch).
pub struct MaxQueriesExceededNode;

#[async_trait]
impl Node<TurnState> for MaxQueriesExceededNode {
    fn id(&self) -> &str {
        MAX_QUERIES_EXCEEDED_NODE_ID
    }

    async fn run_with_context(
        &self,
        mut state: TurnState,
        ctx: &RunContext<TurnState>,
    ) -> Result<(TurnState, Next), AgentError> {
        StreamData::node_start(self.id(), "Query budget exhausted")
            .emit(&ctx.stream_writer())
            .await;
        if let Some(call) = state.pending_tool_call().cloned() {
            state.messages.push(Message::tool(
                "The per-turn query limit has been reached. Summarize what you already know, or ask the user to start a new turn.",
                call.id,
                call.name,
            ));
        }
        for extra in rejected_parallel_tool_messages(&state) {
            state.messages.push(extra);
        }
        Ok((state, Next::Node(crate::agent_node::AGENT_NODE_ID.to_string())))
    }

    async fn run(&self, state: TurnState) -> Result<(TurnState, Next), AgentError> {
        self.run_with_context(state, &RunContext::new(Default::default())).await
    }
}

pub fn max_queries_exceeded_node() -> MaxQueriesExceededNode {
    MaxQueriesExceededNode
}
