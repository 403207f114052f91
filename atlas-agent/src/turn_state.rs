//! `TurnState`: the per-turn record threaded through every graph node.
//!
//! One instance is checkpointed per step (see [`crate::memory`]). Pipeline
//! scratchpads are grouped by pipeline and are zero-valued while that
//! pipeline is inactive (spec §3.1's invariant).

use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::timing::TimingRecord;
use crate::usage::UsageRecord;

/// Caller-supplied pin on which trade direction SQL generation should assume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectionOverride {
    Exports,
    Imports,
}

/// Caller-supplied pin on goods vs. services SQL generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeOverride {
    Goods,
    Services,
}

/// A product mention resolved (or pending resolution) against a classification schema.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResolvedProduct {
    pub product_name: String,
    pub classification_schema: String,
    pub codes: Vec<String>,
}

/// SQL pipeline scratchpad. Reset to default at the start of each SQL invocation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SqlScratchpad {
    pub question: String,
    pub context: String,
    pub classification_schemas: Vec<String>,
    pub products: Vec<ResolvedProduct>,
    pub table_info: String,
    pub sql: String,
    pub result: String,
    pub result_rows: Vec<Vec<String>>,
    pub result_columns: Vec<String>,
    pub execution_time_ms: u64,
    pub tables_referenced: Vec<String>,
}

/// GraphQL pipeline scratchpad. Reset to default at the start of each GraphQL invocation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GraphqlScratchpad {
    pub question: String,
    pub context: String,
    pub query_type: String,
    pub is_rejected: bool,
    pub rejection_reason: String,
    pub entities: serde_json::Map<String, serde_json::Value>,
    pub resolved_ids: serde_json::Map<String, serde_json::Value>,
    pub api_target: String,
    pub response: Option<serde_json::Value>,
    pub formatted: String,
    pub atlas_links: Vec<AtlasLink>,
    pub success: bool,
    pub execution_time_ms: u64,
}

/// A deep link into the public visualization site, generated by the GraphQL pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AtlasLink {
    pub url: String,
    pub label: String,
    pub link_type: String,
}

/// Docs pipeline scratchpad. Reset to default at the start of each docs invocation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DocsScratchpad {
    pub question: String,
    pub context: String,
    pub selected_files: Vec<String>,
    pub synthesis: String,
}

/// One per active turn; persisted (checkpointed) after every node completes.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TurnState {
    pub messages: Vec<Message>,

    /// Tool invocations that consumed budget this turn. Reset to 0 at turn start.
    pub queries_executed: u32,

    /// Empty when there is no pending error.
    pub last_error: String,
    pub retry_count: u32,

    pub sql: SqlScratchpad,
    pub graphql: GraphqlScratchpad,
    pub docs: DocsScratchpad,

    pub override_schema: Option<String>,
    pub override_direction: Option<DirectionOverride>,
    pub override_mode: Option<ModeOverride>,

    pub token_usage: Vec<UsageRecord>,
    pub step_timing: Vec<TimingRecord>,
}

impl TurnState {
    /// A fresh turn seeded with the user's message and any caller overrides.
    pub fn new(human_message: impl Into<String>) -> Self {
        let mut state = TurnState::default();
        state.messages.push(Message::human(human_message));
        state
    }

    pub fn last_ai_message(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| matches!(m, Message::Ai { .. }))
    }

    /// The first tool call on the most recent AIMessage, if any.
    pub fn pending_tool_call(&self) -> Option<&crate::message::ToolCallRequest> {
        self.last_ai_message().and_then(|m| m.tool_calls().first())
    }

    pub fn record_usage(&mut self, record: UsageRecord) {
        self.token_usage.push(record);
    }

    pub fn record_timing(&mut self, record: TimingRecord) {
        self.step_timing.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_seeds_a_single_human_message() {
        let state = TurnState::new("hello");
        assert_eq!(state.messages.len(), 1);
        assert!(matches!(state.messages[0], Message::Human { .. }));
        assert_eq!(state.queries_executed, 0);
    }

    #[test]
    fn pending_tool_call_reads_first_call_of_last_ai_message() {
        let mut state = TurnState::new("hi");
        state.messages.push(Message::ai_with_tool_calls(
            "",
            vec![crate::message::ToolCallRequest {
                id: "call_1".into(),
                name: "query_tool".into(),
                args: "{}".into(),
            }],
        ));
        let call = state.pending_tool_call().unwrap();
        assert_eq!(call.name, "query_tool");
    }
}
