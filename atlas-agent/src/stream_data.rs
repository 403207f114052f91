//! `StreamData`: the domain-level event envelope a turn emits (spec §4.3).
//!
//! Carried over the graph executor's generic `StreamEvent::Custom` channel —
//! nodes serialize one of these and hand it to `StreamWriter::emit_custom`.
//! See `crate::turn_state::AtlasLink` for the link shape embedded in
//! `pipeline_state` payloads from the GraphQL pipeline.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum StreamData {
    NodeStart {
        node: String,
        label: String,
    },
    /// Node-specific structured payload emitted after a pipeline node completes.
    PipelineState {
        stage: String,
        #[serde(flatten)]
        payload: Value,
    },
    ToolCall {
        tool_call: String,
    },
    /// Token-by-token tool pipeline output visible to downstream consumers.
    ToolOutput {
        content: String,
    },
    /// Token-by-token final LLM answer to the user.
    AgentTalk {
        content: String,
    },
}

impl StreamData {
    pub fn node_start(node: impl Into<String>, label: impl Into<String>) -> Self {
        StreamData::NodeStart {
            node: node.into(),
            label: label.into(),
        }
    }

    pub fn pipeline_state(stage: impl Into<String>, payload: Value) -> Self {
        StreamData::PipelineState {
            stage: stage.into(),
            payload,
        }
    }

    pub fn tool_call(tool_call: impl Into<String>) -> Self {
        StreamData::ToolCall {
            tool_call: tool_call.into(),
        }
    }

    pub fn tool_output(content: impl Into<String>) -> Self {
        StreamData::ToolOutput {
            content: content.into(),
        }
    }

    pub fn agent_talk(content: impl Into<String>) -> Self {
        StreamData::AgentTalk {
            content: content.into(),
        }
    }

    /// Emits this envelope on `writer` if `StreamMode::Custom` is enabled.
    pub async fn emit<S>(self, writer: &crate::stream::StreamWriter<S>)
    where
        S: Clone + Send + Sync + std::fmt::Debug + 'static,
    {
        if let Ok(value) = serde_json::to_value(&self) {
            writer.try_emit_custom(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_start_serializes_with_tagged_message_type() {
        let data = StreamData::node_start("generate_sql", "Generate SQL");
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["message_type"], "node_start");
        assert_eq!(value["node"], "generate_sql");
    }

    #[test]
    fn pipeline_state_flattens_payload_alongside_stage() {
        let data = StreamData::pipeline_state("execute_sql", serde_json::json!({"row_count": 3}));
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["stage"], "execute_sql");
        assert_eq!(value["row_count"], 3);
    }
}
