//! Conversation messages exchanged between the user, the agent, and tool pipelines.
//!
//! `TurnState::messages` is an append-only log of these three variants. The
//! executor guarantees every `AIMessage` tool call eventually gets a matching
//! `ToolMessage` with the same `tool_call_id` (see spec §3.1's invariant).

use serde::{Deserialize, Serialize};

use crate::llm::LlmUsage;

/// One LLM-requested tool invocation, as parsed out of a provider response.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    /// Raw JSON-encoded arguments, e.g. `{"question": "...", "context": "..."}`.
    pub args: String,
}

/// Response metadata a provider attaches to a completion (finish reason, model id, etc).
/// Kept as a loose JSON map since providers disagree on shape.
pub type ResponseMetadata = serde_json::Map<String, serde_json::Value>;

/// One entry in `TurnState::messages`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "role")]
pub enum Message {
    #[serde(rename = "human")]
    Human { content: String },
    #[serde(rename = "ai")]
    Ai {
        content: String,
        #[serde(default)]
        tool_calls: Vec<ToolCallRequest>,
        #[serde(default)]
        usage_metadata: Option<LlmUsage>,
        #[serde(default)]
        response_metadata: ResponseMetadata,
    },
    #[serde(rename = "tool")]
    Tool {
        content: String,
        tool_call_id: String,
        name: String,
    },
}

impl Message {
    pub fn human(content: impl Into<String>) -> Self {
        Message::Human {
            content: content.into(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Message::Ai {
            content: content.into(),
            tool_calls: Vec::new(),
            usage_metadata: None,
            response_metadata: ResponseMetadata::new(),
        }
    }

    pub fn ai_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Message::Ai {
            content: content.into(),
            tool_calls,
            usage_metadata: None,
            response_metadata: ResponseMetadata::new(),
        }
    }

    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>, name: impl Into<String>) -> Self {
        Message::Tool {
            content: content.into(),
            tool_call_id: tool_call_id.into(),
            name: name.into(),
        }
    }

    /// The tool calls on this message, if it is an `Ai` message with any.
    pub fn tool_calls(&self) -> &[ToolCallRequest] {
        match self {
            Message::Ai { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    pub fn text_content(&self) -> &str {
        match self {
            Message::Human { content } => content,
            Message::Ai { content, .. } => content,
            Message::Tool { content, .. } => content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ai_with_tool_calls_round_trips_through_json() {
        let msg = Message::ai_with_tool_calls(
            "",
            vec![ToolCallRequest {
                id: "call_1".into(),
                name: "query_tool".into(),
                args: "{\"question\":\"hi\"}".into(),
            }],
        );
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tool_calls().len(), 1);
        assert_eq!(back.tool_calls()[0].name, "query_tool");
    }

    #[test]
    fn human_and_tool_have_no_tool_calls() {
        assert!(Message::human("hi").tool_calls().is_empty());
        assert!(Message::tool("ok", "call_1", "query_tool").tool_calls().is_empty());
    }
}
