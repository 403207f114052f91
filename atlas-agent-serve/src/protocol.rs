//! Wire protocol between a WebSocket client and this server.
//!
//! Deliberately minimal compared to a generic tool-calling protocol (no
//! tools_list/tool_show/workspace requests — Ask-Atlas has no exposed tool
//! catalog, only turns): a client sends one [`ClientRequest`] per message and
//! receives zero or more [`ServerResponse::Event`]s followed by exactly one
//! terminal [`ServerResponse::Done`] or [`ServerResponse::Error`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    /// Runs one turn. `thread_id` continues an existing checkpointed
    /// conversation; omitted, a fresh thread id is generated server-side.
    Run {
        id: Option<String>,
        thread_id: Option<String>,
        message: String,
    },
    Ping { id: Option<String> },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerResponse {
    /// One `StreamData` envelope forwarded verbatim from the graph's custom
    /// stream channel (progress, tool results, etc).
    Event { id: Option<String>, data: Value },
    /// Terminal: the turn finished. `reply` is the agent's final message text.
    Done {
        id: Option<String>,
        thread_id: String,
        reply: String,
    },
    Error { id: Option<String>, error: String },
    Pong { id: Option<String> },
}

impl ServerResponse {
    pub fn error(id: Option<String>, error: impl Into<String>) -> Self {
        ServerResponse::Error { id, error: error.into() }
    }
}
