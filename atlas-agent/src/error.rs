//! Top-level node/graph error type.
//!
//! `AgentError` covers failures a node cannot recover from by itself: the
//! graph executor propagates these and stops the run. Recoverable,
//! node-local failures (a bad SQL query, a GraphQL error payload, a budget
//! cap) are not `AgentError` variants — they are written into `TurnState`
//! as data and handled by the next node, never raised as `Err`.

use thiserror::Error;

use crate::graph::{CompilationError, GraphInterrupt};
use crate::memory::CheckpointError;

/// Non-recoverable error from a node, the graph executor, or its dependencies.
#[derive(Debug, Error)]
pub enum AgentError {
    /// A node's own logic failed in a way the graph cannot route around.
    #[error("node {node_id} failed: {message}")]
    Node { node_id: String, message: String },

    /// The LLM provider call failed (network error, auth failure, malformed response).
    #[error("llm invocation failed: {0}")]
    Llm(String),

    /// Graph compilation failed (should only surface if a graph is built at runtime).
    #[error(transparent)]
    Compilation(#[from] CompilationError),

    /// The checkpoint store failed to persist or load a checkpoint.
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    /// A node requested a human-in-the-loop pause.
    #[error(transparent)]
    Interrupt(#[from] GraphInterrupt),

    /// Configuration was missing or invalid (e.g. an unset required API key).
    #[error("configuration error: {0}")]
    Config(String),

    /// Any other failure, wrapped for display without a dedicated variant.
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    pub fn node(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        AgentError::Node {
            node_id: node_id.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_error_display_includes_id_and_message() {
        let err = AgentError::node("sql_execute", "connection refused");
        let s = err.to_string();
        assert!(s.contains("sql_execute"));
        assert!(s.contains("connection refused"));
    }
}
