//! `tracing`-based logging hooks for graph execution, used by `CompiledStateGraph`
//! and [`LoggingNodeMiddleware`](super::LoggingNodeMiddleware).

use std::fmt::Debug;

pub fn log_graph_start(thread_id: Option<&str>) {
    tracing::info!(thread_id = thread_id.unwrap_or("-"), "graph run starting");
}

pub fn log_graph_complete(thread_id: Option<&str>, steps: usize) {
    tracing::info!(
        thread_id = thread_id.unwrap_or("-"),
        steps,
        "graph run completed"
    );
}

pub fn log_graph_error(thread_id: Option<&str>, error: &dyn std::fmt::Display) {
    tracing::error!(thread_id = thread_id.unwrap_or("-"), %error, "graph run failed");
}

pub fn log_node_start(node_id: &str) {
    tracing::debug!(node = node_id, "node starting");
}

pub fn log_node_complete(node_id: &str) {
    tracing::debug!(node = node_id, "node completed");
}

pub fn log_state_update<S: Debug>(node_id: &str, state: &S) {
    tracing::trace!(node = node_id, state = ?state, "state updated");
}
