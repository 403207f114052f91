//! `RunnableConfig`: per-invocation addressing for checkpointed graph runs.

/// Identifies which conversation/thread a `CompiledStateGraph::invoke` call
/// belongs to, and optionally pins it to a specific checkpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnableConfig {
    /// Required when a checkpointer is attached; identifies the conversation.
    pub thread_id: Option<String>,
    /// Namespace for nested/sub-graph checkpoints. Empty string for the top-level graph.
    pub checkpoint_ns: String,
    /// Load a specific checkpoint instead of the latest one (time travel, branching).
    pub checkpoint_id: Option<String>,
}

impl RunnableConfig {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            checkpoint_ns: String::new(),
            checkpoint_id: None,
        }
    }

    pub fn with_checkpoint_id(mut self, checkpoint_id: impl Into<String>) -> Self {
        self.checkpoint_id = Some(checkpoint_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_thread_id_and_defaults_rest() {
        let config = RunnableConfig::new("thread-1");
        assert_eq!(config.thread_id.as_deref(), Some("thread-1"));
        assert_eq!(config.checkpoint_ns, "");
        assert!(config.checkpoint_id.is_none());
    }
}
