//! Per-run context handed to `Node::run_with_context`.
//!
//! Wraps the pieces a node may need beyond its own state: a stream-event
//! emitter and the resolved `RunnableConfig` for this invocation.

use std::collections::HashSet;
use std::fmt::Debug;

use tokio::sync::mpsc;

use crate::memory::RunnableConfig;
use crate::stream::{StreamEvent, StreamMode, StreamWriter};

/// Context passed to `Node::run_with_context` for the current step.
#[derive(Clone)]
pub struct RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub config: RunnableConfig,
    stream_tx: Option<mpsc::Sender<StreamEvent<S>>>,
    stream_modes: HashSet<StreamMode>,
}

impl<S> RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(config: RunnableConfig) -> Self {
        Self {
            config,
            stream_tx: None,
            stream_modes: HashSet::new(),
        }
    }

    pub fn with_stream_sender(
        mut self,
        tx: mpsc::Sender<StreamEvent<S>>,
        modes: HashSet<StreamMode>,
    ) -> Self {
        self.stream_tx = Some(tx);
        self.stream_modes = modes;
        self
    }

    /// Returns a `StreamWriter` bound to this context's channel, or a no-op
    /// writer if no channel is attached (e.g. plain `invoke` without `stream`).
    pub fn stream_writer(&self) -> StreamWriter<S> {
        StreamWriter::new(self.stream_tx.clone(), self.stream_modes.clone())
    }
}
