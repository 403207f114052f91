//! Executable graph produced by `StateGraph::compile*`.
//!
//! `invoke` runs the graph to completion and returns the final state.
//! `stream` runs the graph on a background task and returns a channel of
//! `StreamEvent`s as nodes complete, for callers that want incremental output.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::pin::Pin;
use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::mpsc;

use crate::channels::{BoxedStateUpdater, StateUpdater};
use crate::error::AgentError;
use crate::memory::{
    Checkpoint, CheckpointMetadata, CheckpointSource, Checkpointer, RunnableConfig,
};

use super::conditional::NextEntry;
use super::interrupt::InterruptHandler;
use super::node::Node;
use super::node_middleware::NodeMiddleware;
use super::retry::RetryPolicy;
use super::Next;
use crate::stream::{StreamMode, StreamWriter};

use super::run_context::RunContext;

/// A compiled, immutable graph ready to run. Build one via `StateGraph::compile*`.
pub struct CompiledStateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub(crate) nodes: HashMap<String, Arc<dyn Node<S>>>,
    pub(crate) first_node_id: String,
    /// Linear execution order when the graph has no conditional edges; used only
    /// for diagnostics/visualization, not by `invoke` (which always follows `next_map`).
    #[allow(dead_code)]
    pub(crate) edge_order: Vec<String>,
    pub(crate) next_map: HashMap<String, NextEntry<S>>,
    pub(crate) checkpointer: Option<Arc<dyn Checkpointer<S>>>,
    pub(crate) middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    pub(crate) state_updater: BoxedStateUpdater<S>,
    pub(crate) retry_policy: RetryPolicy,
    pub(crate) interrupt_handler: Option<Arc<dyn InterruptHandler>>,
}

impl<S> CompiledStateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Runs the graph to completion (or until a node raises `AgentError`/interrupt),
    /// returning the final state. Saves a checkpoint after each node when both
    /// `config.thread_id` and a checkpointer are set.
    pub async fn invoke(&self, state: S, config: &RunnableConfig) -> Result<S, AgentError> {
        let writer = StreamWriter::noop();
        self.run_loop(state, config, &writer).await
    }

    /// Runs the graph like `invoke`, but also emits `StreamEvent`s for the
    /// requested `modes` on the returned channel as the run progresses.
    pub fn stream(
        self: Arc<Self>,
        state: S,
        config: RunnableConfig,
        modes: HashSet<StreamMode>,
    ) -> mpsc::Receiver<crate::stream::StreamEvent<S>> {
        let (tx, rx) = mpsc::channel(256);
        let writer = StreamWriter::new(Some(tx), modes);
        tokio::spawn(async move {
            let _ = self.run_loop(state, &config, &writer).await;
        });
        rx
    }

    async fn run_loop(
        &self,
        mut state: S,
        config: &RunnableConfig,
        writer: &StreamWriter<S>,
    ) -> Result<S, AgentError> {
        super::logging::log_graph_start(config.thread_id.as_deref());
        let mut current_id = self.first_node_id.clone();
        let mut step: i64 = 0;

        loop {
            let node = self
                .nodes
                .get(&current_id)
                .cloned()
                .ok_or_else(|| AgentError::node(&current_id, "node not found during run"))?;

            writer.emit_task_start(node.id()).await;
            let run_ctx = RunContext::new(config.clone())
                .with_stream_sender_from(writer);
            let (next_state, next) = match self
                .run_node_with_retry(node.clone(), state, &run_ctx)
                .await
            {
                Ok(ok) => ok,
                Err(e) => {
                    writer
                        .emit_task_end(&current_id, Err(e.to_string()))
                        .await;
                    super::logging::log_graph_error(config.thread_id.as_deref(), &e);
                    return Err(e);
                }
            };
            writer.emit_task_end(&current_id, Ok(())).await;
            super::logging::log_state_update(&current_id, &next_state);

            self.state_updater.apply_update(&mut state, &next_state);
            step += 1;

            writer.emit_values(state.clone()).await;
            writer.emit_updates(&current_id, state.clone()).await;

            if let Some(checkpointer) = &self.checkpointer {
                if config.thread_id.is_some() {
                    self.save_checkpoint(checkpointer.as_ref(), config, &state, step, writer)
                        .await?;
                }
            }

            let resolved_next = match next {
                Next::End => break,
                Next::Node(id) => id,
                Next::Continue => match self.next_map.get(&current_id) {
                    Some(NextEntry::Unconditional(id)) => id.clone(),
                    Some(NextEntry::Conditional(router)) => router.resolve(&state),
                    None => break,
                },
            };

            if resolved_next == super::state_graph::END {
                break;
            }
            current_id = resolved_next;
        }

        super::logging::log_graph_complete(config.thread_id.as_deref(), step as usize);
        Ok(state)
    }

    async fn run_node_with_retry(
        &self,
        node: Arc<dyn Node<S>>,
        state: S,
        ctx: &RunContext<S>,
    ) -> Result<(S, Next), AgentError> {
        let attempts = self.retry_policy.max_attempts();
        let mut last_err = None;
        for attempt in 1..=attempts {
            if attempt > 1 {
                let delay = self.retry_policy.delay_for_attempt(attempt - 1);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            match self.run_node_once(node.clone(), state.clone(), ctx).await {
                Ok(ok) => return Ok(ok),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| AgentError::node(node.id(), "exhausted retries")))
    }

    async fn run_node_once(
        &self,
        node: Arc<dyn Node<S>>,
        state: S,
        ctx: &RunContext<S>,
    ) -> Result<(S, Next), AgentError> {
        match &self.middleware {
            None => node.run_with_context(state, ctx).await,
            Some(middleware) => {
                let node_id = node.id().to_string();
                let ctx_owned = ctx.clone();
                let inner: Box<
                    dyn FnOnce(
                            S,
                        ) -> Pin<
                            Box<
                                dyn std::future::Future<Output = Result<(S, Next), AgentError>>
                                    + Send,
                            >,
                        > + Send,
                > = Box::new(move |s: S| {
                    let ctx = ctx_owned;
                    Box::pin(async move { node.run_with_context(s, &ctx).await })
                });
                middleware.around_run(&node_id, state, inner).await
            }
        }
    }

    async fn save_checkpoint(
        &self,
        checkpointer: &dyn Checkpointer<S>,
        config: &RunnableConfig,
        state: &S,
        step: i64,
        writer: &StreamWriter<S>,
    ) -> Result<(), AgentError> {
        let id = crate::memory::uuid6().to_string();
        let checkpoint = Checkpoint {
            v: crate::memory::CHECKPOINT_VERSION,
            id: id.clone(),
            ts: humantime_timestamp(),
            channel_values: state.clone(),
            channel_versions: HashMap::new(),
            versions_seen: HashMap::new(),
            updated_channels: None,
            pending_sends: Vec::new(),
            metadata: CheckpointMetadata {
                source: CheckpointSource::Loop,
                step,
                created_at: Some(SystemTime::now()),
                parents: HashMap::new(),
            },
        };
        checkpointer.put(config, &checkpoint).await?;
        writer
            .emit_checkpoint(
                id,
                checkpoint.ts.clone(),
                step,
                state.clone(),
                config.thread_id.clone(),
                Some(config.checkpoint_ns.clone()),
            )
            .await;
        Ok(())
    }
}

fn humantime_timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:09}", now.as_secs(), now.subsec_nanos())
}

impl<S> RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn with_stream_sender_from(self, writer: &StreamWriter<S>) -> Self {
        match writer.sender() {
            Some(tx) => self.with_stream_sender(tx.clone(), writer.modes().clone()),
            None => self,
        }
    }
}
