//! `NodeMiddleware` that logs node entry/exit and timing via `tracing`.

use async_trait::async_trait;
use std::fmt::Debug;
use std::pin::Pin;
use std::time::Instant;

use crate::error::AgentError;

use super::logging::{log_node_complete, log_node_start};
use super::node_middleware::NodeMiddleware;
use super::Next;

/// Wraps every node run with start/complete tracing spans and a wall-clock timer.
pub struct LoggingNodeMiddleware;

#[async_trait]
impl<S> NodeMiddleware<S> for LoggingNodeMiddleware
where
    S: Clone + Send + Sync + Debug + 'static,
{
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: Box<
            dyn FnOnce(
                    S,
                ) -> Pin<
                    Box<dyn std::future::Future<Output = Result<(S, Next), AgentError>> + Send>,
                > + Send,
        >,
    ) -> Result<(S, Next), AgentError> {
        log_node_start(node_id);
        let started = Instant::now();
        let result = inner(state).await;
        let elapsed = started.elapsed();
        match &result {
            Ok(_) => {
                log_node_complete(node_id);
                tracing::debug!(node = node_id, elapsed_ms = elapsed.as_millis() as u64, "node ok");
            }
            Err(e) => {
                tracing::warn!(node = node_id, elapsed_ms = elapsed.as_millis() as u64, error = %e, "node failed");
            }
        }
        result
    }
}
