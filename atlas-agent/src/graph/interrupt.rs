//! Human-in-the-loop interrupts.
//!
//! A node can signal that a run should pause (e.g. waiting on operator approval)
//! by returning `GraphInterrupt` from its handler; the executor calls the
//! registered `InterruptHandler` to decide what happens next.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Raised by a node (or middleware) to request the run pause for external input.
#[derive(Debug, Clone, Error)]
#[error("graph interrupted: {reason}")]
pub struct GraphInterrupt {
    pub node_id: String,
    pub reason: String,
    pub payload: Option<Value>,
}

/// One pending interrupt plus whatever the handler decided to do about it.
#[derive(Debug, Clone)]
pub struct Interrupt {
    pub node_id: String,
    pub reason: String,
    pub resumed: bool,
}

/// Handles a `GraphInterrupt` raised during a run.
#[async_trait]
pub trait InterruptHandler: Send + Sync {
    /// Called when a node raises `GraphInterrupt`. Returning `Ok(true)` resumes
    /// the run from the same node; `Ok(false)` stops the run.
    async fn handle(&self, interrupt: &GraphInterrupt) -> Result<bool, GraphInterrupt>;
}

/// Default handler: never resumes, always stops the run.
pub struct DefaultInterruptHandler;

#[async_trait]
impl InterruptHandler for DefaultInterruptHandler {
    async fn handle(&self, interrupt: &GraphInterrupt) -> Result<bool, GraphInterrupt> {
        Ok(false).map_err(|_: GraphInterrupt| interrupt.clone())
    }
}
