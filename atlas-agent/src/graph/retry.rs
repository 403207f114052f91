//! Node-level retry policy for the graph executor.
//!
//! Ask-Atlas's own retry logic (SQL execution backoff, §4.6) is hand-rolled inside
//! the node itself rather than driven by the graph, since only that one node needs
//! to distinguish transient from terminal errors. This policy exists for nodes that
//! want the executor to retry any `AgentError` a node returns, uniformly.

use std::time::Duration;

/// How the executor should react when a node returns `Err(AgentError)`.
#[derive(Debug, Clone, Copy)]
pub enum RetryPolicy {
    /// Never retry; propagate the error immediately.
    None,
    /// Retry up to `max_retries` times with a fixed delay between attempts.
    Fixed {
        max_retries: u32,
        delay: Duration,
    },
    /// Retry up to `max_retries` times with exponentially increasing delay,
    /// starting at `initial_delay` and multiplying by `multiplier` each attempt,
    /// capped at `max_delay`.
    Exponential {
        max_retries: u32,
        initial_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
    },
}

impl RetryPolicy {
    pub fn exponential(
        max_retries: u32,
        initial_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
    ) -> Self {
        RetryPolicy::Exponential {
            max_retries,
            initial_delay,
            max_delay,
            multiplier,
        }
    }

    /// Number of attempts to make before giving up (including the first).
    pub fn max_attempts(&self) -> u32 {
        match self {
            RetryPolicy::None => 1,
            RetryPolicy::Fixed { max_retries, .. } => max_retries + 1,
            RetryPolicy::Exponential { max_retries, .. } => max_retries + 1,
        }
    }

    /// Delay to wait before the given (1-indexed) retry attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            RetryPolicy::None => Duration::ZERO,
            RetryPolicy::Fixed { delay, .. } => *delay,
            RetryPolicy::Exponential {
                initial_delay,
                max_delay,
                multiplier,
                ..
            } => {
                let scaled = initial_delay.as_secs_f64() * multiplier.powi(attempt as i32 - 1);
                Duration::from_secs_f64(scaled.min(max_delay.as_secs_f64()))
            }
        }
    }
}
