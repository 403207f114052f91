//! Conditional routing: choose the next node id from the post-node state.
//!
//! Registered per source node via `StateGraph::add_conditional_edges(source, path, path_map)`.
//! After `source` runs, `path(state)` is called; its return value is either the next
//! node id directly (`path_map` is `None`) or a key looked up in `path_map`.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// A routing function: post-node state in, routing key out.
pub type ConditionalRouterFn<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

/// Resolved jump target for a single step: either the graph's static edge order,
/// or a conditional router consulted at runtime.
#[derive(Clone)]
pub enum NextEntry<S> {
    /// Static successor node id (or `END`).
    Unconditional(String),
    /// Consult the router for the next node id.
    Conditional(ConditionalRouter<S>),
}

/// A routing function paired with an optional key -> node id map.
///
/// When `path_map` is `None`, `path`'s return value is used directly as the next
/// node id. When present, the return value is looked up in the map; if absent,
/// the key itself is used as the node id (so callers may return ids directly too).
#[derive(Clone)]
pub struct ConditionalRouter<S> {
    pub path: ConditionalRouterFn<S>,
    pub path_map: Option<HashMap<String, String>>,
}

impl<S> ConditionalRouter<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(path: ConditionalRouterFn<S>, path_map: Option<HashMap<String, String>>) -> Self {
        Self { path, path_map }
    }

    /// Resolve the next node id for the given post-node state.
    pub fn resolve(&self, state: &S) -> String {
        let key = (self.path)(state);
        match &self.path_map {
            Some(map) => map.get(&key).cloned().unwrap_or(key),
            None => key,
        }
    }
}
