//! State update strategies for graph nodes.
//!
//! Ask-Atlas nodes always return the full `TurnState`, so the default
//! `ReplaceUpdater` is what every compiled graph uses; `FieldBasedUpdater`
//! is kept for callers building their own graphs on a different state shape.

mod updater;

pub use updater::{boxed_updater, BoxedStateUpdater, FieldBasedUpdater, ReplaceUpdater, StateUpdater};
