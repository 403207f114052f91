//! Checkpoint data model.
//!
//! A `Checkpoint<S>` is a point-in-time snapshot of a graph run's state plus
//! the bookkeeping LangGraph-style checkpointers use for time travel and
//! resumption: channel versions, which channels changed on the last step,
//! and any sends that are still pending delivery.

use std::collections::HashMap;
use std::time::SystemTime;

use crate::memory::config::RunnableConfig;

/// Current on-disk/on-wire checkpoint schema version.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Reserved channel name for a node's raised error.
pub const ERROR: &str = "__error__";
/// Reserved channel name for a pending `GraphInterrupt`.
pub const INTERRUPT: &str = "__interrupt__";
/// Reserved channel name marking a checkpoint as a resume point.
pub const RESUME: &str = "__resume__";
/// Reserved channel name for a send scheduled but not yet delivered.
pub const SCHEDULED: &str = "__scheduled__";

/// Per-channel version token, bumped every time a channel is written.
pub type ChannelVersions = HashMap<String, String>;

/// Why a checkpoint was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointSource {
    /// The initial checkpoint for a run, taken from the caller's input state.
    Input,
    /// A checkpoint taken after a node ran as part of the normal step loop.
    Loop,
    /// A checkpoint taken after an external state update (e.g. human edit).
    Update,
    /// A checkpoint taken when branching off an earlier checkpoint_id.
    Fork,
}

/// Metadata stored alongside a checkpoint's channel values.
#[derive(Debug, Clone)]
pub struct CheckpointMetadata {
    pub source: CheckpointSource,
    /// Step index within the run, starting at 0 for the input checkpoint.
    pub step: i64,
    pub created_at: Option<SystemTime>,
    /// checkpoint_ns -> parent checkpoint_id, for forked runs.
    pub parents: HashMap<String, String>,
}

impl Default for CheckpointMetadata {
    fn default() -> Self {
        Self {
            source: CheckpointSource::Input,
            step: 0,
            created_at: None,
            parents: HashMap::new(),
        }
    }
}

/// A write a node produced for a channel that has not yet been folded into a checkpoint.
#[derive(Debug, Clone)]
pub struct PendingWrite {
    pub task_id: String,
    pub channel: String,
    /// Index used to order writes to the same channel within a task.
    pub idx: usize,
}

/// Builds a `(task_id, channel) -> idx` lookup from a set of pending writes,
/// preserving the order writes were recorded in.
pub fn writes_idx_map(writes: &[PendingWrite]) -> HashMap<(String, String), usize> {
    writes
        .iter()
        .map(|w| ((w.task_id.clone(), w.channel.clone()), w.idx))
        .collect()
}

/// Point-in-time snapshot of a graph run.
#[derive(Debug, Clone)]
pub struct Checkpoint<S> {
    pub v: u32,
    pub id: String,
    /// RFC 3339 timestamp string (kept as text so serializers stay simple).
    pub ts: String,
    pub channel_values: S,
    pub channel_versions: ChannelVersions,
    /// task_id -> channel versions seen, for detecting which inputs changed.
    pub versions_seen: HashMap<String, HashMap<String, String>>,
    pub updated_channels: Option<Vec<String>>,
    pub pending_sends: Vec<PendingWrite>,
    pub metadata: CheckpointMetadata,
}

/// A checkpoint plus its config and parent link, as returned by `get_tuple`.
#[derive(Debug, Clone)]
pub struct CheckpointTuple<S> {
    pub config: RunnableConfig,
    pub checkpoint: Checkpoint<S>,
    pub metadata: CheckpointMetadata,
    pub parent_config: Option<RunnableConfig>,
}

/// One row of a checkpoint listing: enough to identify and describe a checkpoint
/// without loading its full channel values.
#[derive(Debug, Clone)]
pub struct CheckpointListItem {
    pub checkpoint_id: String,
    pub metadata: CheckpointMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_idx_map_looks_up_by_task_and_channel() {
        let writes = vec![
            PendingWrite {
                task_id: "t1".into(),
                channel: "messages".into(),
                idx: 0,
            },
            PendingWrite {
                task_id: "t1".into(),
                channel: "usage".into(),
                idx: 1,
            },
        ];
        let map = writes_idx_map(&writes);
        assert_eq!(map.get(&("t1".to_string(), "messages".to_string())), Some(&0));
        assert_eq!(map.get(&("t1".to_string(), "usage".to_string())), Some(&1));
    }
}
