//! # Memory: Checkpointing
//!
//! [Checkpointer] persists per-thread state snapshots so a conversation can be
//! resumed, branched, or time-traveled.
//!
//! ## Config
//!
//! [`RunnableConfig`] is passed to `CompiledStateGraph::invoke`. When using a checkpointer:
//! - `thread_id`: Required. Identifies the conversation/thread.
//! - `checkpoint_id`: Optional. Load a specific checkpoint (time-travel / branch).
//! - `checkpoint_ns`: Optional namespace for subgraphs.
//!
//! ## Checkpointer Implementations
//!
//! | Type         | Persistence | Use case                    |
//! |--------------|-------------|------------------------------|
//! | [`MemorySaver`]  | In-memory   | Dev, tests, fallback on init failure |
//! | [`SqliteSaver`]  | SQLite file | Single-node, production      |
//!
//! Use with [`StateGraph::compile_with_checkpointer`](crate::graph::StateGraph::compile_with_checkpointer).
//! [`JsonSerializer`] is required for `SqliteSaver` (state must be `Serialize + DeserializeOwned`).

mod checkpoint;
mod checkpointer;
mod config;
mod memory_saver;
mod serializer;
mod sqlite_saver;
mod uuid6;

pub use checkpoint::{
    writes_idx_map, ChannelVersions, Checkpoint, CheckpointListItem, CheckpointMetadata,
    CheckpointSource, CheckpointTuple, PendingWrite, CHECKPOINT_VERSION, ERROR, INTERRUPT, RESUME,
    SCHEDULED,
};
pub use checkpointer::{CheckpointError, Checkpointer};
pub use config::RunnableConfig;
pub use memory_saver::MemorySaver;
pub use serializer::{
    JsonSerializer, Serializer, TypedData, TypedSerializer, TYPE_BYTES, TYPE_JSON, TYPE_NULL,
};
pub use sqlite_saver::SqliteSaver;
pub use uuid6::{uuid6, uuid6_with_params, Uuid6};
