//! # Ask-Atlas
//!
//! An LLM agent that answers natural-language trade-data questions by routing
//! between a SQL pipeline, a GraphQL pipeline, and a documentation pipeline,
//! through a durable, streaming, checkpointed graph executor.
//!
//! ## Design principles
//!
//! - **Single state type**: one [`TurnState`] flows through every node in the
//!   graph for the life of a turn.
//! - **One node, one step**: each node reads `TurnState`, does one thing, and
//!   returns the next state plus where to go ([`Next`]).
//! - **Tool pipelines are sub-graphs**: `query_tool`, `atlas_graphql`, and
//!   `docs_tool` are each a short chain of nodes the agent node routes into,
//!   not special-cased branches.
//! - **Durable by default**: every turn is checkpointed by thread id, so a
//!   run can be resumed after a crash or interrupted deliberately.
//!
//! ## Main modules
//!
//! - [`graph`]: [`StateGraph`], [`CompiledStateGraph`], [`Node`], [`Next`], [`RunContext`] — the executor.
//! - [`agent_node`]: the single LLM decision node ([`AgentNode`]) and [`AgentMode`].
//! - [`pipelines`]: the `query_tool`/`atlas_graphql`/`docs_tool` sub-graphs.
//! - [`build`]: [`build_graph`] assembles the agent node and all three pipelines into one graph.
//! - [`turn_state`]: [`TurnState`] and its per-pipeline scratchpads.
//! - [`message`]: [`Message`], the three-variant (human/ai/tool) chat message type.
//! - [`llm`]: [`LlmClient`] trait plus the OpenAI/Anthropic/Google/mock adapters.
//! - [`prompts`]: the named-prompt registry and per-tier model assignment.
//! - [`memory`]: checkpointing ([`Checkpointer`], [`MemorySaver`], [`SqliteSaver`]).
//! - [`conversation`]: the thread-level `Conversation` CRUD store.
//! - [`usage`] / [`timing`]: per-turn cost and latency accounting and aggregation.
//! - [`stream_data`]: [`StreamData`], the envelope emitted over `CompiledStateGraph::stream`.
//! - [`settings`]: [`Settings`], the env-driven configuration surface.
//! - [`runtime`]: [`build_runtime`] turns a [`Settings`] into a compiled, store-backed [`AppRuntime`].
//!
//! Key types are re-exported at crate root.

pub mod agent_node;
pub mod build;
pub mod channels;
pub mod conversation;
pub mod error;
pub mod graph;
pub mod llm;
pub mod memory;
pub mod message;
pub mod pipelines;
pub mod prompts;
pub mod runtime;
pub mod settings;
pub mod stream;
pub mod stream_data;
pub mod timing;
pub mod turn_state;
pub mod usage;

pub use agent_node::{AgentMode, AgentNode, AGENT_NODE_ID};
pub use build::{build_graph, build_graph_checked, GraphBuildConfig};
pub use channels::{
    boxed_updater, BoxedStateUpdater, FieldBasedUpdater, ReplaceUpdater, StateUpdater,
};
pub use conversation::{
    derive_title, Conversation, ConversationError, ConversationStore, MemoryConversationStore,
    SqliteConversationStore,
};
pub use error::AgentError;
pub use graph::{
    CompilationError, CompiledStateGraph, DefaultInterruptHandler, GraphInterrupt, Interrupt,
    InterruptHandler, LoggingNodeMiddleware, NameNode, Next, Node, NodeMiddleware, RetryPolicy,
    RunContext, Runtime, StateGraph, END, START,
};
pub use llm::{
    AnthropicClient, GoogleClient, LlmClient, LlmResponse, LlmUsage, MockLlm, ModelTier,
    OpenAiClient, Provider, ProviderConfig, ToolSchema,
};
pub use memory::{
    CheckpointError, Checkpointer, MemorySaver, RunnableConfig, SqliteSaver,
};
pub use message::{Message, ToolCallRequest};
pub use pipelines::{ATLAS_GRAPHQL, DOCS_TOOL, QUERY_TOOL};
pub use prompts::{build_agent_system_prompt, DualToolStatus, PromptName, PromptRegistry};
pub use runtime::{build_runtime, AppRuntime};
pub use settings::Settings;
pub use stream::{
    CheckpointEvent, MessageChunk, StreamEvent, StreamMetadata, StreamMode, StreamWriter,
    ToolStreamWriter,
};
pub use stream_data::StreamData;
pub use timing::{aggregate_timing, percentiles, NodeTimer, TimingRecord, TimingSummary};
pub use turn_state::{
    AtlasLink, DirectionOverride, DocsScratchpad, GraphqlScratchpad, ModeOverride,
    ResolvedProduct, SqlScratchpad, TurnState,
};
pub use usage::{
    aggregate_usage, make_usage_record, record_cost_usd, resolve_pricing,
    usage_record_from_llm_usage, ModelPricing, UsageRecord, UsageSummary,
};

/// When running `cargo test -p atlas-agent`, initializes tracing from `RUST_LOG` so that
/// unit tests in `src/**` can print logs with `--nocapture`.
#[cfg(test)]
mod test_logging {
    use ctor::ctor;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::Layer;

    #[ctor]
    fn init() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_filter(filter),
            )
            .try_init();
    }
}
