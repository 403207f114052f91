//! Ask-Atlas CLI: run a single turn against the compiled agent graph and
//! print the reply. A thin terminal driver over `atlas_agent::runtime` — no
//! business logic lives here, only argument parsing and turn dispatch.

use std::path::PathBuf;

use clap::Parser;

use atlas_agent::memory::RunnableConfig;
use atlas_agent::{aggregate_timing, aggregate_usage, Settings, TurnState};

#[derive(Parser, Debug)]
#[command(name = "ask-atlas")]
#[command(about = "Ask Atlas a trade-data question")]
struct Args {
    /// The question to ask (or pass as trailing positional words)
    #[arg(short, long, value_name = "TEXT")]
    message: Option<String>,

    #[arg(trailing_var_arg = true)]
    rest: Vec<String>,

    /// Thread ID for conversation continuity (checkpointed); a fresh one is
    /// generated per invocation when omitted
    #[arg(long, value_name = "ID")]
    thread_id: Option<String>,

    /// Print per-turn token usage and node timing after the reply
    #[arg(short, long)]
    verbose: bool,

    /// Directory holding project `.env` (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    env_dir: Option<PathBuf>,
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let args = Args::parse();

    let message = args
        .message
        .or_else(|| (!args.rest.is_empty()).then(|| args.rest.join(" ")))
        .ok_or("ask-atlas: provide a question via -m/--message or as positional words")?;

    let settings = Settings::load("atlas-agent", args.env_dir.as_deref())?;
    let runtime = atlas_agent::build_runtime(settings)?;

    let thread_id = args.thread_id.unwrap_or_else(|| format!("cli-{}", uuid::Uuid::new_v4()));
    runtime
        .conversations
        .create(&thread_id, "cli", None)
        .await?;

    let state = TurnState::new(message);
    let config = RunnableConfig::new(thread_id);

    let final_state = runtime.graph.invoke(state, &config).await?;

    match final_state.last_ai_message() {
        Some(message) => println!("{}", message.text_content()),
        None => println!("(no reply)"),
    }
    if !final_state.last_error.is_empty() {
        eprintln!("note: {}", final_state.last_error);
    }

    if args.verbose {
        let usage = aggregate_usage(&final_state.token_usage);
        let timing = aggregate_timing(&final_state.step_timing);
        eprintln!(
            "\n--- usage: {} input + {} output tokens (${:.4} total)",
            usage.total_input_tokens, usage.total_output_tokens, usage.total_usd
        );
        eprintln!(
            "--- timing: {}ms total, slowest node {:?} ({}ms)",
            timing.total_wall_ms, timing.slowest_node, timing.slowest_node_wall_ms
        );
    }

    Ok(())
}
