//! Handles a `ClientRequest::Run`: streams the turn over the socket as
//! `Event`s, then sends a terminal `Done`/`Error`.

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::ws::WebSocket;

use atlas_agent::memory::RunnableConfig;
use atlas_agent::{AppRuntime, StreamEvent, StreamMode, TurnState};

use crate::protocol::ServerResponse;
use crate::response::send_response;

pub(crate) async fn handle_run(
    id: Option<String>,
    thread_id: Option<String>,
    message: String,
    socket: &mut WebSocket,
    runtime: Arc<AppRuntime>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let thread_id = thread_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    if let Err(e) = runtime.conversations.create(&thread_id, "ws", None).await {
        send_response(socket, &ServerResponse::error(id, format!("conversation store: {e}"))).await?;
        return Ok(());
    }

    let state = TurnState::new(message);
    let config = RunnableConfig::new(thread_id.clone());
    let modes: HashSet<StreamMode> = HashSet::from([StreamMode::Custom, StreamMode::Values]);

    let mut rx = runtime.graph.clone().stream(state, config, modes);
    let mut last_state: Option<TurnState> = None;

    while let Some(event) = rx.recv().await {
        match event {
            StreamEvent::Custom(value) => {
                send_response(socket, &ServerResponse::Event { id: id.clone(), data: value }).await?;
            }
            StreamEvent::Values(state) => {
                last_state = Some(state);
            }
            _ => {}
        }
    }

    match last_state.and_then(|s| s.last_ai_message().map(|m| m.text_content().to_string())) {
        Some(reply) => {
            send_response(socket, &ServerResponse::Done { id, thread_id, reply }).await?;
        }
        None => {
            send_response(socket, &ServerResponse::error(id, "turn produced no reply")).await?;
        }
    }
    Ok(())
}
