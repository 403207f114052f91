//! WebSocket connection lifecycle: recv loop and request dispatch.

use axum::extract::ws::{Message, WebSocket};
use std::sync::Arc;
use tokio::sync::oneshot;

use atlas_agent::AppRuntime;

use super::protocol::{ClientRequest, ServerResponse};
use super::response::send_response;
use super::run::handle_run;

pub(crate) async fn handle_socket(
    mut socket: WebSocket,
    shutdown_tx: Option<oneshot::Sender<()>>,
    runtime: Arc<AppRuntime>,
) {
    while let Some(res) = socket.recv().await {
        let msg = match res {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("read error (client closed?): {}", e);
                let _ = socket.close().await;
                break;
            }
        };
        let text = match &msg {
            Message::Text(t) => t.clone(),
            Message::Binary(b) => String::from_utf8_lossy(b).into_owned(),
            Message::Close(_) => break,
            _ => continue,
        };

        if let Err(e) = handle_request_and_send(&text, &mut socket, runtime.clone()).await {
            tracing::warn!("handle_request error: {}", e);
            let _ = socket.close().await;
            break;
        }
    }
    if let Some(tx) = shutdown_tx {
        let _ = tx.send(());
    }
}

async fn handle_request_and_send(
    text: &str,
    socket: &mut WebSocket,
    runtime: Arc<AppRuntime>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let req: ClientRequest = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            let resp = ServerResponse::error(None, format!("parse error: {e}"));
            send_response(socket, &resp).await?;
            return Ok(());
        }
    };

    match req {
        ClientRequest::Run { id, thread_id, message } => {
            handle_run(id, thread_id, message, socket, runtime).await?;
        }
        ClientRequest::Ping { id } => {
            send_response(socket, &ServerResponse::Pong { id }).await?;
        }
    }
    Ok(())
}
