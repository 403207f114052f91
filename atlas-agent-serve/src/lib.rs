//! WebSocket server for Ask-Atlas (axum + ws).
//!
//! Listens on ws://127.0.0.1:8080, handles `run` and `ping`. A thin driver
//! over [`atlas_agent::build_runtime`]: no business logic beyond turn
//! dispatch and protocol framing lives here.
//!
//! **Public API**: [`run_serve`], [`run_serve_on_listener`].

mod app;
mod connection;
mod protocol;
mod response;
mod run;

use std::sync::{Arc, Mutex};

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::info;

use atlas_agent::Settings;

use app::{router, AppState};

const DEFAULT_WS_ADDR: &str = "127.0.0.1:8080";

/// Runs the WebSocket server on an existing listener. Used by tests (bind to 127.0.0.1:0 then pass listener).
/// When `once` is true, accepts one connection, handles it, then returns.
pub async fn run_serve_on_listener(
    listener: TcpListener,
    once: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = listener.local_addr()?;
    info!("WebSocket server listening on ws://{}", addr);
    if once {
        info!("will exit after first connection is done (once mode, used by tests)");
    }

    let settings = Settings::load("atlas-agent", None)?;
    let runtime = Arc::new(atlas_agent::build_runtime(settings)?);

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let state = Arc::new(AppState {
        shutdown_tx: Arc::new(Mutex::new(if once { Some(shutdown_tx) } else { None })),
        runtime,
    });

    let app = router(state);

    if once {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await?;
        info!("connection done, exiting (once mode)");
    } else {
        axum::serve(listener, app).await?;
    }
    Ok(())
}

/// Runs the WebSocket server. Listens on `addr` (default 127.0.0.1:8080).
/// When `once` is true, accepts one connection, handles it, then returns (process exits).
pub async fn run_serve(
    addr: Option<&str>,
    once: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = addr.unwrap_or(DEFAULT_WS_ADDR);
    let listener = TcpListener::bind(addr).await?;
    run_serve_on_listener(listener, once).await
}
