//! Shared helpers for e2e tests. Received responses are logged with `[e2e] received: ...`.
//! Run tests with `--nocapture` to see them.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

/// Loads `.env` from the current directory so the server sees provider API keys.
pub fn load_dotenv() {
    let _ = dotenv::dotenv();
}

/// Bind to a random port and spawn the server in once mode. Returns (ws_url, server_handle).
pub async fn spawn_server_once() -> (
    String,
    tokio::task::JoinHandle<Result<(), Box<dyn std::error::Error + Send + Sync>>>,
) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let url = format!("ws://{addr}");
    let server_handle = tokio::spawn(atlas_agent_serve::run_serve_on_listener(listener, true));
    (url, server_handle)
}

/// Sends one request and returns the first response received, as raw JSON text.
pub async fn send_and_recv<W, R>(
    write: &mut W,
    read: &mut R,
    req_json: &str,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>>
where
    W: SinkExt<Message> + Unpin,
    W::Error: std::error::Error + Send + Sync + 'static,
    R: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    write.send(Message::Text(req_json.to_string())).await?;
    let opt = timeout(Duration::from_secs(10), read.next())
        .await
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "timeout waiting for response"))?;
    let msg = opt.ok_or_else(|| std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "no message"))??;
    let text = msg
        .to_text()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?
        .to_string();
    eprintln!("[e2e] received: {text}");
    Ok(text)
}

/// Sends a `run` request and reads until the terminal `done`/`error` message.
pub async fn send_run_and_recv_done<W, R>(
    write: &mut W,
    read: &mut R,
    req_json: &str,
    read_timeout: Duration,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>>
where
    W: SinkExt<Message> + Unpin,
    W::Error: std::error::Error + Send + Sync + 'static,
    R: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    write.send(Message::Text(req_json.to_string())).await?;
    loop {
        let opt = timeout(read_timeout, read.next())
            .await
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "timeout waiting for done"))?;
        let msg = opt.ok_or_else(|| std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "no message"))??;
        if !msg.is_text() {
            continue;
        }
        let text = msg.to_text().unwrap().to_string();
        eprintln!("[e2e] received: {text}");
        if text.contains("\"type\":\"done\"") || text.contains("\"type\":\"error\"") {
            return Ok(text);
        }
    }
}
