//! Runs a full turn through the server. Skipped unless an LLM API key or
//! `ATLAS_E2E_RUN_AGENT` is set, since it calls out to a real provider.

use super::common;
use futures_util::StreamExt;
use std::time::Duration;
use tokio_tungstenite::connect_async;

#[tokio::test]
async fn e2e_run_turn() {
    common::load_dotenv();
    let run_e2e = std::env::var("ANTHROPIC_API_KEY").is_ok()
        || std::env::var("OPENAI_API_KEY").is_ok()
        || std::env::var("ATLAS_E2E_RUN_AGENT").is_ok();
    if !run_e2e {
        eprintln!("skipping e2e_run_turn (set an LLM API key or ATLAS_E2E_RUN_AGENT to run)");
        return;
    }

    let (url, server_handle) = common::spawn_server_once().await;

    let (ws, _) = connect_async(&url).await.unwrap();
    let (mut write, mut read) = ws.split();

    let req = r#"{"type":"run","id":"run-1","thread_id":null,"message":"Reply with exactly the word: OK"}"#;
    let received = common::send_run_and_recv_done(&mut write, &mut read, req, Duration::from_secs(120))
        .await
        .unwrap();

    assert!(
        received.contains("\"type\":\"done\""),
        "expected a done response, received: {received}"
    );

    drop(write);
    drop(read);
    let _ = tokio::time::timeout(Duration::from_secs(5), server_handle).await;
}
