use super::common;
use futures_util::StreamExt;
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;

#[tokio::test]
async fn e2e_ping() {
    common::load_dotenv();
    let (url, server_handle) = common::spawn_server_once().await;

    let (ws, _) = connect_async(&url).await.unwrap();
    let (mut write, mut read) = ws.split();

    let received = common::send_and_recv(&mut write, &mut read, r#"{"type":"ping","id":"ping-1"}"#)
        .await
        .unwrap();

    assert!(
        received.contains("\"type\":\"pong\"") && received.contains("\"id\":\"ping-1\""),
        "expected pong response, received: {received}"
    );

    drop(write);
    drop(read);
    let _ = timeout(Duration::from_secs(5), server_handle).await;
}
