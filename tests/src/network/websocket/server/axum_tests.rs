use crate::harness::{Event, client_config, recording_client, wait_until};
use axum::{Router, routing::get};
use knot_ws::network::websocket::{WebSocketServer, WebSocketServerConfig};
use tokio::time::{Duration, timeout};

#[tokio::test]
async fn test_router_mounts_in_app() {
    let server = WebSocketServer::new(&WebSocketServerConfig::default()).unwrap();
    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(server.router());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let (client, recorder) = recording_client(&client_config(addr));
    let runner = client.clone();
    let run = tokio::spawn(async move { runner.run().await });

    assert!(
        recorder
            .wait_for(|events| events.contains(&Event::Open), Duration::from_secs(5))
            .await
    );
    let sessions = server.sessions();
    assert!(wait_until(|| async { sessions.sessions_in("team").await == 1 }).await);

    client.stop().await.unwrap();
    timeout(Duration::from_secs(5), run).await.unwrap().unwrap();
    assert_eq!(recorder.count(|e| matches!(e, Event::Close(..))), 1);
    assert_eq!(recorder.count(|e| matches!(e, Event::Error(_))), 0);
    assert!(matches!(
        recorder.events().last(),
        Some(Event::Close(Some(1000), _))
    ));
}
