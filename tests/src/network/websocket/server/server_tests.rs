use knot_ws::{
    error::ServerError,
    network::websocket::{WebSocketServer, WebSocketServerConfig},
};
use std::net::SocketAddr;

pub(crate) async fn run_gateway(push_interval: &str) -> (WebSocketServer, SocketAddr) {
    knot_ws::log::init_default();

    let mut cfg = WebSocketServerConfig::default();
    cfg.host = "127.0.0.1".to_string();
    cfg.port = 0;
    cfg.push_interval = push_interval.to_string();

    let server = WebSocketServer::new(&cfg).unwrap();
    let addr = server.run().await.unwrap();
    (server, addr)
}

#[test]
fn test_rejects_bad_config() {
    let mut cfg = WebSocketServerConfig::default();
    cfg.host = "localhost".to_string();
    assert!(matches!(
        WebSocketServer::new(&cfg),
        Err(ServerError::InvalidAddress(_))
    ));

    let mut cfg = WebSocketServerConfig::default();
    cfg.msg_buf = 0;
    assert!(matches!(
        WebSocketServer::new(&cfg),
        Err(ServerError::ZeroBuffer)
    ));

    let mut cfg = WebSocketServerConfig::default();
    cfg.write_timeout = "later".to_string();
    assert!(matches!(
        WebSocketServer::new(&cfg),
        Err(ServerError::InvalidDuration { field: "write_timeout", .. })
    ));

    let mut cfg = WebSocketServerConfig::default();
    cfg.push_interval = "0s".to_string();
    assert!(matches!(
        WebSocketServer::new(&cfg),
        Err(ServerError::Schedule(_))
    ));
}

#[tokio::test]
async fn test_bind_conflict() {
    let (_server, addr) = run_gateway("10s").await;

    let mut cfg = WebSocketServerConfig::default();
    cfg.host = addr.ip().to_string();
    cfg.port = addr.port();
    let second = WebSocketServer::new(&cfg).unwrap();
    assert!(matches!(second.run().await, Err(ServerError::Bind { .. })));
}
