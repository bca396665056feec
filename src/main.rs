use knot_ws::{
    error::ClientError,
    log,
    network::websocket::{ConsoleHandler, WebSocketClient, WebSocketClientConfig},
};
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ClientError> {
    log::init_default();

    let cfg = WebSocketClientConfig::default();
    let client = WebSocketClient::new("knot-probe", &cfg)?.with_handler(Arc::new(ConsoleHandler));
    client.run().await;
    Ok(())
}
