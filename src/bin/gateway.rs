use knot_ws::{
    error::ServerError,
    log,
    network::websocket::{WebSocketServer, WebSocketServerConfig},
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    log::init_default();

    let server = WebSocketServer::new(&WebSocketServerConfig::default())?;
    server.run().await?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("listen for ctrl-c failed: {}", e);
    }

    info!("shutting down");
    server.stop().await;
    Ok(())
}
