use crate::error::ClientError;
use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

pub const CLOSED_MARKER: &str = "### closed ###";

/// Lifecycle callbacks of a [`WebSocketClient`](super::WebSocketClient).
///
/// Every method has a no-op default so an implementor only overrides the
/// events it cares about.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// Handshake finished. Fires once, before any other event.
    async fn on_open(&self) {}

    /// A text or binary data frame arrived.
    async fn on_message(&self, _text: String) {}

    /// Connect or transport failure.
    async fn on_error(&self, _err: ClientError) {}

    /// The connection ended. `code` and `reason` are set only when the peer
    /// sent a close frame.
    async fn on_close(&self, _code: Option<u16>, _reason: Option<String>) {}

    /// A pong control frame arrived.
    async fn on_pong(&self, _payload: Bytes) {}
}

/// Prints each lifecycle event as one line.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleHandler;

#[async_trait]
impl EventHandler for ConsoleHandler {
    async fn on_open(&self) {
        info!("Opened connection");
    }

    async fn on_message(&self, text: String) {
        info!("{}", text);
    }

    async fn on_error(&self, err: ClientError) {
        info!("{}", err);
    }

    async fn on_close(&self, _code: Option<u16>, _reason: Option<String>) {
        info!("{}", CLOSED_MARKER);
    }

    async fn on_pong(&self, _payload: Bytes) {
        info!("pong");
    }
}
