use bytes::Bytes;
use knot_ws::{
    error::ClientError,
    network::websocket::{CLOSED_MARKER, ConsoleHandler, EventHandler},
};
use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .map(|l| l.trim().to_string())
            .collect()
    }
}

#[tokio::test]
async fn test_console_handler_lines() {
    let out = Captured::default();
    let writer = out.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .without_time()
        .with_level(false)
        .with_target(false)
        .finish();
    // current-thread runtime, so every handler call sees this subscriber
    let _guard = tracing::subscriber::set_default(subscriber);

    let handler = ConsoleHandler;
    handler.on_open().await;
    handler.on_message("hello".to_string()).await;
    handler.on_pong(Bytes::from_static(b"1700000000000")).await;
    handler
        .on_error(ClientError::UnsupportedScheme("http".to_string()))
        .await;
    handler
        .on_close(Some(1000), Some("bye".to_string()))
        .await;

    assert_eq!(
        out.lines(),
        vec![
            "Opened connection".to_string(),
            "hello".to_string(),
            "pong".to_string(),
            "unsupported url scheme \"http\", expected ws or wss".to_string(),
            CLOSED_MARKER.to_string(),
        ]
    );
}
