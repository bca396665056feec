mod client;
mod config;
mod handler;

pub use client::{Client as WebSocketClient, CloseInfo};
pub use config::Config as WebSocketClientConfig;
pub use handler::{CLOSED_MARKER, ConsoleHandler, EventHandler};
