mod config;
mod server;
mod session;

pub use config::Config as WebSocketServerConfig;
pub use server::Server as WebSocketServer;
pub use session::{Session, SessionGroup, SessionMap};
