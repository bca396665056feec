mod config;
mod init;

pub use config::Config;
pub use init::{WIRE_TARGET, init, init_default};
