use std::error::Error as StdError;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum CronError {
    #[error("invalid {field} duration {value:?}: {reason}")]
    InvalidDuration {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("{field} must be greater than zero")]
    ZeroInterval { field: &'static str },
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid websocket url {addr:?}: {source}")]
    InvalidUrl {
        addr: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported url scheme {0:?}, expected ws or wss")]
    UnsupportedScheme(String),
    #[error("invalid ping schedule: {0}")]
    Schedule(#[from] CronError),
    #[error("connect to {url} failed: {source}")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },
    #[error("websocket transport failed: {0}")]
    Transport(#[from] tungstenite::Error),
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid listen address {0:?}")]
    InvalidAddress(String),
    #[error("msg_buf must be greater than zero")]
    ZeroBuffer,
    #[error("invalid {field} duration {value:?}: {reason}")]
    InvalidDuration {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("invalid server schedule: {0}")]
    Schedule(#[from] CronError),
    #[error("bind listener on {addr} failed: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("invalid log level {0:?}")]
    InvalidLevel(String),
    #[error("install subscriber failed: {0}")]
    Install(#[source] Box<dyn StdError + Send + Sync + 'static>),
}
