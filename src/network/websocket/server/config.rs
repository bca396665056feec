use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    // 定时推送给所有会话的内容和间隔
    pub push_interval: String,
    pub push_payload: String,
    // 每个会话待发送队列长度
    pub msg_buf: usize,
    pub write_timeout: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            push_interval: "10s".to_string(),
            push_payload: "hello".to_string(),
            msg_buf: 4,
            write_timeout: "5s".to_string(),
        }
    }
}
