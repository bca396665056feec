use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    pub addr: String,
    // 服务端用来识别用户和团队的 query 参数
    pub uid: String,
    pub tid: String,
    pub ping_interval: String,
    // 打印握手和每一帧
    pub trace: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: "ws://localhost:8080".to_string(),
            uid: "user".to_string(),
            tid: "team".to_string(),
            ping_interval: "1s".to_string(),
            trace: true,
        }
    }
}
