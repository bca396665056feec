use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    // 启动后多久第一次触发
    pub run_after_start: String,
    // 两次触发间隔
    pub interval: String,
    // 任务晚到时, 是否从完成时刻重新计时
    pub interval_after_finish: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            run_after_start: "0s".to_string(),
            interval: "1m".to_string(),
            interval_after_finish: true,
        }
    }
}
