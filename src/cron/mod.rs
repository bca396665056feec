mod config;
mod cron;

pub use config::Config as CronConfig;
pub use cron::{Cron, Ticker};
