pub(crate) mod async_fn;
pub mod cron;
pub mod error;
pub mod log;
pub mod network;
