use crate::{cron::CronConfig, error::CronError};
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::trace;

fn parse(field: &'static str, value: &str) -> Result<Duration, CronError> {
    duration_str::parse(value).map_err(|e| CronError::InvalidDuration {
        field,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// A parsed schedule. Cheap to clone; every call to [`Cron::ticker`] starts
/// a fresh timeline from "now".
#[derive(Debug, Clone)]
pub struct Cron {
    name: String,
    run_after_start: Duration,
    interval: Duration,
    interval_after_finish: bool,
}

impl Cron {
    pub fn new(name: &str, cfg: &CronConfig) -> Result<Self, CronError> {
        let run_after_start = parse("run_after_start", &cfg.run_after_start)?;
        let interval = parse("interval", &cfg.interval)?;
        if interval.is_zero() {
            return Err(CronError::ZeroInterval { field: "interval" });
        }

        Ok(Self {
            name: name.to_string(),
            run_after_start,
            interval,
            interval_after_finish: cfg.interval_after_finish,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn run_after_start(&self) -> Duration {
        self.run_after_start
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn ticker(&self) -> Ticker {
        let mut interval = interval_at(Instant::now() + self.run_after_start, self.interval);
        interval.set_missed_tick_behavior(match self.interval_after_finish {
            true => MissedTickBehavior::Delay,
            false => MissedTickBehavior::Skip,
        });

        Ticker {
            name: self.name.clone(),
            interval,
            count: 0,
        }
    }
}

#[derive(Debug)]
pub struct Ticker {
    name: String,
    interval: Interval,
    count: u64,
}

impl Ticker {
    /// Waits for the next tick and returns how many ticks have fired so far.
    pub async fn tick(&mut self) -> u64 {
        self.interval.tick().await;
        self.count += 1;
        trace!("CRON TICK - {} #{}", self.name, self.count);
        self.count
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}
