use knot_ws::{
    cron::{Cron, CronConfig},
    error::CronError,
};
use tokio::time::{Duration, Instant, sleep};

#[test]
fn test_cron_rejects_bad_durations() {
    let mut cfg = CronConfig::default();
    cfg.interval = "every now and then".to_string();
    assert!(matches!(
        Cron::new("TestCron", &cfg),
        Err(CronError::InvalidDuration { field: "interval", .. })
    ));

    let mut cfg = CronConfig::default();
    cfg.interval = "0s".to_string();
    assert!(matches!(
        Cron::new("TestCron", &cfg),
        Err(CronError::ZeroInterval { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_cron_ticks_on_schedule() {
    let mut cfg = CronConfig::default();
    cfg.interval = "1s".to_string();
    cfg.run_after_start = "10ms".to_string();
    cfg.interval_after_finish = false;

    let cron = Cron::new("TestCron", &cfg).unwrap();
    assert_eq!(cron.name(), "TestCron");
    assert_eq!(cron.interval(), Duration::from_secs(1));

    let start = Instant::now();
    let mut ticker = cron.ticker();
    assert_eq!(ticker.tick().await, 1);
    assert_eq!(start.elapsed(), Duration::from_millis(10));
    assert_eq!(ticker.tick().await, 2);
    assert_eq!(start.elapsed(), Duration::from_millis(1010));
}

#[tokio::test(start_paused = true)]
async fn test_cron_fixed_cadence_skips_missed_ticks() {
    let mut cfg = CronConfig::default();
    cfg.interval = "1s".to_string();
    cfg.run_after_start = "0s".to_string();
    cfg.interval_after_finish = false;

    let start = Instant::now();
    let mut ticker = Cron::new("TestCron", &cfg).unwrap().ticker();
    ticker.tick().await;

    // a slow job overruns two periods
    sleep(Duration::from_millis(2500)).await;
    ticker.tick().await;
    ticker.tick().await;
    assert_eq!(start.elapsed(), Duration::from_secs(3));
    assert_eq!(ticker.count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_cron_waits_full_interval_after_late_tick() {
    let mut cfg = CronConfig::default();
    cfg.interval = "1s".to_string();
    cfg.run_after_start = "0s".to_string();
    cfg.interval_after_finish = true;

    let start = Instant::now();
    let mut ticker = Cron::new("TestCron", &cfg).unwrap().ticker();
    ticker.tick().await;

    sleep(Duration::from_millis(2500)).await;
    ticker.tick().await;
    assert_eq!(start.elapsed(), Duration::from_millis(2500));
    ticker.tick().await;
    assert_eq!(start.elapsed(), Duration::from_millis(3500));
}
