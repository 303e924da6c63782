//! Daily trigger loop.
//!
//! Cycles run at fixed local wall-clock times (by default 08:30 and 20:00). The
//! loop picks the next trigger, then naps in chunks of at most [`MAX_NAP`],
//! re-reading the wall clock after each nap, and runs one cycle under the
//! shared execution lock once the clock has reached the trigger. DST changes,
//! clock steps and host suspends therefore shift a trigger by at most one nap.

use crate::error::ConfigError;
use crate::pipeline::CycleRunner;
use chrono::{DateTime, Duration, Local, NaiveDateTime, NaiveTime, TimeZone};
use std::fmt;
use std::time::Duration as StdDuration;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{info, instrument};

/// Trigger times used when none are configured.
pub const DEFAULT_TIMES: &[&str] = &["08:30", "20:00"];

/// Longest uninterrupted sleep before the wall clock is checked again.
pub const MAX_NAP: StdDuration = StdDuration::from_secs(60);
const MIN_NAP: StdDuration = StdDuration::from_secs(1);

/// A set of daily trigger times, sorted and de-duplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySchedule {
    times: Vec<NaiveTime>,
}

impl DailySchedule {
    /// Parse `HH:MM` strings.
    pub fn parse<S: AsRef<str>>(raw: &[S]) -> Result<Self, ConfigError> {
        let mut times = raw
            .iter()
            .map(|s| {
                let s = s.as_ref().trim();
                NaiveTime::parse_from_str(s, "%H:%M")
                    .map_err(|_| ConfigError::ScheduleTime(s.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if times.is_empty() {
            return Err(ConfigError::EmptySchedule);
        }
        times.sort();
        times.dedup();
        Ok(Self { times })
    }

    /// First trigger strictly after `now`.
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        self.times
            .iter()
            .map(|&t| {
                let today = now.date().and_time(t);
                if today > now {
                    today
                } else {
                    today + Duration::days(1)
                }
            })
            .min()
            .unwrap_or(now + Duration::days(1))
    }

    /// Real time from `now` until the next trigger, across any UTC offset
    /// change in between.
    pub fn delay_from<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> StdDuration {
        wall_delay(self.next_after(now.naive_local()), now)
    }
}

/// Real time from `now` until the local wall-clock time `next` in `now`'s zone.
///
/// An ambiguous `next` (clocks going back) resolves to its first occurrence; a
/// `next` skipped by clocks going forward resolves to one hour later.
pub fn wall_delay<Tz: TimeZone>(next: NaiveDateTime, now: &DateTime<Tz>) -> StdDuration {
    let tz = now.timezone();
    let at = tz
        .from_local_datetime(&next)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(next + Duration::hours(1))).earliest());
    match at {
        Some(at) => at
            .signed_duration_since(now)
            .to_std()
            .unwrap_or(StdDuration::ZERO),
        None => MAX_NAP,
    }
}

impl fmt::Display for DailySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let times: Vec<String> = self.times.iter().map(|t| t.format("%H:%M").to_string()).collect();
        f.write_str(&times.join(", "))
    }
}

/// Run one cycle at every scheduled time, forever.
#[instrument(level = "info", skip_all, fields(%schedule))]
pub async fn run_daily<R: CycleRunner>(schedule: &DailySchedule, runner: &Mutex<R>) {
    run_daily_with(schedule, runner, Local::now).await
}

/// [`run_daily`] against an arbitrary wall clock.
async fn run_daily_with<R, Tz, F>(schedule: &DailySchedule, runner: &Mutex<R>, clock: F)
where
    R: CycleRunner,
    Tz: TimeZone,
    F: Fn() -> DateTime<Tz>,
{
    info!("Scheduler started");
    loop {
        let now = clock();
        let next = schedule.next_after(now.naive_local());
        info!(
            next_run = %next,
            wait_secs = schedule.delay_from(&now).as_secs(),
            "Waiting for next scheduled cycle"
        );
        wait_until(next, &clock).await;

        info!(due = %next, "Scheduled cycle due");
        let report = runner.lock().await.run_cycle().await;
        info!(published = report.published, failed = report.failed, "Scheduled cycle done");
    }
}

/// Nap until the wall clock reads `next` or later.
async fn wait_until<Tz, F>(next: NaiveDateTime, clock: &F)
where
    Tz: TimeZone,
    F: Fn() -> DateTime<Tz>,
{
    loop {
        let now = clock();
        if now.naive_local() >= next {
            return;
        }
        sleep(wall_delay(next, &now).clamp(MIN_NAP, MAX_NAP)).await;
    }
}
